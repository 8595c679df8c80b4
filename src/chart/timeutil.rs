use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every date/time shape the chart layer trades in. Charting surfaces emit
/// structured business days, the persistence layer stores text, and upstream
/// payloads carry raw epochs; all of them must map to the same instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    /// Raw epoch seconds, passed through unchanged.
    Epoch(i64),
    /// `{year, month, day}` with month 1-indexed.
    Calendar { year: i32, month: u32, day: u32 },
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    Text(String),
}

impl From<NaiveDate> for TimeInput {
    fn from(d: NaiveDate) -> Self {
        TimeInput::Calendar { year: d.year(), month: d.month(), day: d.day() }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TimeError {
    #[error("unrecognized date input: {0}")]
    Unrecognized(String),
    #[error("date out of range: {0:04}-{1:02}-{2:02}")]
    OutOfRange(i32, u32, u32),
}

/// Integer epoch seconds (UTC) for any accepted shape; midnight when the
/// input carries no time of day. Equivalent calendar instants yield identical
/// epochs regardless of shape.
pub fn to_epoch_seconds(input: &TimeInput) -> Result<i64, TimeError> {
    match input {
        TimeInput::Epoch(secs) => Ok(*secs),
        TimeInput::Calendar { year, month, day } => {
            let date = NaiveDate::from_ymd_opt(*year, *month, *day)
                .ok_or(TimeError::OutOfRange(*year, *month, *day))?;
            Ok(midnight_utc(date).timestamp())
        }
        TimeInput::Text(s) => parse_text(s).map(|dt| dt.and_utc().timestamp()),
    }
}

/// Date component of any accepted shape, UTC.
pub fn to_naive_date(input: &TimeInput) -> Result<NaiveDate, TimeError> {
    let secs = to_epoch_seconds(input)?;
    let dt = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| TimeError::Unrecognized(format!("epoch {}", secs)))?;
    Ok(dt.date_naive())
}

/// Zero-padded `YYYY-MM-DD` for a structured calendar value.
pub fn to_calendar_date(input: &TimeInput) -> Result<String, TimeError> {
    let date = to_naive_date(input)?;
    Ok(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
}

/// The persisted annotation-date form, `YYYY-MM-DD HH:MM:SS`.
pub fn to_storage_datetime(input: &TimeInput) -> Result<String, TimeError> {
    let secs = to_epoch_seconds(input)?;
    let dt = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| TimeError::Unrecognized(format!("epoch {}", secs)))?;
    Ok(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn parse_text(s: &str) -> Result<NaiveDateTime, TimeError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    Err(TimeError::Unrecognized(s.to_string()))
}
