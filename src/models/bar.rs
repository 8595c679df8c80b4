use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// One daily OHLC observation. Fund series report NAV rather than true OHLC,
/// so fund bars carry volume and turnover fixed at 0. Serialize-only: bars
/// are built from the upstream gateways, never read back from JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    #[serde(serialize_with = "serialize_chart_time")]
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub turnover: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self { date, open, high, low, close, volume: 0.0, turnover: 0.0 }
    }
}

/// Charting surfaces take business days as `{year, month, day}` (month
/// 1-indexed), so bars serialize their date in that shape.
fn serialize_chart_time<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut t = s.serialize_struct("time", 3)?;
    t.serialize_field("year", &date.year())?;
    t.serialize_field("month", &date.month())?;
    t.serialize_field("day", &date.day())?;
    t.end()
}
