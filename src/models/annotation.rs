use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::chart::timeutil::{self, TimeInput};

/// Tri-state access/derivation flag on an annotation.
///
/// `Locked` is read-only: no new anchor points may be committed until an
/// explicit unlock back to `Tracking`. `Confirmed` is derived on commit when
/// the first anchor price is above the second (a descending reference line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchType {
    Locked,
    Tracking,
    Confirmed,
}

impl WatchType {
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            -1 => Some(WatchType::Locked),
            0 => Some(WatchType::Tracking),
            1 => Some(WatchType::Confirmed),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            WatchType::Locked => -1,
            WatchType::Tracking => 0,
            WatchType::Confirmed => 1,
        }
    }

    /// Commit derivation: first click above second click means the line is
    /// descending and the annotation is confirmed; otherwise it keeps tracking.
    pub fn derive(point1: f64, point2: f64) -> Self {
        if point1 > point2 {
            WatchType::Confirmed
        } else {
            WatchType::Tracking
        }
    }

    /// Drawing (click-capture) is permitted in every state except `Locked`.
    /// `None` (no annotation row yet) is drawing-eligible.
    pub fn permits_drawing(state: Option<WatchType>) -> bool {
        !matches!(state, Some(WatchType::Locked))
    }
}

impl Serialize for WatchType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for WatchType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = i64::deserialize(d)?;
        WatchType::from_i64(v)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid watch type {}", v)))
    }
}

/// One (date, price) endpoint of the reference trend-line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub date: NaiveDate,
    pub price: f64,
}

/// The persisted trend-line row for one instrument. Anchors are either both
/// present or both absent; dates are stored as `YYYY-MM-DD HH:MM:SS` text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Annotation {
    pub id: String,
    pub point1: Option<f64>,
    pub date1: Option<String>,
    pub point2: Option<f64>,
    pub date2: Option<String>,
    pub watch_type: i64,
}

impl Annotation {
    pub fn watch_type(&self) -> Option<WatchType> {
        WatchType::from_i64(self.watch_type)
    }

    /// Both anchors, or `None` when the row has no points yet. A row with only
    /// one side set is treated as unset rather than half-rendered.
    pub fn anchors(&self) -> Option<(Anchor, Anchor)> {
        let (p1, d1, p2, d2) = match (&self.point1, &self.date1, &self.point2, &self.date2) {
            (Some(p1), Some(d1), Some(p2), Some(d2)) => (*p1, d1, *p2, d2),
            _ => return None,
        };
        let date1 = timeutil::to_naive_date(&TimeInput::Text(d1.clone())).ok()?;
        let date2 = timeutil::to_naive_date(&TimeInput::Text(d2.clone())).ok()?;
        Some((
            Anchor { date: date1, price: p1 },
            Anchor { date: date2, price: p2 },
        ))
    }
}
