use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One selectable stock or fund: exchange-prefixed ticker (e.g. "SZ000001")
/// or fund code (e.g. "270042"), plus a display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instrument {
    pub id: String,
    pub name: String,
}

/// Which instrument table (and which upstream gateway) a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Stock,
    Fund,
}

impl InstrumentKind {
    /// Table holding this kind's id/name rows. The fund table keeps its
    /// historical singular name.
    pub fn table(&self) -> &'static str {
        match self {
            InstrumentKind::Stock => "stocks",
            InstrumentKind::Fund => "fund",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInstrument {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInstrument {
    pub name: String,
}
