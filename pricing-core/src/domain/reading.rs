use bigdecimal::BigDecimal;
use time::OffsetDateTime;

/// A single electricity meter observation, in kW.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub ts: OffsetDateTime,
    pub value: BigDecimal,
}

impl Reading {
    pub fn new(ts: OffsetDateTime, value: BigDecimal) -> Self {
        Self { ts, value }
    }
}

/// A reading tagged with the meter that produced it, as carried by bulk
/// ingestion paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterReading {
    pub meter_id: String,
    pub reading: Reading,
}
