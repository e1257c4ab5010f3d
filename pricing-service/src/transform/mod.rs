use bigdecimal::{BigDecimal, Zero};
use pricing_core::{MeterReading, Reading};

use crate::pipeline::{Envelope, PipelineError, Transform};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("smart meter id is missing or empty")]
    MissingMeterId,
    #[error("no electricity readings supplied")]
    MissingReadings,
    #[error("reading must be non-negative, got {0}")]
    NegativeReading(BigDecimal),
}

/// Pure validation of a single reading: the value must be non-negative.
/// Any timestamp is accepted; costing handles the epoch-0 single reading
/// itself.
pub fn validate_reading(reading: &Reading) -> Result<(), ValidationError> {
    if reading.value < BigDecimal::zero() {
        return Err(ValidationError::NegativeReading(reading.value.clone()));
    }

    Ok(())
}

/// Validates an ingestion request before it reaches the store and hands back
/// its parts.
///
/// A request without a meter id, or with an absent or empty reading list, is
/// rejected as a whole, as is a request containing any invalid reading.
pub fn validate_meter_readings(
    meter_id: Option<String>,
    readings: Option<Vec<Reading>>,
) -> Result<(String, Vec<Reading>), ValidationError> {
    let meter_id = meter_id
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::MissingMeterId)?;
    let readings = readings
        .filter(|r| !r.is_empty())
        .ok_or(ValidationError::MissingReadings)?;

    readings.iter().try_for_each(validate_reading)?;

    Ok((meter_id, readings))
}

#[derive(Clone, Default)]
pub struct MeterReadingValidation;

impl Transform<MeterReading> for MeterReadingValidation {
    fn apply(&self, input: Envelope<MeterReading>) -> Result<Envelope<MeterReading>, PipelineError> {
        let m = &input.payload;
        let res = if m.meter_id.is_empty() {
            Err(ValidationError::MissingMeterId)
        } else {
            validate_reading(&m.reading)
        };

        match res {
            Ok(()) => Ok(input),
            Err(e) => {
                metrics::counter!("readings_rejected_total", "path" => "backfill").increment(1);
                Err(PipelineError::Rejected(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::{macros::datetime, OffsetDateTime};

    fn reading(ts: OffsetDateTime, value: &str) -> Reading {
        Reading::new(ts, BigDecimal::from_str(value).unwrap())
    }

    #[test]
    fn accepts_valid_request() {
        let readings = vec![reading(datetime!(2024-04-26 00:00:10 UTC), "0.5")];

        let (meter_id, accepted) = validate_meter_readings(Some("m-1".to_string()), Some(readings.clone())).unwrap();

        assert_eq!(meter_id, "m-1");
        assert_eq!(accepted, readings);
    }

    #[test]
    fn rejects_missing_or_empty_meter_id() {
        let readings = vec![reading(datetime!(2024-04-26 00:00:10 UTC), "1")];

        assert_eq!(
            validate_meter_readings(None, Some(readings.clone())),
            Err(ValidationError::MissingMeterId)
        );
        assert_eq!(
            validate_meter_readings(Some(String::new()), Some(readings)),
            Err(ValidationError::MissingMeterId)
        );
    }

    #[test]
    fn rejects_missing_or_empty_readings() {
        assert_eq!(
            validate_meter_readings(Some("m-1".to_string()), None),
            Err(ValidationError::MissingReadings)
        );
        assert_eq!(
            validate_meter_readings(Some("m-1".to_string()), Some(Vec::new())),
            Err(ValidationError::MissingReadings)
        );
    }

    #[test]
    fn rejects_negative_reading() {
        let readings = vec![
            reading(datetime!(2024-04-26 00:00:10 UTC), "1"),
            reading(datetime!(2024-04-26 00:00:20 UTC), "-0.1"),
        ];

        assert!(matches!(
            validate_meter_readings(Some("m-1".to_string()), Some(readings)),
            Err(ValidationError::NegativeReading(_))
        ));
    }

    #[test]
    fn accepts_any_timestamp() {
        for ts in [
            datetime!(1800-01-01 00:00:00 UTC),
            datetime!(1970-01-01 00:00:00 UTC),
            datetime!(2200-06-01 12:00:00 UTC),
        ] {
            assert_eq!(validate_reading(&reading(ts, "1")), Ok(()));
        }
    }

    #[test]
    fn transform_rejects_blank_meter() {
        let env = Envelope::now(MeterReading {
            meter_id: String::new(),
            reading: reading(datetime!(2024-01-01 00:00:00 UTC), "1"),
        });

        assert!(matches!(MeterReadingValidation.apply(env), Err(PipelineError::Rejected(_))));
    }
}
