use std::{fs::File, path::PathBuf};

use bigdecimal::BigDecimal;
use csv::StringRecord;
use pricing_core::{MeterReading, Reading};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// CSV backfill source for meter readings.
///
/// Expected header columns (by name, any order):
/// - smart_meter_id
/// - time (RFC3339 timestamp)
/// - reading (decimal kW)
///
/// Unparseable rows are rejected individually; an unreadable file ends the run.
pub struct ReadingCsvFileSource {
    path: PathBuf,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn record_to_meter_reading(record: &StringRecord, headers: &StringRecord) -> Result<MeterReading, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .ok_or_else(|| PipelineError::Rejected(format!("missing column '{name}' in CSV record")))
    };

    let meter_id = get("smart_meter_id")?.to_string();

    let ts_str = get("time")?;
    let ts = OffsetDateTime::parse(ts_str, &Rfc3339)
        .map_err(|e| PipelineError::Rejected(format!("invalid time '{ts_str}': {e}")))?;

    let value_str = get("reading")?;
    let value: BigDecimal = value_str
        .parse()
        .map_err(|e| PipelineError::Rejected(format!("invalid reading '{value_str}': {e}")))?;

    Ok(MeterReading {
        meter_id,
        reading: Reading::new(ts, value),
    })
}

#[async_trait::async_trait]
impl Source<MeterReading> for ReadingCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<MeterReading> {
        // Blocking reads, but backfill runs once before the server starts.
        let path = self.path.clone();
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to open CSV file {}: {e}", path.display())));
                    return;
                }
            };
            let mut rdr = csv::Reader::from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to read CSV headers: {e}")));
                    return;
                }
            };

            for result in rdr.records() {
                let parsed = result
                    .map_err(|e| PipelineError::Rejected(format!("failed to read CSV record: {e}")))
                    .and_then(|record| record_to_meter_reading(&record, &headers));

                match parsed {
                    Ok(reading) => yield Ok(Envelope::now(reading)),
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        yield Err(e);
                    }
                }
            }
        };

        Box::pin(s)
    }
}
