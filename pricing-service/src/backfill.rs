use std::{path::Path, sync::Arc};

use pricing_core::{MeterReading, ReadingStore};

use crate::{
    pipeline::{Pipeline, PipelineError, PipelineReport, Transform},
    sinks::ReadingStoreSink,
    sources::ReadingCsvFileSource,
    transform::MeterReadingValidation,
};

/// Loads a readings CSV into `store` through the validation pipeline.
pub async fn backfill_csv(
    path: &Path,
    store: Arc<ReadingStore>,
    batch_size: usize,
) -> Result<PipelineReport, PipelineError> {
    let pipeline: Pipeline<_, MeterReading, _> = Pipeline {
        source: ReadingCsvFileSource::new(path),
        transforms: vec![Arc::new(MeterReadingValidation) as Arc<dyn Transform<MeterReading>>],
        sink: ReadingStoreSink::new(store, batch_size),
    };

    let report = pipeline.run().await?;
    tracing::info!(
        path = %path.display(),
        written = report.written,
        rejected = report.rejected,
        "backfill finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_valid_rows_and_skips_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "smart_meter_id,time,reading").unwrap();
        writeln!(file, "bob,2024-04-26T00:00:30Z,30").unwrap();
        writeln!(file, "bob,2024-04-26T00:00:10Z,10").unwrap();
        writeln!(file, "bob,2024-04-26T00:00:20Z,-20").unwrap();
        writeln!(file, ",2024-04-26T00:00:20Z,20").unwrap();
        writeln!(file, "alice,garbage,1").unwrap();
        writeln!(file, "alice,2024-04-26T00:00:10Z,1").unwrap();
        file.flush().unwrap();

        let store = Arc::new(ReadingStore::new());
        let report = backfill_csv(file.path(), store.clone(), 2).await.unwrap();

        assert_eq!(report, PipelineReport { written: 3, rejected: 3 });
        assert_eq!(store.len("bob"), Some(2));
        assert_eq!(store.len("alice"), Some(1));
        assert_eq!(store.meter_ids(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn unreadable_file_fails() {
        let store = Arc::new(ReadingStore::new());

        let res = backfill_csv(Path::new("/no/such/readings.csv"), store, 10).await;

        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
