use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};
use pricing_core::{MeterReading, Reading, ReadingStore};

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Writes accepted readings into the in-memory store, one append per meter
/// per batch.
pub struct ReadingStoreSink {
    store: Arc<ReadingStore>,
    batch_size: usize,
}

impl ReadingStoreSink {
    pub fn new(store: Arc<ReadingStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    fn flush_batch(&self, batch: &mut Vec<Envelope<MeterReading>>) -> u64 {
        if batch.is_empty() {
            return 0;
        }

        let oldest = batch.iter().map(|e| e.received_at).min();
        let written = batch.len() as u64;

        let mut by_meter: BTreeMap<String, Vec<Reading>> = BTreeMap::new();
        for env in batch.drain(..) {
            let MeterReading { meter_id, reading } = env.payload;
            by_meter.entry(meter_id).or_default().push(reading);
        }

        for (meter_id, readings) in by_meter {
            let len = self.store.append(&meter_id, readings);
            tracing::debug!(meter_id = %meter_id, series_len = len, "appended backfill batch");
        }

        metrics::counter!("readings_ingested_total", "path" => "backfill").increment(written);
        if let Some(Ok(dur)) = oldest.map(|t| SystemTime::now().duration_since(t)) {
            metrics::histogram!("backfill_batch_latency_seconds").record(dur.as_secs_f64());
        }

        written
    }
}

#[async_trait::async_trait]
impl Sink<MeterReading> for ReadingStoreSink {
    async fn run<S>(&self, mut input: S) -> Result<u64, PipelineError>
    where
        S: Stream<Item = Envelope<MeterReading>> + Send + Unpin + 'static,
    {
        let mut buffer: Vec<Envelope<MeterReading>> = Vec::with_capacity(self.batch_size);
        let mut written = 0;

        while let Some(env) = input.next().await {
            buffer.push(env);
            if buffer.len() >= self.batch_size {
                written += self.flush_batch(&mut buffer);
            }
        }
        written += self.flush_batch(&mut buffer);

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use time::macros::datetime;

    fn env(meter_id: &str, secs: i64, value: i64) -> Envelope<MeterReading> {
        Envelope::now(MeterReading {
            meter_id: meter_id.to_string(),
            reading: Reading::new(
                datetime!(2024-04-26 00:00:00 UTC) + time::Duration::seconds(secs),
                BigDecimal::from(value),
            ),
        })
    }

    #[tokio::test]
    async fn groups_batches_by_meter() {
        let store = Arc::new(ReadingStore::new());
        let sink = ReadingStoreSink::new(store.clone(), 2);
        let input = futures::stream::iter(vec![env("a", 1, 1), env("b", 2, 2), env("a", 3, 3)]);

        let written = sink.run(input).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(store.len("a"), Some(2));
        assert_eq!(store.len("b"), Some(1));
    }
}
