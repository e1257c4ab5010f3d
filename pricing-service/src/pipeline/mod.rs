use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

/// Checks or rewrites one record. Returning `PipelineError::Rejected` drops the
/// record without stopping the run.
pub trait Transform<T>: Send + Sync {
    fn apply(&self, input: Envelope<T>) -> Result<Envelope<T>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    /// Consumes accepted records and returns how many were written.
    async fn run<S>(&self, input: S) -> Result<u64, PipelineError>
    where
        S: Stream<Item = Envelope<T>> + Send + Unpin + 'static;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub written: u64,
    pub rejected: u64,
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T>>>,
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + 'static,
    K: Sink<T> + 'static,
{
    /// Drives the source to completion.
    ///
    /// Rejected records are counted and skipped; a source failure ends the run
    /// after the records already accepted have been handed to the sink.
    pub async fn run(self) -> Result<PipelineReport, PipelineError> {
        let transforms = self.transforms;
        let mut upstream = self.source.stream().await;

        let (tx, rx) = futures::channel::mpsc::unbounded();
        let sink = self.sink;
        let writer = async move { sink.run(rx).await };

        let feeder = async move {
            let mut rejected = 0u64;
            while let Some(item) = upstream.next().await {
                let env = match item {
                    Ok(env) => env,
                    Err(PipelineError::Rejected(reason)) => {
                        rejected += 1;
                        tracing::warn!(%reason, "record rejected by source");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                match transforms.iter().try_fold(env, |env, t| t.apply(env)) {
                    Ok(env) => {
                        if tx.unbounded_send(env).is_err() {
                            return Err(PipelineError::Sink("sink stopped early".to_string()));
                        }
                    }
                    Err(e) => {
                        rejected += 1;
                        tracing::warn!(error = %e, "record rejected by transform");
                    }
                }
            }
            Ok(rejected)
        };

        let (fed, written) = futures::join!(feeder, writer);
        let written = written?;
        let rejected = fed?;

        Ok(PipelineReport { written, rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct VecSource(Vec<Result<i64, String>>);

    #[async_trait::async_trait]
    impl Source<i64> for VecSource {
        async fn stream(&self) -> EnvelopeStream<i64> {
            let items: Vec<_> = self
                .0
                .iter()
                .cloned()
                .map(|r| r.map(Envelope::now).map_err(PipelineError::Rejected))
                .collect();
            Box::pin(futures::stream::iter(items))
        }
    }

    struct NonNegative;

    impl Transform<i64> for NonNegative {
        fn apply(&self, input: Envelope<i64>) -> Result<Envelope<i64>, PipelineError> {
            if input.payload < 0 {
                return Err(PipelineError::Rejected("negative".to_string()));
            }
            Ok(input)
        }
    }

    #[derive(Clone, Default)]
    struct CollectSink(Arc<Mutex<Vec<i64>>>);

    #[async_trait::async_trait]
    impl Sink<i64> for CollectSink {
        async fn run<S>(&self, mut input: S) -> Result<u64, PipelineError>
        where
            S: Stream<Item = Envelope<i64>> + Send + Unpin + 'static,
        {
            let mut n = 0;
            while let Some(env) = input.next().await {
                self.0.lock().unwrap().push(env.payload);
                n += 1;
            }
            Ok(n)
        }
    }

    #[tokio::test]
    async fn rejected_records_are_counted_and_skipped() {
        let sink = CollectSink::default();
        let pipeline = Pipeline {
            source: VecSource(vec![Ok(1), Ok(-2), Err("bad row".to_string()), Ok(3)]),
            transforms: vec![Arc::new(NonNegative) as Arc<dyn Transform<i64>>],
            sink: sink.clone(),
        };

        let report = pipeline.run().await.unwrap();

        assert_eq!(report, PipelineReport { written: 2, rejected: 2 });
        assert_eq!(*sink.0.lock().unwrap(), vec![1, 3]);
    }
}
