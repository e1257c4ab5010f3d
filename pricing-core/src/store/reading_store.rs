use std::{
    collections::{hash_map::RandomState, HashMap},
    hash::BuildHasher,
    sync::Arc,
};

use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::domain::Reading;

pub const DEFAULT_SHARDS: usize = 16;

type Series = Arc<RwLock<Vec<Reading>>>;
type Shard = RwLock<HashMap<String, Series>>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no readings stored for meter '{0}'")]
    NotFound(String),
}

/// Memory-resident reading series keyed by smart meter id.
///
/// Meters are spread over a fixed set of shards. A shard lock only guards the
/// meter -> series handle lookup; appends and snapshots take the per-meter lock,
/// so traffic for different meters never waits on a shared series.
///
/// Series are kept in arrival order. Every read sorts its own snapshot by
/// timestamp, which keeps the write path to a single `extend`.
pub struct ReadingStore {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// `shards` is rounded up to the next power of two.
    pub fn with_shards(shards: usize) -> Self {
        let count = shards.max(1).next_power_of_two();
        let shards = (0..count).map(|_| RwLock::new(HashMap::new())).collect();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, meter_id: &str) -> &Shard {
        let idx = (self.hasher.hash_one(meter_id) as usize) & (self.shards.len() - 1);
        &self.shards[idx]
    }

    fn series(&self, meter_id: &str) -> Option<Series> {
        self.shard(meter_id).read().get(meter_id).cloned()
    }

    fn series_or_create(&self, meter_id: &str) -> Series {
        if let Some(series) = self.series(meter_id) {
            return series;
        }

        self.shard(meter_id)
            .write()
            .entry(meter_id.to_string())
            .or_default()
            .clone()
    }

    /// Appends `readings` to the meter's series, creating it if needed.
    ///
    /// Returns the series length after the append. An empty batch still
    /// registers the meter.
    pub fn append<I>(&self, meter_id: &str, readings: I) -> usize
    where
        I: IntoIterator<Item = Reading>,
    {
        // Collect outside the lock so a slow iterator cannot hold up readers.
        let batch: Vec<Reading> = readings.into_iter().collect();
        let series = self.series_or_create(meter_id);

        let mut guard = series.write();
        guard.extend(batch);
        guard.len()
    }

    /// Copy of the series at call time, in arrival order.
    fn snapshot(&self, meter_id: &str) -> Result<Vec<Reading>, StoreError> {
        let series = self
            .series(meter_id)
            .ok_or_else(|| StoreError::NotFound(meter_id.to_string()))?;

        let snapshot = series.read().clone();
        Ok(snapshot)
    }

    /// Readings sorted by timestamp, restricted to `[offset, offset + limit)`.
    ///
    /// Out of range windows are clamped: an offset past the end yields an empty
    /// page and a limit past the end is truncated.
    pub fn page(&self, meter_id: &str, offset: usize, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let mut readings = self.snapshot(meter_id)?;
        readings.sort_by_key(|r| r.ts);

        Ok(readings.into_iter().skip(offset).take(limit).collect())
    }

    /// Readings strictly between `from` and `to`, sorted by timestamp.
    pub fn range(
        &self,
        meter_id: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Reading>, StoreError> {
        let mut readings: Vec<Reading> = self
            .snapshot(meter_id)?
            .into_iter()
            .filter(|r| from < r.ts && r.ts < to)
            .collect();
        readings.sort_by_key(|r| r.ts);

        Ok(readings)
    }

    /// Number of readings stored for the meter, if it was ever written.
    pub fn len(&self, meter_id: &str) -> Option<usize> {
        self.series(meter_id).map(|s| s.read().len())
    }

    pub fn meter_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .shards
            .iter()
            .flat_map(|shard| shard.read().keys().cloned().collect::<Vec<_>>())
            .collect();
        ids.sort();
        ids
    }
}
