use bigdecimal::BigDecimal;
use pricing_core::{Reading, ReadingStore};
use rand::Rng;
use time::{Duration, OffsetDateTime};

const READING_SPACING_SECS: i64 = 10;

/// `count` readings ten seconds apart, the newest at `end`, oldest first.
/// Values are drawn from [0, 1) with four decimal places.
pub fn generate_readings<R: Rng + ?Sized>(rng: &mut R, count: usize, end: OffsetDateTime) -> Vec<Reading> {
    (0..count as i64)
        .rev()
        .map(|i| {
            let ts = end - Duration::seconds(READING_SPACING_SECS * i);
            let value = BigDecimal::new(rng.gen_range(0..10_000i64).into(), 4);
            Reading::new(ts, value)
        })
        .collect()
}

/// Fills the store with generated readings for every meter in `meter_ids`.
/// Returns the number of readings written.
pub fn seed_meters<'a, R, I>(
    store: &ReadingStore,
    meter_ids: I,
    readings_per_meter: usize,
    now: OffsetDateTime,
    rng: &mut R,
) -> usize
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut written = 0;
    for meter_id in meter_ids {
        store.append(meter_id, generate_readings(rng, readings_per_meter, now));
        written += readings_per_meter;
    }

    tracing::info!(readings = written, "seeded reading store");
    written
}
