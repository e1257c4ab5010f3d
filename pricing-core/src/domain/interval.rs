use time::{Duration, OffsetDateTime, Time, UtcOffset};

/// Window of instants; readings strictly between `start` and `end` fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl Interval {
    /// The full calendar week (Sunday 00:00 UTC to Sunday 00:00 UTC) that ended
    /// on or before `now`.
    pub fn previous_week(now: OffsetDateTime) -> Self {
        let midnight = now.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT);
        let days_since_sunday = i64::from(midnight.weekday().number_days_from_sunday());
        let end = midnight - Duration::days(days_since_sunday);

        Self {
            start: end - Duration::weeks(1),
            end,
        }
    }

    pub fn previous_week_from_now() -> Self {
        Self::previous_week(OffsetDateTime::now_utc())
    }
}
