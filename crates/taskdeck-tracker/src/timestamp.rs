/*
[INPUT]:  Raw `startTime`/`updatedAt` values from the Task Service
[OUTPUT]: Validated start instants and elapsed seconds since them
[POS]:    Shared helpers - timestamp validation for timer resume
[UPDATE]: When the service changes its timestamp encoding
*/

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Epoch numbers above this are milliseconds rather than seconds
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// A server timestamp that parsed and is not a sentinel.
///
/// Non-positive instants (the Unix epoch and before) are what the service
/// reports for "never started" and are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StartedAt(DateTime<Utc>);

impl StartedAt {
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (UTC) and epoch seconds or millis
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let instant = if let Ok(number) = raw.parse::<i64>() {
            if number.abs() >= MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(number).single()?
            } else {
                Utc.timestamp_opt(number, 0).single()?
            }
        } else if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            parsed.with_timezone(&Utc)
        } else {
            let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()?;
            Utc.from_utc_datetime(&naive)
        };

        Self::from_datetime(instant)
    }

    pub fn from_datetime(instant: DateTime<Utc>) -> Option<Self> {
        (instant.timestamp_millis() > 0).then_some(Self(instant))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds between this instant and `now`, never negative
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        (now - self.0).num_seconds().max(0) as u64
    }
}
