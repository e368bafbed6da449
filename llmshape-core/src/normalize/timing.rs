//! Request timestamps used for latency reporting

use chrono::{DateTime, Utc};
use std::time::Instant;

/// A point in time captured around the provider call.
///
/// Latency is only computed between two timestamps of the same kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    /// Monotonic clock reading
    Monotonic(Instant),
    /// Wall clock reading
    Wall(DateTime<Utc>),
}

impl Timestamp {
    pub fn now() -> Self {
        Timestamp::Monotonic(Instant::now())
    }
}

impl From<Instant> for Timestamp {
    fn from(instant: Instant) -> Self {
        Timestamp::Monotonic(instant)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(time: DateTime<Utc>) -> Self {
        Timestamp::Wall(time)
    }
}

/// Milliseconds between `start` and `end`; `None` unless both are supplied and
/// of the same kind
pub fn elapsed_ms(start: Option<Timestamp>, end: Option<Timestamp>) -> Option<f64> {
    match (start?, end?) {
        (Timestamp::Monotonic(start), Timestamp::Monotonic(end)) => {
            Some(end.saturating_duration_since(start).as_secs_f64() * 1000.0)
        }
        (Timestamp::Wall(start), Timestamp::Wall(end)) => {
            let delta = end.signed_duration_since(start);
            delta
                .num_microseconds()
                .map(|micros| micros as f64 / 1000.0)
        }
        _ => None,
    }
}
