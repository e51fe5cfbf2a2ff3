// Time primitives shared by the live order pipeline.
//
// Purpose
// - Give the pipeline an injectable notion of "now" so runs are reproducible in tests.
// - Compute the start of the venue's business day and the minute bucket of a timestamp.

use chrono::{DateTime, Duration, DurationRound, FixedOffset, TimeZone, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an instant, movable by tests.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard = instant;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Midnight of the venue-local day containing `now`, expressed in UTC.
pub fn start_of_business_day(now: DateTime<Utc>, venue_offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&venue_offset).date_naive();
    let midnight = local_date.and_hms_opt(0, 0, 0).unwrap_or_default();
    venue_offset
        .from_local_datetime(&midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Truncates a timestamp to whole-minute granularity.
pub fn minute_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}
