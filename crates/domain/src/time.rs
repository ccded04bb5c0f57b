//! Timestamps and the wall-clock minutes schedules are evaluated against.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

/// UTC timestamp used for `last_contact`, event times and execution records.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Wall-clock reading of `ts`, in the host's local zone or in UTC.
#[must_use]
pub fn wall_clock(ts: Timestamp, local: bool) -> NaiveDateTime {
    if local {
        ts.with_timezone(&chrono::Local).naive_local()
    } else {
        ts.naive_utc()
    }
}

/// Start of the minute containing `wall`.
#[must_use]
pub fn minute_of(wall: NaiveDateTime) -> NaiveDateTime {
    wall.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(wall)
}
