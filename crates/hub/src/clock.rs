//! Calendar date / time-of-day stamping for ingested readings.
//!
//! Semantics are "UTC plus a fixed offset" (no DST), so a host timezone
//! change can never reorder the log. The shipped config uses +03:30,
//! where the device fleet lives.

use anyhow::{Context, Result};
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    offset: UtcOffset,
}

/// Date (`YYYY-MM-DD`) and time-of-day (`HH:MM:SS`) strings, the only
/// precision a reading carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub date: String,
    pub time: String,
}

impl Clock {
    pub fn with_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = UtcOffset::from_whole_seconds(minutes * 60)
            .with_context(|| format!("invalid utc offset: {minutes} minutes"))?;
        Ok(Self { offset })
    }

    /// Stamp the current instant. Infallible: the system clock always
    /// yields an instant and the formatting below cannot fail.
    pub fn now(&self) -> Timestamp {
        stamp(OffsetDateTime::now_utc().to_offset(self.offset))
    }
}

fn stamp(t: OffsetDateTime) -> Timestamp {
    Timestamp {
        date: format!("{:04}-{:02}-{:02}", t.year(), t.month() as u8, t.day()),
        time: format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn stamp_formats_date_and_time() {
        let ts = stamp(datetime!(2026-08-07 04:05:06 UTC));
        assert_eq!(ts.date, "2026-08-07");
        assert_eq!(ts.time, "04:05:06");
    }

    #[test]
    fn stamp_pads_single_digits() {
        let ts = stamp(datetime!(2005-01-02 03:04:05 UTC));
        assert_eq!(ts.date, "2005-01-02");
        assert_eq!(ts.time, "03:04:05");
    }

    #[test]
    fn offset_rolls_the_date_forward() {
        let clock = Clock::with_offset_minutes(210).unwrap();
        let local = datetime!(2026-08-07 22:00:00 UTC).to_offset(clock.offset);
        let ts = stamp(local);
        assert_eq!(ts.date, "2026-08-08");
        assert_eq!(ts.time, "01:30:00");
    }

    #[test]
    fn negative_offset_rolls_the_date_back() {
        let clock = Clock::with_offset_minutes(-300).unwrap();
        let local = datetime!(2026-08-07 02:00:00 UTC).to_offset(clock.offset);
        let ts = stamp(local);
        assert_eq!(ts.date, "2026-08-06");
        assert_eq!(ts.time, "21:00:00");
    }

    #[test]
    fn zero_offset_is_utc() {
        let clock = Clock::with_offset_minutes(0).unwrap();
        let ts = clock.now();
        assert_eq!(ts.date.len(), 10);
        assert_eq!(ts.time.len(), 8);
    }

    #[test]
    fn absurd_offset_is_rejected() {
        assert!(Clock::with_offset_minutes(2000).is_err());
        assert!(Clock::with_offset_minutes(-2000).is_err());
    }

    #[test]
    fn now_produces_wellformed_strings() {
        let clock = Clock::with_offset_minutes(210).unwrap();
        let ts = clock.now();
        assert_eq!(ts.date.as_bytes()[4], b'-');
        assert_eq!(ts.date.as_bytes()[7], b'-');
        assert_eq!(ts.time.as_bytes()[2], b':');
        assert_eq!(ts.time.as_bytes()[5], b':');
    }
}
