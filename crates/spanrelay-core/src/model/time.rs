//! Exact seconds + nanoseconds timestamps.
//!
//! All conversions go through integer arithmetic so that a value survives a
//! round trip through any supported format with nanosecond precision.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_unix_nanos(nanos: i64) -> Self {
        Self {
            seconds: nanos.div_euclid(NANOS_PER_SECOND),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as i32,
        }
    }

    /// Nanoseconds since the Unix epoch. Widened so no valid input overflows.
    pub fn unix_nanos(&self) -> i128 {
        i128::from(self.seconds) * i128::from(NANOS_PER_SECOND) + i128::from(self.nanos)
    }

    /// `None` when `nanos` is outside `0..1_000_000_000` or the instant is out
    /// of chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        if i64::from(nanos) >= NANOS_PER_SECOND {
            return None;
        }
        DateTime::from_timestamp(self.seconds, nanos)
    }

    pub fn from_datetime(datetime: &DateTime<Utc>) -> Self {
        Self {
            seconds: datetime.timestamp(),
            nanos: datetime.timestamp_subsec_nanos() as i32,
        }
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(s)?;
        Ok(Self::from_datetime(&parsed.with_timezone(&Utc)))
    }

    pub fn to_rfc3339(&self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    /// Time elapsed from `earlier` to `self`, or `None` if `earlier` is later.
    pub fn checked_duration_since(&self, earlier: &Timestamp) -> Option<Duration> {
        let delta = self.unix_nanos() - earlier.unix_nanos();
        if delta < 0 {
            return None;
        }
        let secs = u64::try_from(delta / i128::from(NANOS_PER_SECOND)).ok()?;
        let nanos = (delta % i128::from(NANOS_PER_SECOND)) as u32;
        Some(Duration::new(secs, nanos))
    }

    pub fn checked_add(&self, duration: Duration) -> Option<Timestamp> {
        let secs = i64::try_from(duration.as_secs()).ok()?;
        let mut seconds = self.seconds.checked_add(secs)?;
        let mut nanos = i64::from(self.nanos) + i64::from(duration.subsec_nanos());
        if nanos >= NANOS_PER_SECOND {
            seconds = seconds.checked_add(1)?;
            nanos -= NANOS_PER_SECOND;
        }
        Some(Timestamp::new(seconds, nanos as i32))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(&datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_round_trip_keeps_nanoseconds() {
        let ts = Timestamp::parse_rfc3339("2018-10-31T19:43:35.000000789Z").unwrap();
        assert_eq!(ts, Timestamp::new(1_541_015_015, 789));
        assert_eq!(ts.unix_nanos(), 1_541_015_015_000_000_789);

        let back = Timestamp::from_unix_nanos(1_541_015_015_000_000_789);
        assert_eq!(back, ts);
        assert_eq!(
            back.to_rfc3339().as_deref(),
            Some("2018-10-31T19:43:35.000000789Z")
        );
    }

    #[test]
    fn test_datetime_round_trip() {
        let ts = Timestamp::new(1_485_467_191, 639_875_000);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(Timestamp::from(dt), ts);
    }

    #[test]
    fn test_pre_epoch_unix_nanos() {
        let ts = Timestamp::from_unix_nanos(-1);
        assert_eq!(ts, Timestamp::new(-1, 999_999_999));
        assert_eq!(ts.unix_nanos(), -1);
    }

    #[test]
    fn test_out_of_range_nanos_have_no_datetime() {
        assert!(Timestamp::new(0, -1).to_datetime().is_none());
        assert!(Timestamp::new(0, 1_000_000_000).to_datetime().is_none());
    }

    #[test]
    fn test_duration_arithmetic() {
        let start = Timestamp::new(1_485_467_191, 639_875_000);
        let end = Timestamp::new(1_485_467_191, 662_813_000);
        let elapsed = end.checked_duration_since(&start).unwrap();
        assert_eq!(elapsed, Duration::from_nanos(22_938_000));
        assert_eq!(start.checked_add(elapsed), Some(end));
        assert!(start.checked_duration_since(&end).is_none());

        let carry = Timestamp::new(10, 900_000_000).checked_add(Duration::from_millis(200));
        assert_eq!(carry, Some(Timestamp::new(11, 100_000_000)));
    }
}
