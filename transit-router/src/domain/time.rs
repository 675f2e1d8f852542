//! Timetable time handling.
//!
//! Connection times arrive as "HH:MM:SS" strings relative to a service day.
//! Hours of 24 and above belong to the following calendar day, so a trip
//! arriving at "24:05:00" sorts after one departing at "23:50:00".

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Add;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Hours beyond this value are rejected; a service day spans at most two calendar days.
const MAX_SERVICE_HOUR: u32 = 47;

/// A date-aware timestamp with second resolution.
///
/// # Examples
///
/// ```
/// use transit_router::domain::TransitTime;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
/// let time = TransitTime::parse_hms("14:30:15", date).unwrap();
/// assert_eq!(time.to_string(), "14:30:15");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitTime(NaiveDateTime);

impl TransitTime {
    /// Create a new TransitTime from date and time components.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }

    /// Parse "HH:MM:SS" relative to `service_date`.
    ///
    /// Hours 24-47 roll over onto the following day.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::TransitTime;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
    ///
    /// assert!(TransitTime::parse_hms("00:00:00", date).is_ok());
    /// assert!(TransitTime::parse_hms("23:59:59", date).is_ok());
    ///
    /// let midnight = TransitTime::parse_hms("24:00:00", date).unwrap();
    /// assert_eq!(midnight.date(), NaiveDate::from_ymd_opt(2025, 3, 25).unwrap());
    /// assert_eq!(midnight.to_string(), "00:00:00");
    ///
    /// assert!(TransitTime::parse_hms("14:30", date).is_err());
    /// assert!(TransitTime::parse_hms("14:61:00", date).is_err());
    /// ```
    pub fn parse_hms(s: &str, service_date: NaiveDate) -> Result<Self, TimeError> {
        let s = s.trim();
        let mut parts = s.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        let hour = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > MAX_SERVICE_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }
        let minute = parse_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        let second = parse_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        let time = NaiveTime::from_hms_opt(hour % 24, minute, second)
            .ok_or_else(|| TimeError::new("invalid time"))?;
        let date = if hour >= 24 {
            service_date
                .succ_opt()
                .ok_or_else(|| TimeError::new("date overflow"))?
        } else {
            service_date
        };

        Ok(Self::new(date, time))
    }

    /// Returns the date component.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Returns the time-of-day component.
    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    /// Converts to a NaiveDateTime.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Add a duration, advancing the date when midnight is crossed.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add_signed(duration).map(Self)
    }

    /// Subtract a duration.
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.0.checked_sub_signed(duration).map(Self)
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        self.0.signed_duration_since(other.0)
    }
}

impl From<NaiveDateTime> for TransitTime {
    fn from(dt: NaiveDateTime) -> Self {
        // Sub-second precision is dropped; the timetable works in whole seconds.
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }
}

impl Add<Duration> for TransitTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self.checked_add(rhs).expect("time overflow")
    }
}

impl fmt::Debug for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitTime({} {})", self.date(), self)
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl Serialize for TransitTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// Parse one or two ASCII digits.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Anything we can parse renders back to the same wall-clock time
        #[test]
        fn display_roundtrip(h in 0u32..24, m in 0u32..60, s in 0u32..60) {
            let d = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
            let text = format!("{h:02}:{m:02}:{s:02}");
            let t = TransitTime::parse_hms(&text, d).unwrap();
            prop_assert_eq!(t.to_string(), text);
            prop_assert_eq!(t.date(), d);
        }

        /// Ordering follows seconds since the service-day start, including rollover hours
        #[test]
        fn ordering_matches_service_seconds(a in 0u32..(48 * 3600), b in 0u32..(48 * 3600)) {
            let d = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
            let fmt = |x: u32| format!("{:02}:{:02}:{:02}", x / 3600, (x / 60) % 60, x % 60);
            let ta = TransitTime::parse_hms(&fmt(a), d).unwrap();
            let tb = TransitTime::parse_hms(&fmt(b), d).unwrap();
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
            prop_assert_eq!(
                tb.signed_duration_since(ta).num_seconds(),
                i64::from(b) - i64::from(a)
            );
        }
    }
}
