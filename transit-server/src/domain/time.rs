//! Clock time handling for bus timetables.
//!
//! Timetables list departures as "HH:MM" strings. Late-evening trips are
//! sometimes written past midnight ("24:15"), so a [`ClockTime`] counts
//! minutes from the start of the service day and may exceed 24 hours.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Latest hour accepted when parsing, exclusive.
const MAX_HOUR: u32 = 48;

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

/// A time of day on the service day, in whole minutes since midnight.
///
/// # Examples
///
/// ```
/// use transit_server::domain::ClockTime;
///
/// let t = ClockTime::parse_hhmm("07:05").unwrap();
/// assert_eq!(t.as_minutes(), 425);
/// assert_eq!(t.to_string(), "07:05");
///
/// // Past-midnight notation is accepted and displayed on the clock face
/// let late = ClockTime::parse_hhmm("24:10").unwrap();
/// assert_eq!(late.as_minutes(), 1450);
/// assert_eq!(late.to_string(), "00:10");
///
/// assert!(ClockTime::parse_hhmm("7h05").is_err());
/// assert!(ClockTime::parse_hhmm("12:60").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u32);

impl ClockTime {
    /// Create a time from minutes since the start of the service day.
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Parse "HH:MM" or "H:MM".
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let (hours, minutes) = s
            .split_once(':')
            .ok_or_else(|| TimeError::new("expected HH:MM format"))?;

        if hours.is_empty() || hours.len() > 2 {
            return Err(TimeError::new("expected one or two hour digits"));
        }
        if minutes.len() != 2 {
            return Err(TimeError::new("expected two minute digits"));
        }

        let hour = parse_digits(hours).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour >= MAX_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }

        let minute =
            parse_digits(minutes).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self(hour * 60 + minute))
    }

    /// Time of day of a wall-clock reading.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self(time.hour() * 60 + time.minute())
    }

    /// Minutes since the start of the service day.
    pub fn as_minutes(&self) -> u32 {
        self.0
    }

    /// Hour on the clock face (0-23).
    pub fn hour(&self) -> u32 {
        (self.0 / 60) % 24
    }

    pub fn minute(&self) -> u32 {
        self.0 % 60
    }

    /// Whether this time falls after the first service day.
    pub fn is_next_day(&self) -> bool {
        self.0 >= MINUTES_PER_DAY
    }

    /// Advance by a number of minutes.
    pub fn add_minutes(&self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    /// Minutes from `self` until `later`, assuming `later` is within the next
    /// 24 hours. Both readings are compared on the clock face, so an earlier
    /// reading is taken to be on the following day whichever notation
    /// ("24:58" or "00:58") each side uses.
    ///
    /// ```
    /// use transit_server::domain::ClockTime;
    ///
    /// let dep = ClockTime::parse_hhmm("23:50").unwrap();
    /// let arr = ClockTime::parse_hhmm("00:05").unwrap();
    /// assert_eq!(dep.minutes_until(arr), 15);
    /// ```
    pub fn minutes_until(&self, later: ClockTime) -> u32 {
        let diff = i64::from(later.0) - i64::from(self.0);
        diff.rem_euclid(i64::from(MINUTES_PER_DAY)) as u32
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({}:{:02})", self.0 / 60, self.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse_hhmm(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse one stop's timetable column.
///
/// Unparseable entries become `None` so that trip indices stay aligned
/// with the neighbouring stops.
pub fn parse_time_column<S: AsRef<str>>(times: &[S]) -> Vec<Option<ClockTime>> {
    times
        .iter()
        .map(|t| ClockTime::parse_hhmm(t.as_ref()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse_hhmm(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(t("00:00").as_minutes(), 0);
        assert_eq!(t("23:59").as_minutes(), 23 * 60 + 59);
        assert_eq!(t("7:30").as_minutes(), 450);
        assert_eq!(t(" 07:30 ").as_minutes(), 450);
        assert_eq!(t("25:00").as_minutes(), 1500);
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ClockTime::parse_hhmm("").is_err());
        assert!(ClockTime::parse_hhmm("0730").is_err());
        assert!(ClockTime::parse_hhmm("07:3").is_err());
        assert!(ClockTime::parse_hhmm("123:00").is_err());
        assert!(ClockTime::parse_hhmm(":30").is_err());
        assert!(ClockTime::parse_hhmm("+7:30").is_err());
        assert!(ClockTime::parse_hhmm("ab:cd").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        let err = ClockTime::parse_hhmm("48:00").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: hour must be 0-47");

        let err = ClockTime::parse_hhmm("12:60").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: minute must be 0-59");
    }

    #[test]
    fn display_wraps_clock_face() {
        assert_eq!(t("09:05").to_string(), "09:05");
        assert_eq!(t("24:00").to_string(), "00:00");
        assert_eq!(t("26:45").to_string(), "02:45");
        assert_eq!(format!("{:?}", t("26:45")), "ClockTime(26:45)");
    }

    #[test]
    fn ordering_by_minutes() {
        assert!(t("07:00") < t("07:01"));
        assert!(t("23:59") < t("24:00"));
        assert!(!t("23:59").is_next_day());
        assert!(t("24:00").is_next_day());
    }

    #[test]
    fn minutes_until_wraps_midnight() {
        assert_eq!(t("07:00").minutes_until(t("07:03")), 3);
        assert_eq!(t("07:00").minutes_until(t("07:00")), 0);
        assert_eq!(t("23:58").minutes_until(t("00:02")), 4);
    }

    #[test]
    fn minutes_until_mixed_notation() {
        assert_eq!(t("24:58").minutes_until(t("01:03")), 5);
        assert_eq!(t("30:00").minutes_until(t("01:00")), 19 * 60);
        assert_eq!(t("23:50").minutes_until(t("24:05")), 15);
        assert_eq!(t("47:59").minutes_until(t("00:00")), 1);
        assert_eq!(t("00:10").minutes_until(t("24:20")), 10);
    }

    #[test]
    fn from_wall_clock() {
        let time = NaiveTime::from_hms_opt(14, 32, 59).unwrap();
        assert_eq!(ClockTime::from_naive_time(time), t("14:32"));
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&t("08:15")).unwrap();
        assert_eq!(json, "\"08:15\"");

        let back: ClockTime = serde_json::from_str("\"8:15\"").unwrap();
        assert_eq!(back, t("08:15"));

        assert!(serde_json::from_str::<ClockTime>("\"noon\"").is_err());
    }

    #[test]
    fn column_keeps_alignment() {
        let column = parse_time_column(&["07:00", "", "bad", "7:30"]);
        assert_eq!(column, vec![Some(t("07:00")), None, None, Some(t("07:30"))]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_time()(hour in 0u32..24, minute in 0u32..60) -> String {
            format!("{:02}:{:02}", hour, minute)
        }
    }

    proptest! {
        #[test]
        fn valid_hhmm_parses(time_str in valid_time()) {
            prop_assert!(ClockTime::parse_hhmm(&time_str).is_ok());
        }

        #[test]
        fn parse_display_roundtrip(time_str in valid_time()) {
            let parsed = ClockTime::parse_hhmm(&time_str).unwrap();
            prop_assert_eq!(parsed.to_string(), time_str);
        }

        #[test]
        fn invalid_minute_rejected(hour in 0u32..24, minute in 60u32..100) {
            let s = format!("{:02}:{:02}", hour, minute);
            prop_assert!(ClockTime::parse_hhmm(&s).is_err());
        }

        #[test]
        fn minutes_until_within_a_day(a in 0u32..2 * MINUTES_PER_DAY, b in 0u32..2 * MINUTES_PER_DAY) {
            let a = ClockTime::from_minutes(a);
            let b = ClockTime::from_minutes(b);
            let d = a.minutes_until(b);
            prop_assert!(d < MINUTES_PER_DAY);
            prop_assert_eq!(
                (a.as_minutes() + d) % MINUTES_PER_DAY,
                b.as_minutes() % MINUTES_PER_DAY
            );
        }
    }
}
