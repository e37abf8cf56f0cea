//! Calendar host types for DATE, TIME and DATETIME columns.
//!
//! Values are stored as plain integers (days since the Unix epoch,
//! microseconds since midnight, microseconds since the epoch) and converted
//! with the proleptic Gregorian civil-date algorithm, so no calendar crate
//! is needed for the formats the casters produce and accept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValueErrorKind};

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// Convert days since 1970-01-01 to (year, month, day).
pub fn days_to_ymd(days: i32) -> (i32, u32, u32) {
    // Shift the epoch to 0000-03-01 so leap days fall at the end of a year.
    let z = days + 719_468;
    let era = if z >= 0 { z / 146_097 } else { (z - 146_096) / 146_097 };
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i32 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Convert (year, month, day) to days since 1970-01-01.
pub fn ymd_to_days(year: i32, month: u32, day: u32) -> i32 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y / 400 } else { (y - 399) / 400 };
    let yoe = (y - era * 400) as u32;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i32 - 719_468
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 0,
    }
}

fn conversion_error(expected: &str, input: &str) -> Error {
    Error::value(
        ValueErrorKind::Conversion,
        format!("'{}' is not a valid {}", input, expected),
    )
}

fn parse_number(part: &str, expected: &str, input: &str) -> Result<u32, Error> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(conversion_error(expected, input));
    }
    part.parse().map_err(|_| conversion_error(expected, input))
}

/// A calendar date, stored as days since 1970-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date(pub i32);

impl Date {
    /// Build a date from its calendar parts, rejecting impossible days.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Date(ymd_to_days(year, month, day)))
    }

    /// Days since the Unix epoch.
    pub const fn days(self) -> i32 {
        self.0
    }

    pub fn ymd(self) -> (i32, u32, u32) {
        days_to_ymd(self.0)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, m, d) = self.ymd();
        write!(f, "{:04}-{:02}-{:02}", y, m, d)
    }
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '-');
        let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(conversion_error("date", s));
        };
        let year = parse_number(y, "date", s)? as i32;
        let month = parse_number(m, "date", s)?;
        let day = parse_number(d, "date", s)?;
        Date::from_ymd(year, month, day).ok_or_else(|| conversion_error("date", s))
    }
}

/// A time of day, stored as microseconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time(pub i64);

impl Time {
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        let secs = i64::from(hour) * 3600 + i64::from(minute) * 60 + i64::from(second);
        Some(Time(secs * MICROS_PER_SECOND))
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    fn hms(self) -> (i64, i64, i64) {
        let secs = self.0.div_euclid(MICROS_PER_SECOND);
        (secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{:02}:{:02}:{:02}", h, m, s)
    }
}

impl FromStr for Time {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Fractional seconds are accepted and truncated.
        let whole = s.trim().split('.').next().unwrap_or_default();
        let mut parts = whole.splitn(3, ':');
        let (Some(h), Some(m), Some(sec)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(conversion_error("time", s));
        };
        Time::from_hms(
            parse_number(h, "time", s)?,
            parse_number(m, "time", s)?,
            parse_number(sec, "time", s)?,
        )
        .ok_or_else(|| conversion_error("time", s))
    }
}

/// A date and time without zone, stored as microseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        let date = Date::from_ymd(year, month, day)?;
        let time = Time::from_hms(hour, minute, second)?;
        Some(Timestamp::from_parts(date, time))
    }

    pub fn from_parts(date: Date, time: Time) -> Self {
        Timestamp(i64::from(date.0) * MICROS_PER_DAY + time.0)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    pub fn date(self) -> Date {
        Date(self.0.div_euclid(MICROS_PER_DAY) as i32)
    }

    pub fn time(self) -> Time {
        Time(self.0.rem_euclid(MICROS_PER_DAY))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date(), self.time())
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    /// Accepts `YYYY-MM-DD HH:MM:SS`, the ISO `T` separator, and a bare date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (date, time) = match trimmed.split_once([' ', 'T']) {
            Some((date, time)) => (date, Some(time)),
            None => (trimmed, None),
        };
        let date: Date = date.parse().map_err(|_| conversion_error("datetime", s))?;
        let time = match time {
            Some(t) => t
                .trim_end_matches('Z')
                .parse()
                .map_err(|_| conversion_error("datetime", s))?,
            None => Time(0),
        };
        Ok(Timestamp::from_parts(date, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civil_round_trip_known_dates() {
        assert_eq!(days_to_ymd(0), (1970, 1, 1));
        assert_eq!(ymd_to_days(2000, 3, 1), 11_017);
        assert_eq!(days_to_ymd(11_017), (2000, 3, 1));
        assert_eq!(days_to_ymd(-1), (1969, 12, 31));
    }

    #[test]
    fn test_date_rejects_impossible_day() {
        assert!(Date::from_ymd(2023, 2, 29).is_none());
        assert!(Date::from_ymd(2024, 2, 29).is_some());
        assert!("2024-13-01".parse::<Date>().is_err());
    }

    #[test]
    fn test_timestamp_format_and_parse() {
        let ts = Timestamp::from_ymd_hms(2024, 5, 17, 8, 4, 59).unwrap();
        assert_eq!(ts.to_string(), "2024-05-17 08:04:59");
        assert_eq!("2024-05-17 08:04:59".parse::<Timestamp>().unwrap(), ts);
        assert_eq!("2024-05-17T08:04:59Z".parse::<Timestamp>().unwrap(), ts);
    }

    #[test]
    fn test_timestamp_before_epoch() {
        let ts = Timestamp::from_ymd_hms(1969, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(ts.to_string(), "1969-12-31 23:59:58");
    }

    #[test]
    fn test_time_truncates_fraction() {
        let t: Time = "10:11:12.345".parse().unwrap();
        assert_eq!(t.to_string(), "10:11:12");
    }
}
