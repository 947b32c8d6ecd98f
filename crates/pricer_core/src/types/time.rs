//! Dates and day counts.
//!
//! The Monte Carlo core works in year fractions. Dates only appear at the
//! edges: a [`Date`] valuation date on the pricing context, exercise and
//! fixing dates on instruments, and a [`DayCountConvention`] turning the gap
//! between them into the mandatory times of a time grid.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::{Date, DayCountConvention};
//!
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2024, 7, 1).unwrap();
//!
//! let yf = DayCountConvention::Act365Fixed.year_fraction(start, end);
//! assert!((yf - 182.0 / 365.0).abs() < 1e-12);
//! ```

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Calendar date backed by `chrono::NaiveDate`.
///
/// Serialises as an ISO 8601 string.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let later = date.add_days(10);
/// assert_eq!(later - date, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a date from year, month and day.
    ///
    /// Returns `DateError::InvalidDate` for impossible components.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses an ISO 8601 date (`YYYY-MM-DD`).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(format!("{s}: {e}")))
    }

    /// Returns the date `days` calendar days later (earlier if negative).
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Returns the wrapped `NaiveDate`.
    #[inline]
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Year component.
    #[inline]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month component (1-12).
    #[inline]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day-of-month component.
    #[inline]
    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl Sub for Date {
    type Output = i64;

    /// Signed number of calendar days between two dates.
    fn sub(self, rhs: Self) -> i64 {
        (self.0 - rhs.0).num_days()
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Day count convention used to convert dates into year fractions.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DayCountConvention {
    /// Actual/365 Fixed: actual_days / 365.0
    #[default]
    Act365Fixed,

    /// Actual/360: actual_days / 360.0
    Act360,

    /// 30/360 US bond basis
    Thirty360,
}

impl DayCountConvention {
    /// Standard convention name.
    ///
    /// ```
    /// use pricer_core::types::DayCountConvention;
    ///
    /// assert_eq!(DayCountConvention::Act365Fixed.name(), "ACT/365F");
    /// assert_eq!(DayCountConvention::Thirty360.name(), "30/360");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Thirty360 => "30/360",
        }
    }

    /// Year fraction between two dates.
    ///
    /// Negative when `end` precedes `start`, so callers can detect dates
    /// that lie before the valuation date.
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCountConvention::Act365Fixed => (end - start) as f64 / 365.0,
            DayCountConvention::Act360 => (end - start) as f64 / 360.0,
            DayCountConvention::Thirty360 => {
                let (a, b, sign) = if start <= end {
                    (start, end, 1.0)
                } else {
                    (end, start, -1.0)
                };
                let d1 = if a.day() == 31 { 30 } else { a.day() };
                let d2 = if b.day() == 31 && d1 == 30 { 30 } else { b.day() };
                let days = 360 * (b.year() - a.year())
                    + 30 * (b.month() as i32 - a.month() as i32)
                    + (d2 as i32 - d1 as i32);
                sign * days as f64 / 360.0
            }
        }
    }
}

impl FromStr for DayCountConvention {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACT/365F" | "ACT/365" | "ACT365" => Ok(DayCountConvention::Act365Fixed),
            "ACT/360" | "ACT360" => Ok(DayCountConvention::Act360),
            "30/360" | "30360" => Ok(DayCountConvention::Thirty360),
            _ => Err(DateError::ParseError(format!("unknown day count: {s}"))),
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
