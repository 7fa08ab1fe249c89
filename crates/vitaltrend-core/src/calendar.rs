//! Calendar dates, windows and contiguous date ranges
//!
//! Every date in the engine is a pure calendar day. The reference "today" is
//! always passed in; only [`CalendarDate::today`] reads the clock.

use crate::CoreError;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive timestamp layouts accepted by [`CalendarDate::parse_lenient`], tried in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Local date with the time of day truncated.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn days_before(&self, days: u32) -> Option<Self> {
        self.0.checked_sub_days(Days::new(u64::from(days))).map(Self)
    }

    pub fn days_after(&self, days: u32) -> Option<Self> {
        self.0.checked_add_days(Days::new(u64::from(days))).map(Self)
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(&self, earlier: CalendarDate) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }

    /// Date component of a date or timestamp string.
    ///
    /// Offset-carrying timestamps are converted to UTC before the date is
    /// taken; naive timestamps keep their own date.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            return Some(Self(date));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(dt.with_timezone(&Utc).date_naive()));
        }

        NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| Self(dt.date()))
    }

    /// Date component of an epoch timestamp in milliseconds (UTC).
    pub fn from_timestamp_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|dt| Self(dt.date_naive()))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = CoreError;

    /// Strict `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| CoreError::InvalidDate(s.to_string()))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse the `days` selector of the window surface: `"30"` selects 30 days,
/// anything else (missing or invalid) selects the default of 7.
pub fn parse_days_param(raw: Option<&str>) -> u32 {
    raw.and_then(|r| r.trim().parse::<u32>().ok())
        .filter(|days| Window::SUPPORTED_DAYS.contains(days))
        .unwrap_or(Window::DEFAULT_DAYS)
}

/// `days` consecutive calendar days ending at `end_date` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    days: u32,
    start_date: CalendarDate,
    end_date: CalendarDate,
}

impl Window {
    pub const DEFAULT_DAYS: u32 = 7;
    pub const SUPPORTED_DAYS: [u32; 2] = [7, 30];

    pub fn new(days: u32, end_date: CalendarDate) -> Result<Self, CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidWindow(days));
        }
        let start_date = end_date
            .days_before(days - 1)
            .ok_or(CoreError::InvalidWindow(days))?;
        Ok(Self {
            days,
            start_date,
            end_date,
        })
    }

    pub fn ending_today(days: u32) -> Result<Self, CoreError> {
        Self::new(days, CalendarDate::today())
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn start(&self) -> CalendarDate {
        self.start_date
    }

    pub fn end(&self) -> CalendarDate {
        self.end_date
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn calendar(&self) -> Result<Vec<CalendarDate>, CoreError> {
        build_calendar(self.end_date, self.days)
    }
}

/// Build the contiguous calendar `[reference - (days-1) ..= reference]`.
///
/// The result always has exactly `days` entries; any other length is a
/// calendar-arithmetic defect and is reported instead of returned.
pub fn build_calendar(reference: CalendarDate, days: u32) -> Result<Vec<CalendarDate>, CoreError> {
    if days == 0 {
        return Err(CoreError::InvalidWindow(days));
    }
    let start = reference
        .days_before(days - 1)
        .ok_or(CoreError::InvalidWindow(days))?;

    let dates: Vec<CalendarDate> = start
        .0
        .iter_days()
        .take_while(|d| *d <= reference.0)
        .map(CalendarDate)
        .collect();

    check_calendar_length(days, dates)
}

fn check_calendar_length(
    expected: u32,
    dates: Vec<CalendarDate>,
) -> Result<Vec<CalendarDate>, CoreError> {
    if dates.len() != expected as usize {
        tracing::error!(
            expected,
            actual = dates.len(),
            "calendar length does not match requested window"
        );
        return Err(CoreError::CalendarLength {
            expected,
            actual: dates.len(),
        });
    }
    Ok(dates)
}
