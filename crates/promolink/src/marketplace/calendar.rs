//! UTC calendar helpers behind the "this week" / "this month" list filters.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed interval of instants; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Whole-day range from `first` 00:00:00.000 to `last` 23:59:59.999.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        ranges_overlap(self.start, self.end, other.start, other.end)
    }
}

/// Relative list filter accepted by offer and request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub fn range_at(self, now: DateTime<Utc>) -> DateRange {
        match self {
            Period::Week => week_range_at(now),
            Period::Month => month_range_at(now),
        }
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// `now` truncated to UTC midnight.
pub fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now.date_naive())
}

pub fn current_week_range() -> DateRange {
    week_range_at(Utc::now())
}

/// Monday 00:00:00.000 through the following Sunday 23:59:59.999. A Sunday belongs to the
/// week that started six days earlier.
pub fn week_range_at(now: DateTime<Utc>) -> DateRange {
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    DateRange::days(monday, monday + Duration::days(6))
}

pub fn current_month_range() -> DateRange {
    month_range_at(Utc::now())
}

pub fn month_range_at(now: DateTime<Utc>) -> DateRange {
    let today = now.date_naive();
    let first = today - Duration::days(i64::from(today.day0()));
    let length = days_in_month(first.year(), first.month());
    DateRange::days(first, first + Duration::days(i64::from(length) - 1))
}

/// Length of `month`: the day before the first of the following month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Inclusive overlap: ranges that only touch at a boundary still overlap.
pub fn ranges_overlap<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start <= b_end && a_end >= b_start
}
