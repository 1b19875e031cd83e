use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Smallest range holding both dates, whichever comes first.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar years touched by the range, used to look up holiday tables.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Relative date ranges. Weeks start on Monday and "today" is always passed
/// in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

impl fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown date preset '{}'", self.0)
    }
}

impl std::error::Error for UnknownPreset {}

impl DatePreset {
    pub const ALL: [DatePreset; 6] = [
        DatePreset::ThisMonth,
        DatePreset::LastMonth,
        DatePreset::ThisWeek,
        DatePreset::LastWeek,
        DatePreset::Today,
        DatePreset::Yesterday,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::ThisWeek => "this_week",
            DatePreset::LastWeek => "last_week",
            DatePreset::ThisMonth => "this_month",
            DatePreset::LastMonth => "last_month",
        }
    }

    /// The inclusive range this preset covers on `today`. `None` when the
    /// range would start before the earliest representable date.
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        let range = match self {
            DatePreset::Today => DateRange::single(today),
            DatePreset::Yesterday => DateRange::single(today.pred_opt()?),
            DatePreset::ThisWeek => DateRange::new(monday_of(today)?, today),
            DatePreset::LastWeek => {
                let start = monday_of(today)?.checked_sub_days(Days::new(7))?;
                DateRange::new(start, start.checked_add_days(Days::new(6))?)
            }
            DatePreset::ThisMonth => DateRange::new(today.with_day(1)?, today),
            DatePreset::LastMonth => {
                let end = today.with_day(1)?.pred_opt()?;
                DateRange::new(end.with_day(1)?, end)
            }
        };
        Some(range)
    }
}

fn monday_of(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_monday())))
}

impl FromStr for DatePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        DatePreset::ALL
            .into_iter()
            .find(|preset| preset.key() == normalized)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
