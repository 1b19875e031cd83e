use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Working-hours window and excluded dates used to measure elapsed work time.
///
/// Saturday and Sunday are never working days; `excluded_dates` only needs to
/// carry holidays. A calendar whose `work_end` is not after `work_start` is
/// accepted but has zero capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessCalendar {
    work_start: NaiveTime,
    work_end: NaiveTime,
    excluded_dates: HashSet<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendarConfig {
    #[serde(with = "time_of_day")]
    pub work_start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub work_end: NaiveTime,
    #[serde(default)]
    pub excluded_dates: Vec<NaiveDate>,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORK_START, Self::DEFAULT_WORK_END)
    }
}

impl BusinessCalendar {
    pub const DEFAULT_WORK_START: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
        Some(time) => time,
        None => NaiveTime::MIN,
    };
    pub const DEFAULT_WORK_END: NaiveTime = match NaiveTime::from_hms_opt(18, 30, 0) {
        Some(time) => time,
        None => NaiveTime::MIN,
    };

    pub fn new(work_start: NaiveTime, work_end: NaiveTime) -> Self {
        Self {
            work_start,
            work_end,
            excluded_dates: HashSet::new(),
        }
    }

    pub fn with_excluded_dates<I>(work_start: NaiveTime, work_end: NaiveTime, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            work_start,
            work_end,
            excluded_dates: dates.into_iter().collect(),
        }
    }

    pub fn from_config(config: &BusinessCalendarConfig) -> Self {
        Self::with_excluded_dates(
            config.work_start,
            config.work_end,
            config.excluded_dates.iter().copied(),
        )
    }

    pub fn to_config(&self) -> BusinessCalendarConfig {
        BusinessCalendarConfig::from(self)
    }

    pub fn work_start(&self) -> NaiveTime {
        self.work_start
    }

    pub fn work_end(&self) -> NaiveTime {
        self.work_end
    }

    pub fn set_hours(&mut self, work_start: NaiveTime, work_end: NaiveTime) {
        self.work_start = work_start;
        self.work_end = work_end;
    }

    pub fn excluded_dates(&self) -> &HashSet<NaiveDate> {
        &self.excluded_dates
    }

    /// Mark a single date as non-working
    pub fn exclude(&mut self, date: NaiveDate) {
        self.excluded_dates.insert(date);
    }

    /// Add multiple excluded dates at once
    pub fn exclude_all<I>(&mut self, dates: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.excluded_dates.extend(dates);
    }

    /// Treat a previously excluded date as a normal workday again.
    /// Returns whether the date had been excluded.
    pub fn include(&mut self, date: NaiveDate) -> bool {
        self.excluded_dates.remove(&date)
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !Self::is_weekend(date) && !self.excluded_dates.contains(&date)
    }

    pub fn is_within_hours(&self, time: NaiveTime) -> bool {
        self.work_start <= time && time < self.work_end
    }

    pub fn is_degenerate(&self) -> bool {
        self.work_end <= self.work_start
    }

    pub fn working_seconds_per_day(&self) -> i64 {
        if self.is_degenerate() {
            0
        } else {
            (self.work_end - self.work_start).num_seconds()
        }
    }

    pub fn working_hours_per_day(&self) -> f64 {
        self.working_seconds_per_day() as f64 / 3600.0
    }
}

impl Default for BusinessCalendarConfig {
    fn default() -> Self {
        BusinessCalendarConfig::from(&BusinessCalendar::default())
    }
}

impl From<&BusinessCalendar> for BusinessCalendarConfig {
    fn from(calendar: &BusinessCalendar) -> Self {
        let excluded: BTreeSet<NaiveDate> = calendar.excluded_dates.iter().copied().collect();
        Self {
            work_start: calendar.work_start,
            work_end: calendar.work_end,
            excluded_dates: excluded.into_iter().collect(),
        }
    }
}

/// `HH:MM` or `HH:MM:SS` on input, `HH:MM:SS` on output.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(text: &str) -> Option<NaiveTime> {
        let text = text.trim();
        NaiveTime::parse_from_str(text, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time of day '{raw}'")))
    }
}
