use chrono::NaiveDate;

use crate::calendar::BusinessCalendar;

/// Get all working days in a date range (both ends inclusive)
pub fn working_days_in_range(
    start: NaiveDate,
    end: NaiveDate,
    calendar: &BusinessCalendar,
) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| calendar.is_working_day(*date))
        .collect()
}

/// Count working days in a date range (both ends inclusive)
pub fn count_working_days(start: NaiveDate, end: NaiveDate, calendar: &BusinessCalendar) -> i64 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| calendar.is_working_day(*date))
        .count() as i64
}

/// Working hours available between `start` and `end` inclusive.
///
/// Zero for an inverted range or a calendar without positive daily hours.
pub fn capacity(start: NaiveDate, end: NaiveDate, calendar: &BusinessCalendar) -> f64 {
    let hours_per_day = calendar.working_hours_per_day();
    if end < start || hours_per_day <= 0.0 {
        return 0.0;
    }
    count_working_days(start, end, calendar) as f64 * hours_per_day
}
