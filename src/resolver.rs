//! Working-time measurement between two timestamps.
//!
//! Each endpoint is snapped onto the nearest valid working instant (start
//! forward, end backward), then the working seconds strictly between the
//! snapped endpoints are summed day by day and expressed in units of one
//! working day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;

use crate::calendar::BusinessCalendar;
use crate::task::TaskRecord;
use crate::timestamp::parse_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapState {
    NeedsDayCheck(NaiveDateTime),
    NeedsTimeCheck(NaiveDateTime),
    Settled(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Upper bound on state transitions for one endpoint. A run of consecutive
/// non-working days can be at most ~1.4x the excluded-date count plus a
/// weekend, and every skipped day costs at most two transitions.
fn step_budget(calendar: &BusinessCalendar) -> usize {
    4 * (calendar.excluded_dates().len() + 4)
}

fn at(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

fn step(state: SnapState, direction: Direction, calendar: &BusinessCalendar) -> Option<SnapState> {
    let work_start = calendar.work_start();
    let work_end = calendar.work_end();
    let next = match (direction, state) {
        (_, SnapState::Settled(_)) => state,
        (_, SnapState::NeedsDayCheck(dt)) if calendar.is_working_day(dt.date()) => {
            SnapState::NeedsTimeCheck(dt)
        }
        (Direction::Forward, SnapState::NeedsDayCheck(dt)) => {
            SnapState::NeedsDayCheck(at(dt.date().succ_opt()?, work_start))
        }
        (Direction::Backward, SnapState::NeedsDayCheck(dt)) => {
            SnapState::NeedsDayCheck(at(dt.date().pred_opt()?, work_end))
        }
        (Direction::Forward, SnapState::NeedsTimeCheck(dt)) => {
            if dt.time() < work_start {
                SnapState::Settled(at(dt.date(), work_start))
            } else if dt.time() >= work_end {
                SnapState::NeedsDayCheck(at(dt.date().succ_opt()?, work_start))
            } else {
                SnapState::Settled(dt)
            }
        }
        (Direction::Backward, SnapState::NeedsTimeCheck(dt)) => {
            if dt.time() > work_end {
                SnapState::Settled(at(dt.date(), work_end))
            } else if dt.time() <= work_start {
                SnapState::NeedsDayCheck(at(dt.date().pred_opt()?, work_end))
            } else {
                SnapState::Settled(dt)
            }
        }
    };
    Some(next)
}

fn snap(from: NaiveDateTime, direction: Direction, calendar: &BusinessCalendar) -> Option<NaiveDateTime> {
    if calendar.is_degenerate() {
        return None;
    }
    let mut state = SnapState::NeedsDayCheck(from);
    for _ in 0..step_budget(calendar) {
        if let SnapState::Settled(dt) = state {
            return Some(dt);
        }
        state = step(state, direction, calendar)?;
    }
    match state {
        SnapState::Settled(dt) => Some(dt),
        _ => None,
    }
}

/// Move `created` forward to the first working instant at or after it.
///
/// An instant exactly at `work_end` is outside working hours and rolls over
/// to the next working day's start. Returns `None` for a degenerate calendar
/// or when the walk leaves chrono's date range.
pub fn snap_start(created: NaiveDateTime, calendar: &BusinessCalendar) -> Option<NaiveDateTime> {
    snap(created, Direction::Forward, calendar)
}

/// Move `completed` backward to the last working instant at or before it.
///
/// An instant exactly at `work_start` rolls back to the previous working
/// day's end.
pub fn snap_end(completed: NaiveDateTime, calendar: &BusinessCalendar) -> Option<NaiveDateTime> {
    snap(completed, Direction::Backward, calendar)
}

/// Working seconds inside `[start, end]`, counting each working day's window.
pub fn working_seconds_between(
    start: NaiveDateTime,
    end: NaiveDateTime,
    calendar: &BusinessCalendar,
) -> i64 {
    if end <= start || calendar.is_degenerate() {
        return 0;
    }
    start
        .date()
        .iter_days()
        .take_while(|date| *date <= end.date())
        .filter(|date| calendar.is_working_day(*date))
        .map(|date| {
            let from = start.max(at(date, calendar.work_start()));
            let to = end.min(at(date, calendar.work_end()));
            (to - from).num_seconds().max(0)
        })
        .sum()
}

/// Resolve already-parsed endpoints to a working-day duration.
///
/// `Some(0.0)` for inverted intervals and degenerate calendars. `None` only
/// when snapping runs off the representable date range.
pub fn resolve_interval(
    created: NaiveDateTime,
    completed: NaiveDateTime,
    calendar: &BusinessCalendar,
) -> Option<f64> {
    if completed <= created {
        return Some(0.0);
    }
    let per_day = calendar.working_seconds_per_day();
    if per_day <= 0 {
        return Some(0.0);
    }

    let start = snap_start(created, calendar)?;
    let end = snap_end(completed, calendar)?;
    if start >= end {
        return Some(0.0);
    }

    let seconds = working_seconds_between(start, end, calendar);
    Some(seconds as f64 / per_day as f64)
}

/// Parse both timestamps and resolve them. `None` means the row cannot be
/// computed (either side unparseable).
pub fn resolve(created_at: &str, completed_at: &str, calendar: &BusinessCalendar) -> Option<f64> {
    let created = parse_timestamp(created_at)?;
    let completed = parse_timestamp(completed_at)?;
    resolve_interval(created, completed, calendar)
}

/// Resolve every record in parallel. Output index `i` belongs to `records[i]`.
pub fn resolve_records(records: &[TaskRecord], calendar: &BusinessCalendar) -> Vec<Option<f64>> {
    records
        .par_iter()
        .map(|record| resolve(&record.created_at, &record.completed_at, calendar))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn standard() -> BusinessCalendar {
        BusinessCalendar::default()
    }

    #[test]
    fn settled_state_is_absorbing() {
        let cal = standard();
        let settled = SnapState::Settled(dt(2024, 1, 6, 3, 0));
        assert_eq!(step(settled, Direction::Forward, &cal), Some(settled));
        assert_eq!(step(settled, Direction::Backward, &cal), Some(settled));
    }

    #[test]
    fn weekend_day_check_moves_to_adjacent_day_boundary() {
        let cal = standard();
        // 2024-01-06 is a Saturday
        let sat = SnapState::NeedsDayCheck(dt(2024, 1, 6, 12, 0));
        assert_eq!(
            step(sat, Direction::Forward, &cal),
            Some(SnapState::NeedsDayCheck(dt(2024, 1, 7, 9, 30)))
        );
        assert_eq!(
            step(sat, Direction::Backward, &cal),
            Some(SnapState::NeedsDayCheck(dt(2024, 1, 5, 18, 30)))
        );
    }

    #[test]
    fn time_check_boundaries_follow_half_open_window() {
        let cal = standard();
        let at_end = SnapState::NeedsTimeCheck(dt(2024, 1, 2, 18, 30));
        assert_eq!(
            step(at_end, Direction::Forward, &cal),
            Some(SnapState::NeedsDayCheck(dt(2024, 1, 3, 9, 30)))
        );
        assert_eq!(
            step(at_end, Direction::Backward, &cal),
            Some(SnapState::Settled(dt(2024, 1, 2, 18, 30)))
        );

        let at_start = SnapState::NeedsTimeCheck(dt(2024, 1, 2, 9, 30));
        assert_eq!(
            step(at_start, Direction::Forward, &cal),
            Some(SnapState::Settled(dt(2024, 1, 2, 9, 30)))
        );
        assert_eq!(
            step(at_start, Direction::Backward, &cal),
            Some(SnapState::NeedsDayCheck(dt(2024, 1, 1, 18, 30)))
        );
    }

    #[test]
    fn degenerate_calendar_never_snaps() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let cal = BusinessCalendar::new(nine, nine);
        assert_eq!(snap_start(dt(2024, 1, 2, 10, 0), &cal), None);
        assert_eq!(snap_end(dt(2024, 1, 2, 10, 0), &cal), None);
    }

    #[test]
    fn long_excluded_run_fits_in_step_budget() {
        let mut cal = standard();
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        cal.exclude_all(first.iter_days().take(60));
        let snapped = snap_start(dt(2024, 1, 1, 10, 0), &cal).unwrap();
        // 2024-03-01 is the first day after the excluded run and a Friday
        assert_eq!(snapped, dt(2024, 3, 1, 9, 30));
    }
}
