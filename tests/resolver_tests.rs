use approx::assert_abs_diff_eq;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use task_analyzer::{
    BusinessCalendar, TaskRecord, resolve, resolve_interval, resolve_records, snap_end, snap_start,
};

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn full_working_day_is_one() {
    let cal = BusinessCalendar::default();
    // 2024-01-02 is a Tuesday
    let days = resolve("2024-01-02 09:30", "2024-01-02 18:30", &cal).unwrap();
    assert_abs_diff_eq!(days, 1.0, epsilon = 1e-9);
}

#[test]
fn friday_evening_to_monday_morning() {
    let cal = BusinessCalendar::default();
    // Monday 09:00 snaps back to Friday 18:30
    let days = resolve("2024-01-05 17:00", "2024-01-08 09:00", &cal).unwrap();
    assert_abs_diff_eq!(days, 1.5 / 9.0, epsilon = 1e-9);
}

#[test]
fn excluded_date_removes_exactly_one_day() {
    let mut cal = BusinessCalendar::default();
    let plain = resolve("2024-01-08 09:30", "2024-01-12 18:30", &cal).unwrap();
    assert_abs_diff_eq!(plain, 5.0, epsilon = 1e-9);

    cal.exclude(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    let with_holiday = resolve("2024-01-08 09:30", "2024-01-12 18:30", &cal).unwrap();
    assert_abs_diff_eq!(plain - with_holiday, 1.0, epsilon = 1e-9);
}

#[test]
fn unparseable_side_is_undefined() {
    let cal = BusinessCalendar::default();
    assert_eq!(resolve("not-a-date", "2024-01-02 18:30", &cal), None);
    assert_eq!(resolve("2024-01-02 09:30", "", &cal), None);
}

#[test]
fn inverted_interval_is_zero() {
    let cal = BusinessCalendar::default();
    assert_eq!(resolve("2024-01-03 10:00", "2024-01-02 10:00", &cal), Some(0.0));
    assert_eq!(resolve("2024-01-03 10:00", "2024-01-03 10:00", &cal), Some(0.0));
}

#[test]
fn zero_length_window_resolves_to_zero() {
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let cal = BusinessCalendar::new(nine, nine);
    assert_eq!(resolve("2024-01-02 08:00", "2024-01-09 17:00", &cal), Some(0.0));
}

#[test]
fn weekend_only_interval_is_zero() {
    let cal = BusinessCalendar::default();
    assert_eq!(resolve("2024-01-06 10:00", "2024-01-07 15:00", &cal), Some(0.0));
}

#[test]
fn time_before_opening_counts_from_opening() {
    let cal = BusinessCalendar::default();
    let days = resolve("2024-01-02 07:00", "2024-01-02 12:00", &cal).unwrap();
    assert_abs_diff_eq!(days, 2.5 / 9.0, epsilon = 1e-9);
}

#[test]
fn mixed_layouts_resolve_together() {
    let cal = BusinessCalendar::default();
    let days = resolve("02/01/2024 09:30 AM", "2024-01-02 18:30:00", &cal).unwrap();
    assert_abs_diff_eq!(days, 1.0, epsilon = 1e-9);
}

#[test]
fn created_at_closing_rolls_to_next_morning() {
    let cal = BusinessCalendar::default();
    assert_eq!(
        snap_start(dt(2024, 1, 2, 18, 30), &cal),
        Some(dt(2024, 1, 3, 9, 30))
    );
    // Friday after hours lands on Monday
    assert_eq!(
        snap_start(dt(2024, 1, 5, 20, 0), &cal),
        Some(dt(2024, 1, 8, 9, 30))
    );
}

#[test]
fn completed_at_opening_rolls_to_previous_evening() {
    let cal = BusinessCalendar::default();
    assert_eq!(
        snap_end(dt(2024, 1, 3, 9, 30), &cal),
        Some(dt(2024, 1, 2, 18, 30))
    );
    assert_eq!(
        snap_end(dt(2024, 1, 3, 22, 0), &cal),
        Some(dt(2024, 1, 3, 18, 30))
    );
}

#[test]
fn snapping_skips_excluded_dates() {
    let mut cal = BusinessCalendar::default();
    cal.exclude(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    // Saturday, Sunday, then the excluded Monday
    assert_eq!(
        snap_start(dt(2024, 1, 6, 12, 0), &cal),
        Some(dt(2024, 1, 9, 9, 30))
    );
}

#[test]
fn snap_end_skips_weekend_and_excluded_friday() {
    let mut cal = BusinessCalendar::default();
    cal.exclude(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    // Monday before hours, back over Sunday, Saturday and the excluded Friday
    assert_eq!(
        snap_end(dt(2024, 1, 8, 9, 0), &cal),
        Some(dt(2024, 1, 4, 18, 30))
    );
    let days = resolve("2024-01-04 17:00", "2024-01-08 09:00", &cal).unwrap();
    assert_abs_diff_eq!(days, 1.5 / 9.0, epsilon = 1e-9);
}

#[test]
fn interval_on_parsed_values_matches_text_form() {
    let cal = BusinessCalendar::default();
    let from_values = resolve_interval(dt(2024, 1, 2, 11, 0), dt(2024, 1, 4, 15, 0), &cal);
    let from_text = resolve("2024-01-02 11:00", "2024-01-04 15:00", &cal);
    assert_eq!(from_values, from_text);
    // 7.5h + 9h + 5.5h
    assert_abs_diff_eq!(from_values.unwrap(), 22.0 / 9.0, epsilon = 1e-9);
}

#[test]
fn batch_keeps_input_order() {
    let cal = BusinessCalendar::default();
    let records: Vec<TaskRecord> = (0..200)
        .map(|i| {
            if i % 3 == 0 {
                TaskRecord::new("garbage", "2024-01-02 18:30", "p", "c")
            } else if i % 3 == 1 {
                TaskRecord::new("2024-01-02 09:30", "2024-01-02 18:30", "p", "c")
            } else {
                TaskRecord::new("2024-01-05 17:00", "2024-01-08 09:00", "p", "c")
            }
        })
        .collect();

    let durations = resolve_records(&records, &cal);
    assert_eq!(durations.len(), records.len());
    for (i, duration) in durations.iter().enumerate() {
        match i % 3 {
            0 => assert_eq!(*duration, None),
            1 => assert_abs_diff_eq!(duration.unwrap(), 1.0, epsilon = 1e-9),
            _ => assert_abs_diff_eq!(duration.unwrap(), 1.5 / 9.0, epsilon = 1e-9),
        }
    }
}
