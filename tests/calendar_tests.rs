use chrono::{NaiveDate, NaiveTime};
use task_analyzer::{BusinessCalendar, BusinessCalendarConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn default_calendar_is_nine_hours() {
    let cal = BusinessCalendar::default();
    assert_eq!(cal.work_start(), time(9, 30));
    assert_eq!(cal.work_end(), time(18, 30));
    assert_eq!(cal.working_seconds_per_day(), 9 * 3600);
    assert_eq!(cal.working_hours_per_day(), 9.0);
}

#[test]
fn weekends_never_work_even_when_not_excluded() {
    let cal = BusinessCalendar::default();
    // 2024-01-06 is a Saturday, 2024-01-07 is a Sunday
    assert!(!cal.is_working_day(date(2024, 1, 6)));
    assert!(!cal.is_working_day(date(2024, 1, 7)));
    assert!(cal.is_working_day(date(2024, 1, 8)));
}

#[test]
fn exclude_and_include_toggle_a_weekday() {
    let mut cal = BusinessCalendar::default();
    let wed = date(2024, 1, 10);
    cal.exclude(wed);
    assert!(!cal.is_working_day(wed));
    assert!(cal.include(wed));
    assert!(cal.is_working_day(wed));
    assert!(!cal.include(wed), "second include reports nothing was removed");
}

#[test]
fn hours_window_is_half_open() {
    let cal = BusinessCalendar::default();
    assert!(cal.is_within_hours(time(9, 30)));
    assert!(cal.is_within_hours(time(18, 29)));
    assert!(!cal.is_within_hours(time(18, 30)));
    assert!(!cal.is_within_hours(time(9, 29)));
}

#[test]
fn inverted_or_equal_hours_have_zero_capacity() {
    let equal = BusinessCalendar::new(time(9, 0), time(9, 0));
    let inverted = BusinessCalendar::new(time(18, 0), time(9, 0));
    for cal in [equal, inverted] {
        assert!(cal.is_degenerate());
        assert_eq!(cal.working_seconds_per_day(), 0);
        assert_eq!(cal.working_hours_per_day(), 0.0);
    }
}

#[test]
fn config_accepts_short_times_and_round_trips() {
    let raw = r#"{"work_start":"08:00","work_end":"17:00","excluded_dates":["2024-01-12","2024-01-10"]}"#;
    let config: BusinessCalendarConfig = serde_json::from_str(raw).unwrap();
    let cal = BusinessCalendar::from_config(&config);
    assert_eq!(cal.working_hours_per_day(), 9.0);
    assert!(!cal.is_working_day(date(2024, 1, 10)));

    let back = cal.to_config();
    assert_eq!(back.excluded_dates, vec![date(2024, 1, 10), date(2024, 1, 12)]);
    let json = serde_json::to_string(&back).unwrap();
    assert!(json.contains("\"08:00:00\""));
    assert_eq!(
        BusinessCalendar::from_config(&serde_json::from_str(&json).unwrap()),
        cal
    );
}

#[test]
fn config_rejects_bad_time() {
    let raw = r#"{"work_start":"nine","work_end":"17:00"}"#;
    assert!(serde_json::from_str::<BusinessCalendarConfig>(raw).is_err());
}
