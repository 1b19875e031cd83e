pub mod calendar;
pub mod capacity;
pub mod config;
pub mod filter;
pub mod holidays;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod period;
pub mod persistence;
pub mod report;
pub mod resolver;
pub mod task;
pub mod timestamp;

pub use calendar::{BusinessCalendar, BusinessCalendarConfig};
pub use capacity::{capacity, count_working_days, working_days_in_range};
pub use config::{AnalyzerConfig, ColumnNames};
pub use filter::{DEFAULT_EXCLUDED_CATEGORY, RecordFilter};
pub use holidays::{HolidayEntry, HolidayTable, Jurisdiction, MalaysianState};
pub use period::{DatePreset, DateRange};
pub use persistence::{
    AnalyzerError, AnalyzerResult, DatasetCache, DatasetKey, load_calendar_config,
    load_holiday_table, load_tasks_from_csv, read_tasks_csv, save_calendar_config,
    save_productivity_report_to_csv, save_productivity_report_to_json,
    save_resolution_report_to_csv, save_resolution_report_to_json,
};
pub use report::{
    Analysis, Assessment, PersonProductivity, PersonResolution, ProductivityMethod,
    ProductivityReport, ResolutionReport,
};
pub use resolver::{resolve, resolve_interval, resolve_records, snap_end, snap_start};
pub use task::TaskRecord;
pub use timestamp::parse_timestamp;
