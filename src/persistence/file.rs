use super::{AnalyzerError, AnalyzerResult};
use crate::{
    calendar::BusinessCalendarConfig,
    config::ColumnNames,
    holidays::HolidayTable,
    report::{ProductivityReport, ResolutionReport},
    task::TaskRecord,
};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub fn load_tasks_from_csv<P: AsRef<Path>>(
    path: P,
    columns: &ColumnNames,
) -> AnalyzerResult<Vec<TaskRecord>> {
    let file = File::open(path.as_ref())?;
    let records = read_tasks_csv(file, columns)?;
    tracing::info!(
        path = %path.as_ref().display(),
        rows = records.len(),
        "loaded task export"
    );
    Ok(records)
}

/// Read task rows from any CSV source. Header cells are trimmed before they
/// are matched against `columns`; extra columns are ignored.
pub fn read_tasks_csv<R: Read>(source: R, columns: &ColumnNames) -> AnalyzerResult<Vec<TaskRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h.as_str() == name);
    let missing: Vec<String> = columns
        .required()
        .into_iter()
        .filter(|name| position(*name).is_none())
        .map(ToOwned::to_owned)
        .collect();
    if !missing.is_empty() {
        return Err(AnalyzerError::MissingColumns(missing));
    }

    let index = |name: &str| position(name).unwrap_or_default();
    let created_idx = index(columns.created_at.as_str());
    let completed_idx = index(columns.completed_at.as_str());
    let person_idx = index(columns.person.as_str());
    let category_idx = index(columns.category.as_str());

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
        records.push(TaskRecord {
            created_at: cell(created_idx),
            completed_at: cell(completed_idx),
            person: cell(person_idx),
            category: cell(category_idx),
        });
    }
    Ok(records)
}

pub fn load_calendar_config<P: AsRef<Path>>(path: P) -> AnalyzerResult<BusinessCalendarConfig> {
    let file = File::open(path)?;
    let config = serde_json::from_reader(file)?;
    Ok(config)
}

pub fn save_calendar_config<P: AsRef<Path>>(
    config: &BusinessCalendarConfig,
    path: P,
) -> AnalyzerResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

pub fn load_holiday_table<P: AsRef<Path>>(path: P) -> AnalyzerResult<HolidayTable> {
    let file = File::open(path.as_ref())?;
    let table: HolidayTable = serde_json::from_reader(file)?;
    tracing::info!(
        path = %path.as_ref().display(),
        entries = table.entries.len(),
        "loaded holiday table"
    );
    Ok(table)
}

pub fn save_resolution_report_to_json<P: AsRef<Path>>(
    report: &ResolutionReport,
    path: P,
) -> AnalyzerResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

pub fn save_productivity_report_to_json<P: AsRef<Path>>(
    report: &ProductivityReport,
    path: P,
) -> AnalyzerResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

pub fn save_resolution_report_to_csv<P: AsRef<Path>>(
    report: &ResolutionReport,
    path: P,
) -> AnalyzerResult<()> {
    let file = File::create(path)?;
    write_resolution_csv(report, file)
}

/// One row per person plus a team total row; categories become columns.
pub fn write_resolution_csv<W: Write>(report: &ResolutionReport, sink: W) -> AnalyzerResult<()> {
    let mut writer = csv::Writer::from_writer(sink);
    let mut header = vec!["Person".to_string()];
    header.extend(report.categories.iter().cloned());
    header.push("Total Tasks (Player)".to_string());
    header.push("Average Resolution Time (WD)".to_string());
    writer.write_record(&header)?;

    for row in report.people.iter().chain(std::iter::once(&report.team_total)) {
        let mut record = vec![row.person.clone()];
        for category in &report.categories {
            let count = row.category_counts.get(category).copied().unwrap_or(0);
            record.push(count.to_string());
        }
        record.push(row.total_tasks.to_string());
        record.push(format_option_f64(row.average_resolution_wd));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_productivity_report_to_csv<P: AsRef<Path>>(
    report: &ProductivityReport,
    path: P,
) -> AnalyzerResult<()> {
    let file = File::create(path)?;
    write_productivity_csv(report, file)
}

pub fn write_productivity_csv<W: Write>(report: &ProductivityReport, sink: W) -> AnalyzerResult<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record([
        "Person",
        "Total Tasks Completed",
        "Total Time Spent (Minutes)",
        "Available Working Minutes",
        "Productivity (%)",
        "Assessment",
    ])?;
    for row in &report.people {
        writer.write_record([
            row.person.clone(),
            row.total_tasks.to_string(),
            format_f64(row.time_spent_minutes),
            format_f64(row.available_minutes),
            format_f64(row.productivity_pct),
            row.assessment.label().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn format_f64(value: f64) -> String {
    format!("{value:.2}")
}

fn format_option_f64(value: Option<f64>) -> String {
    value.map(format_f64).unwrap_or_default()
}
