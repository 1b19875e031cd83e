use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use task_analyzer::calendar::time_of_day;
use task_analyzer::{
    AnalyzerConfig, AnalyzerError, Analysis, BusinessCalendar, DatePreset, DateRange, HolidayTable,
    Jurisdiction, ProductivityMethod, ProductivityReport, RecordFilter, ResolutionReport,
    TaskRecord, capacity, count_working_days, load_calendar_config, load_holiday_table,
    load_tasks_from_csv, parse_timestamp, resolve_interval, save_calendar_config, save_productivity_report_to_csv, save_productivity_report_to_json,
    save_resolution_report_to_csv, save_resolution_report_to_json,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "task-analyzer", about = "Working-day resolution and productivity reports")]
struct Args {
    /// Analyzer settings (calendar, column names, holidays) as JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Task export to load on start-up
    #[arg(long)]
    data: Option<PathBuf>,
    /// Anchor for relative date ranges; defaults to the local date
    #[arg(long)]
    today: Option<NaiveDate>,
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if ci < widths.len() && cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, w) in widths.iter().enumerate() {
            let cell = cells.get(ci).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(w.saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn fmt2(value: f64) -> String {
    format!("{value:.2}")
}

fn render_resolution(report: &ResolutionReport) -> String {
    let mut headers = vec!["Person".to_string()];
    headers.extend(report.categories.iter().cloned());
    headers.push("Total Tasks (Player)".to_string());
    headers.push("Average Resolution Time (WD)".to_string());

    let rows: Vec<Vec<String>> = report
        .people
        .iter()
        .chain(std::iter::once(&report.team_total))
        .map(|row| {
            let mut cells = vec![row.person.clone()];
            cells.extend(
                report
                    .categories
                    .iter()
                    .map(|c| row.category_counts.get(c).copied().unwrap_or(0).to_string()),
            );
            cells.push(row.total_tasks.to_string());
            cells.push(row.average_resolution_wd.map(fmt2).unwrap_or_else(|| "-".to_string()));
            cells
        })
        .collect();
    render_table(&headers, &rows)
}

fn render_productivity(report: &ProductivityReport) -> String {
    let headers: Vec<String> = [
        "Person",
        "Total Tasks Completed",
        "Total Time Spent (Minutes)",
        "Available Working Minutes",
        "Productivity (%)",
        "Assessment",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let rows: Vec<Vec<String>> = report
        .people
        .iter()
        .map(|row| {
            vec![
                row.person.clone(),
                row.total_tasks.to_string(),
                fmt2(row.time_spent_minutes),
                fmt2(row.available_minutes),
                fmt2(row.productivity_pct),
                row.assessment.label().to_string(),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <csv>                         Load a task export\n  calendar show                      Show working hours and excluded dates\n  calendar hours <HH:MM> <HH:MM>     Set the working-hours window\n  calendar exclude <YYYY-MM-DD>      Mark a date as non-working\n  calendar include <YYYY-MM-DD>      Make an excluded date a workday again\n  calendar set <json>                Replace the calendar from a file\n  calendar save <json>               Write the calendar to a file\n  holidays <json> [jurisdiction]     Exclude table holidays inside the active range\n  range <preset>                     this_month, last_month, this_week, last_week, today, yesterday\n  range custom <start> <end>         Explicit inclusive date range\n  today <YYYY-MM-DD>                 Anchor for relative ranges\n  filter exclude <category|none>     Category dropped before reporting\n  filter persons <csv>               Only these persons\n  filter categories <csv>            Only these categories\n  filter clear                       Reset person and category filters\n  resolve <created> | <completed>    Working days between two timestamps\n  capacity                           Working days and hours in the range\n  report resolution                  Per-person resolution report\n  report productivity [standard <minutes>]\n                                     Per-person productivity report\n  save <resolution|productivity> <json|csv> <path>\n                                     Write a report to a file\n  quit|exit                          Exit"
    );
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn parse_csv_set(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

struct Session {
    config: AnalyzerConfig,
    calendar: BusinessCalendar,
    holidays: Option<HolidayTable>,
    dataset: Vec<TaskRecord>,
    today: NaiveDate,
    range: DateRange,
    persons: Option<BTreeSet<String>>,
    categories: Option<BTreeSet<String>>,
    exclude_category: Option<String>,
    method: ProductivityMethod,
}

impl Session {
    fn new(config: AnalyzerConfig, today: NaiveDate) -> Self {
        let calendar = BusinessCalendar::from_config(&config.calendar);
        let exclude_category = config.exclude_category.clone();
        Self {
            config,
            calendar,
            holidays: None,
            dataset: Vec::new(),
            today,
            range: DatePreset::ThisMonth
                .range(today)
                .unwrap_or(DateRange::single(today)),
            persons: None,
            categories: None,
            exclude_category,
            method: ProductivityMethod::Actual,
        }
    }

    fn filter(&self) -> RecordFilter {
        RecordFilter {
            range: self.range,
            persons: self.persons.clone(),
            categories: self.categories.clone(),
            exclude_category: self.exclude_category.clone(),
        }
    }

    /// The calendar with holiday-table dates inside `range` excluded.
    fn calendar_for(&self, range: DateRange) -> Cow<'_, BusinessCalendar> {
        match &self.holidays {
            Some(table) => {
                Cow::Owned(table.apply(&self.calendar, range, &self.config.jurisdiction))
            }
            None => Cow::Borrowed(&self.calendar),
        }
    }

    fn analysis(&self) -> Result<Analysis, String> {
        if self.dataset.is_empty() {
            return Err("No dataset loaded. Use: load <csv>".to_string());
        }
        if self.range.is_empty() {
            return Err(format!("Range end precedes start ({}).", self.range));
        }
        let calendar = self.calendar_for(self.range);
        Ok(Analysis::run(&self.dataset, &self.filter(), &calendar))
    }

    fn load(&mut self, path: &str) {
        match load_tasks_from_csv(path, &self.config.columns) {
            Ok(records) => {
                println!("Loaded {} rows from {}.", records.len(), path);
                self.dataset = records;
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    fn show_calendar(&self) {
        let config = self.calendar.to_config();
        println!(
            "Working hours: {} - {} ({} h/day)",
            config.work_start.format("%H:%M"),
            config.work_end.format("%H:%M"),
            fmt2(self.calendar.working_hours_per_day())
        );
        if config.excluded_dates.is_empty() {
            println!("Excluded dates: none");
        } else {
            let dates: Vec<String> = config.excluded_dates.iter().map(|d| d.to_string()).collect();
            println!("Excluded dates ({}): {}", dates.len(), dates.join(", "));
        }
    }

    fn calendar_command(&mut self, args: &[&str]) {
        match args {
            ["show"] | [] => self.show_calendar(),
            ["hours", start, end] => match (time_of_day::parse(start), time_of_day::parse(end)) {
                (Some(start), Some(end)) => {
                    self.calendar.set_hours(start, end);
                    if self.calendar.is_degenerate() {
                        println!("Warning: work end is not after work start; capacity is zero.");
                    }
                    self.show_calendar();
                }
                _ => println!("Invalid time (HH:MM)"),
            },
            ["exclude", date] => match parse_date(date) {
                Some(date) => {
                    self.calendar.exclude(date);
                    println!("Excluded {}.", date);
                }
                None => println!("Invalid date (YYYY-MM-DD)"),
            },
            ["include", date] => match parse_date(date) {
                Some(date) if self.calendar.include(date) => println!("Included {}.", date),
                Some(date) => println!("{} was not excluded.", date),
                None => println!("Invalid date (YYYY-MM-DD)"),
            },
            ["set", path] => match load_calendar_config(path) {
                Ok(config) => {
                    self.calendar = BusinessCalendar::from_config(&config);
                    println!("Calendar loaded from {}.", path);
                    self.show_calendar();
                }
                Err(e) => println!("Error: {}", e),
            },
            ["save", path] => match save_calendar_config(&self.calendar.to_config(), path) {
                Ok(()) => println!("Calendar saved to {}.", path),
                Err(e) => println!("Error: {}", e),
            },
            _ => println!(
                "Usage: calendar show|hours <HH:MM> <HH:MM>|exclude <date>|include <date>|set <json>|save <json>"
            ),
        }
    }

    fn holidays_command(&mut self, args: &[&str]) {
        let Some((path, rest)) = args.split_first() else {
            println!("Usage: holidays <json> [jurisdiction]");
            return;
        };
        let jurisdiction = if rest.is_empty() {
            self.config.jurisdiction
        } else {
            match rest.join(" ").parse::<Jurisdiction>() {
                Ok(j) => j,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            }
        };
        match load_holiday_table(path) {
            Ok(table) => {
                println!(
                    "Loaded {} holidays; {} fall in {} for {}.",
                    table.entries.len(),
                    table.excluded_dates(self.range, &jurisdiction).len(),
                    self.range,
                    jurisdiction
                );
                self.holidays = Some(table);
                self.config.jurisdiction = jurisdiction;
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    fn range_command(&mut self, args: &[&str]) {
        match args {
            ["custom", start, end] => match (parse_date(start), parse_date(end)) {
                (Some(start), Some(end)) if start <= end => {
                    self.range = DateRange::new(start, end);
                    println!("Range: {}", self.range);
                }
                (Some(_), Some(_)) => println!("Range end must not precede start."),
                _ => println!("Invalid date (YYYY-MM-DD)"),
            },
            [] => println!("Range: {}", self.range),
            words => match words.join(" ").parse::<DatePreset>() {
                Ok(preset) => match preset.range(self.today) {
                    Some(range) => {
                        self.range = range;
                        println!("Range ({}): {}", preset.key(), self.range);
                    }
                    None => println!("Preset {} has no range on {}.", preset.key(), self.today),
                },
                Err(e) => println!("Error: {}", e),
            },
        }
    }

    fn filter_command(&mut self, args: &[&str]) {
        match args {
            ["exclude", rest @ ..] if !rest.is_empty() => {
                let category = rest.join(" ");
                if category.eq_ignore_ascii_case("none") {
                    self.exclude_category = None;
                    println!("No category excluded.");
                } else {
                    println!("Excluding category '{}'.", category);
                    self.exclude_category = Some(category);
                }
            }
            ["persons", rest @ ..] if !rest.is_empty() => {
                let set = parse_csv_set(&rest.join(" "));
                println!("Persons: {}", set.iter().cloned().collect::<Vec<_>>().join(", "));
                self.persons = Some(set);
            }
            ["categories", rest @ ..] if !rest.is_empty() => {
                let set = parse_csv_set(&rest.join(" "));
                println!("Categories: {}", set.iter().cloned().collect::<Vec<_>>().join(", "));
                self.categories = Some(set);
            }
            ["clear"] => {
                self.persons = None;
                self.categories = None;
                println!("Filters cleared.");
            }
            _ => println!("Usage: filter exclude <category|none>|persons <csv>|categories <csv>|clear"),
        }
    }

    fn resolve_command(&self, rest: &str) {
        match rest.split_once('|') {
            Some((created, completed)) => {
                let resolved = parse_timestamp(created)
                    .zip(parse_timestamp(completed))
                    .and_then(|(created, completed)| {
                        let range = DateRange::spanning(created.date(), completed.date());
                        resolve_interval(created, completed, &self.calendar_for(range))
                    });
                match resolved {
                    Some(days) => println!("Resolved: {} working days", fmt2(days)),
                    None => println!("Resolved: undefined (unparseable timestamp)"),
                }
            }
            None => println!("Usage: resolve <created> | <completed>"),
        }
    }

    fn capacity_command(&self) {
        let calendar = self.calendar_for(self.range);
        let days = count_working_days(self.range.start, self.range.end, &calendar);
        let hours = capacity(self.range.start, self.range.end, &calendar);
        println!(
            "Range {}: {} working days, {} working hours",
            self.range,
            days,
            fmt2(hours)
        );
    }

    fn method_from(&self, args: &[&str]) -> Result<ProductivityMethod, String> {
        match args {
            [] => Ok(ProductivityMethod::Actual),
            ["actual"] => Ok(ProductivityMethod::Actual),
            ["standard"] => Ok(ProductivityMethod::standard(BTreeMap::new())),
            ["standard", minutes] => match minutes.parse::<f64>() {
                Ok(m) if m >= 0.0 => Ok(ProductivityMethod::Standard {
                    per_category: BTreeMap::new(),
                    default_minutes: m,
                }),
                _ => Err("Invalid minutes".to_string()),
            },
            _ => Err("Usage: report productivity [actual|standard <minutes>]".to_string()),
        }
    }

    fn report_command(&mut self, args: &[&str]) {
        let analysis = match self.analysis() {
            Ok(a) => a,
            Err(msg) => {
                println!("{}", msg);
                return;
            }
        };
        match args {
            ["resolution"] => match analysis.resolution_report() {
                Ok(report) => {
                    println!(
                        "Resolution report for {} ({} rows, {} resolved)\n{}",
                        self.range,
                        report.total_rows,
                        report.valid_rows,
                        render_resolution(&report)
                    );
                }
                Err(e) => println!("Error: {}", e),
            },
            ["productivity", rest @ ..] => {
                let method = match self.method_from(rest) {
                    Ok(m) => m,
                    Err(msg) => {
                        println!("{}", msg);
                        return;
                    }
                };
                match analysis.productivity_report(&method) {
                    Ok(report) => {
                        println!(
                            "Productivity report for {} (available {} h, team of {}, overall {}%)\n{}",
                            self.range,
                            fmt2(analysis.available_hours()),
                            report.team_size,
                            fmt2(report.overall_productivity_pct),
                            render_productivity(&report)
                        );
                        self.method = method;
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            _ => println!("Usage: report resolution|productivity [standard <minutes>]"),
        }
    }

    fn save_command(&self, args: &[&str]) {
        let [kind, format, path] = args else {
            println!("Usage: save <resolution|productivity> <json|csv> <path>");
            return;
        };
        let analysis = match self.analysis() {
            Ok(a) => a,
            Err(msg) => {
                println!("{}", msg);
                return;
            }
        };
        let result = match (*kind, *format) {
            ("resolution", "json") => analysis
                .resolution_report()
                .map_err(AnalyzerError::from)
                .and_then(|r| save_resolution_report_to_json(&r, path)),
            ("resolution", "csv") => analysis
                .resolution_report()
                .map_err(AnalyzerError::from)
                .and_then(|r| save_resolution_report_to_csv(&r, path)),
            ("productivity", "json") => analysis
                .productivity_report(&self.method)
                .map_err(AnalyzerError::from)
                .and_then(|r| save_productivity_report_to_json(&r, path)),
            ("productivity", "csv") => analysis
                .productivity_report(&self.method)
                .map_err(AnalyzerError::from)
                .and_then(|r| save_productivity_report_to_csv(&r, path)),
            _ => {
                println!("Usage: save <resolution|productivity> <json|csv> <path>");
                return;
            }
        };
        match result {
            Ok(()) => println!("Report saved to {}.", path),
            Err(e) => println!("Error: {}", e),
        }
    }

    /// Returns false when the session should end.
    fn handle(&mut self, input: &str) -> bool {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((cmd, args)) = parts.split_first() else {
            return true;
        };
        match *cmd {
            "help" => print_help(),
            "quit" | "exit" => return false,
            "load" => match args {
                [path] => self.load(path),
                _ => println!("Usage: load <csv>"),
            },
            "calendar" => self.calendar_command(args),
            "holidays" => self.holidays_command(args),
            "range" => self.range_command(args),
            "today" => match args {
                [date] => match parse_date(date) {
                    Some(date) => {
                        self.today = date;
                        println!("Today: {}", date);
                    }
                    None => println!("Invalid date (YYYY-MM-DD)"),
                },
                _ => println!("Today: {}", self.today),
            },
            "filter" => self.filter_command(args),
            "resolve" => {
                let rest = input.trim_start().strip_prefix("resolve").unwrap_or("");
                self.resolve_command(rest);
            }
            "capacity" => self.capacity_command(),
            "report" => self.report_command(args),
            "save" => self.save_command(args),
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
        true
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => match AnalyzerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => AnalyzerConfig::default(),
    };
    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut session = Session::new(config, today);
    if let Some(path) = session.config.holiday_table.clone() {
        match load_holiday_table(&path) {
            Ok(table) => session.holidays = Some(table),
            Err(e) => println!("Error: {}", e),
        }
    }

    println!("Task Analyzer (CLI) - type 'help' for commands\n");
    if let Some(path) = &args.data {
        session.load(&path.to_string_lossy());
    }
    println!("Range: {}", session.range);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if !session.handle(input) {
            break;
        }
    }
}
