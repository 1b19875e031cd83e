use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::BusinessCalendar;
use crate::capacity::capacity;
use crate::filter::{RecordFilter, distinct_persons};
use crate::period::DateRange;
use crate::resolver::resolve_records;
use crate::task::{CATEGORY_COLUMN, PERSON_COLUMN, RESOLUTION_COLUMN, TaskRecord, resolved_dataframe};

pub const TEAM_TOTAL_LABEL: &str = "Team Total";

const TOTAL_TASKS: &str = "total_tasks";
const VALID_TASKS: &str = "valid_tasks";
const AVERAGE_WD: &str = "average_wd";
const RESOLVED_WD: &str = "resolved_wd";
const STANDARD_MINUTES: &str = "standard_minutes";
const TASKS: &str = "tasks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonResolution {
    pub person: String,
    pub category_counts: BTreeMap<String, u64>,
    pub total_tasks: u64,
    pub valid_tasks: u64,
    pub average_resolution_wd: Option<f64>,
}

/// Per-person task counts and average resolution time in working days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub categories: Vec<String>,
    pub people: Vec<PersonResolution>,
    pub team_total: PersonResolution,
    pub team_average_wd: Option<f64>,
    pub total_rows: u64,
    pub valid_rows: u64,
}

impl ResolutionReport {
    /// `durations[i]` is the resolved duration of `records[i]`; `None` rows
    /// count as tasks but are left out of every average.
    pub fn build(records: &[TaskRecord], durations: &[Option<f64>]) -> PolarsResult<Self> {
        let df = resolved_dataframe(records, durations)?;

        let per_person = df
            .clone()
            .lazy()
            .group_by([col(PERSON_COLUMN)])
            .agg([
                len().cast(DataType::UInt64).alias(TOTAL_TASKS),
                col(RESOLUTION_COLUMN)
                    .count()
                    .cast(DataType::UInt64)
                    .alias(VALID_TASKS),
                col(RESOLUTION_COLUMN).mean().alias(AVERAGE_WD),
            ])
            .sort([PERSON_COLUMN], SortMultipleOptions::default())
            .collect()?;

        let per_category = df
            .lazy()
            .group_by([col(PERSON_COLUMN), col(CATEGORY_COLUMN)])
            .agg([len().cast(DataType::UInt64).alias(TASKS)])
            .collect()?;

        let mut counts: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        let cat_persons = per_category.column(PERSON_COLUMN)?.str()?;
        let cat_names = per_category.column(CATEGORY_COLUMN)?.str()?;
        let cat_tasks = per_category.column(TASKS)?.u64()?;
        for idx in 0..per_category.height() {
            let person = cat_persons.get(idx).unwrap_or_default().to_string();
            let category = cat_names.get(idx).unwrap_or_default().to_string();
            let tasks = cat_tasks.get(idx).unwrap_or(0);
            counts.entry(person).or_default().insert(category, tasks);
        }

        let categories: Vec<String> = {
            let mut all: Vec<String> = counts
                .values()
                .flat_map(|by_cat| by_cat.keys().cloned())
                .collect();
            all.sort();
            all.dedup();
            all
        };

        let persons = per_person.column(PERSON_COLUMN)?.str()?;
        let totals = per_person.column(TOTAL_TASKS)?.u64()?;
        let valids = per_person.column(VALID_TASKS)?.u64()?;
        let averages = per_person.column(AVERAGE_WD)?.f64()?;

        let mut people = Vec::with_capacity(per_person.height());
        for idx in 0..per_person.height() {
            let person = persons.get(idx).unwrap_or_default().to_string();
            let mut category_counts: BTreeMap<String, u64> =
                categories.iter().map(|c| (c.clone(), 0)).collect();
            if let Some(by_cat) = counts.get(&person) {
                category_counts.extend(by_cat.iter().map(|(c, n)| (c.clone(), *n)));
            }
            people.push(PersonResolution {
                person,
                category_counts,
                total_tasks: totals.get(idx).unwrap_or(0),
                valid_tasks: valids.get(idx).unwrap_or(0),
                average_resolution_wd: averages.get(idx),
            });
        }

        let valid: Vec<f64> = durations.iter().flatten().copied().collect();
        let team_average_wd = if valid.is_empty() {
            None
        } else {
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        };

        let mut team_counts: BTreeMap<String, u64> =
            categories.iter().map(|c| (c.clone(), 0)).collect();
        for row in &people {
            for (category, n) in &row.category_counts {
                *team_counts.entry(category.clone()).or_default() += n;
            }
        }
        let team_total = PersonResolution {
            person: TEAM_TOTAL_LABEL.to_string(),
            category_counts: team_counts,
            total_tasks: people.iter().map(|p| p.total_tasks).sum(),
            valid_tasks: people.iter().map(|p| p.valid_tasks).sum(),
            average_resolution_wd: team_average_wd,
        };

        Ok(Self {
            categories,
            people,
            team_total,
            team_average_wd,
            total_rows: records.len() as u64,
            valid_rows: valid.len() as u64,
        })
    }
}

/// How a person's time spent is measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductivityMethod {
    /// Resolved working days converted to minutes.
    #[default]
    Actual,
    /// A fixed estimate in minutes per task category.
    Standard {
        #[serde(default)]
        per_category: BTreeMap<String, f64>,
        #[serde(default = "default_standard_minutes")]
        default_minutes: f64,
    },
}

pub const DEFAULT_STANDARD_MINUTES: f64 = 60.0;

fn default_standard_minutes() -> f64 {
    DEFAULT_STANDARD_MINUTES
}

impl ProductivityMethod {
    pub fn standard(per_category: BTreeMap<String, f64>) -> Self {
        ProductivityMethod::Standard {
            per_category,
            default_minutes: DEFAULT_STANDARD_MINUTES,
        }
    }

    fn minutes_for(&self, category: &str) -> f64 {
        match self {
            ProductivityMethod::Actual => 0.0,
            ProductivityMethod::Standard {
                per_category,
                default_minutes,
            } => per_category.get(category).copied().unwrap_or(*default_minutes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assessment {
    NeedsImprovement,
    Productive,
    Excellent,
}

impl Assessment {
    pub fn from_productivity(pct: f64) -> Self {
        if pct >= 95.0 {
            Assessment::Excellent
        } else if pct >= 80.0 {
            Assessment::Productive
        } else {
            Assessment::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Assessment::NeedsImprovement => "Needs Improvement",
            Assessment::Productive => "Productive",
            Assessment::Excellent => "Excellent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonProductivity {
    pub person: String,
    pub total_tasks: u64,
    pub time_spent_minutes: f64,
    pub available_minutes: f64,
    pub productivity_pct: f64,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityReport {
    pub people: Vec<PersonProductivity>,
    pub available_minutes: f64,
    pub team_size: usize,
    pub overall_productivity_pct: f64,
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

impl ProductivityReport {
    pub fn build(
        records: &[TaskRecord],
        durations: &[Option<f64>],
        method: &ProductivityMethod,
        calendar: &BusinessCalendar,
        range: DateRange,
        team_size: usize,
    ) -> PolarsResult<Self> {
        let available_minutes = capacity(range.start, range.end, calendar) * 60.0;
        let minutes_per_wd = calendar.working_hours_per_day() * 60.0;

        let mut df = resolved_dataframe(records, durations)?;
        let standard: Vec<f64> = records
            .iter()
            .map(|r| method.minutes_for(&r.category))
            .collect();
        df.with_column(Series::new(PlSmallStr::from_static(STANDARD_MINUTES), standard))?;

        let per_person = df
            .lazy()
            .group_by([col(PERSON_COLUMN)])
            .agg([
                len().cast(DataType::UInt64).alias(TOTAL_TASKS),
                col(RESOLUTION_COLUMN).sum().alias(RESOLVED_WD),
                col(STANDARD_MINUTES).sum().alias(STANDARD_MINUTES),
            ])
            .sort([PERSON_COLUMN], SortMultipleOptions::default())
            .collect()?;

        let persons = per_person.column(PERSON_COLUMN)?.str()?;
        let totals = per_person.column(TOTAL_TASKS)?.u64()?;
        let resolved = per_person.column(RESOLVED_WD)?.f64()?;
        let estimated = per_person.column(STANDARD_MINUTES)?.f64()?;

        let mut people = Vec::with_capacity(per_person.height());
        for idx in 0..per_person.height() {
            let time_spent_minutes = match method {
                ProductivityMethod::Actual => resolved.get(idx).unwrap_or(0.0) * minutes_per_wd,
                ProductivityMethod::Standard { .. } => estimated.get(idx).unwrap_or(0.0),
            };
            let productivity_pct = percentage(time_spent_minutes, available_minutes);
            people.push(PersonProductivity {
                person: persons.get(idx).unwrap_or_default().to_string(),
                total_tasks: totals.get(idx).unwrap_or(0),
                time_spent_minutes,
                available_minutes,
                productivity_pct,
                assessment: Assessment::from_productivity(productivity_pct),
            });
        }

        let spent: f64 = people.iter().map(|p| p.time_spent_minutes).sum();
        let overall_productivity_pct = percentage(spent, team_size as f64 * available_minutes);

        Ok(Self {
            people,
            available_minutes,
            team_size,
            overall_productivity_pct,
        })
    }
}

/// One report run: the filtered rows, their resolved durations, and the
/// calendar and range they were measured against.
#[derive(Debug, Clone)]
pub struct Analysis {
    calendar: BusinessCalendar,
    range: DateRange,
    records: Vec<TaskRecord>,
    durations: Vec<Option<f64>>,
    team_size: usize,
}

impl Analysis {
    /// `dataset` is the full upload; the team size used for overall
    /// productivity counts every person in it, filtered or not.
    pub fn run(dataset: &[TaskRecord], filter: &RecordFilter, calendar: &BusinessCalendar) -> Self {
        let records = filter.apply(dataset);
        let durations = resolve_records(&records, calendar);
        Self {
            calendar: calendar.clone(),
            range: filter.range,
            records,
            durations,
            team_size: distinct_persons(dataset).len(),
        }
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn durations(&self) -> &[Option<f64>] {
        &self.durations
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn available_hours(&self) -> f64 {
        capacity(self.range.start, self.range.end, &self.calendar)
    }

    pub fn resolution_report(&self) -> PolarsResult<ResolutionReport> {
        ResolutionReport::build(&self.records, &self.durations)
    }

    pub fn productivity_report(&self, method: &ProductivityMethod) -> PolarsResult<ProductivityReport> {
        ProductivityReport::build(
            &self.records,
            &self.durations,
            method,
            &self.calendar,
            self.range,
            self.team_size,
        )
    }
}
