use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::timestamp::parse_timestamp;

/// One row of a task-tracking export. Timestamps stay raw until resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub created_at: String,
    pub completed_at: String,
    pub person: String,
    pub category: String,
}

impl TaskRecord {
    pub fn new(
        created_at: impl Into<String>,
        completed_at: impl Into<String>,
        person: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            created_at: created_at.into(),
            completed_at: completed_at.into(),
            person: person.into(),
            category: category.into(),
        }
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created().map(|dt| dt.date())
    }

    pub fn completed(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.completed_at)
    }
}

pub const PERSON_COLUMN: &str = "person";
pub const CATEGORY_COLUMN: &str = "category";
pub const RESOLUTION_COLUMN: &str = "resolution_wd";

/// Frame of `(person, category, resolution_wd)` with a null duration for rows
/// that could not be resolved. `durations[i]` belongs to `records[i]`.
pub fn resolved_dataframe(
    records: &[TaskRecord],
    durations: &[Option<f64>],
) -> PolarsResult<DataFrame> {
    if records.len() != durations.len() {
        return Err(PolarsError::ShapeMismatch(
            format!(
                "{} records but {} resolved durations",
                records.len(),
                durations.len()
            )
            .into(),
        ));
    }

    let persons: Vec<&str> = records.iter().map(|r| r.person.as_str()).collect();
    let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();

    let columns = vec![
        Series::new(PlSmallStr::from_static(PERSON_COLUMN), persons).into_column(),
        Series::new(PlSmallStr::from_static(CATEGORY_COLUMN), categories).into_column(),
        Series::new(PlSmallStr::from_static(RESOLUTION_COLUMN), durations.to_vec()).into_column(),
    ];
    DataFrame::new(columns)
}
