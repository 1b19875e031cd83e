use polars::prelude::PolarsError;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum AnalyzerError {
    Serialization(SerdeJsonError),
    DataFrame(PolarsError),
    Io(io::Error),
    Csv(csv::Error),
    InvalidData(String),
    MissingColumns(Vec<String>),
    NotFound,
}

impl fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerError::Serialization(err) => write!(f, "serialization error: {err}"),
            AnalyzerError::DataFrame(err) => write!(f, "dataframe error: {err}"),
            AnalyzerError::Io(err) => write!(f, "io error: {err}"),
            AnalyzerError::Csv(err) => write!(f, "csv error: {err}"),
            AnalyzerError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            AnalyzerError::MissingColumns(columns) => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            AnalyzerError::NotFound => write!(f, "no dataset loaded"),
        }
    }
}

impl std::error::Error for AnalyzerError {}

impl From<SerdeJsonError> for AnalyzerError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<PolarsError> for AnalyzerError {
    fn from(value: PolarsError) -> Self {
        Self::DataFrame(value)
    }
}

impl From<io::Error> for AnalyzerError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for AnalyzerError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

pub mod cache;
pub mod file;

pub use cache::{DatasetCache, DatasetKey};
pub use file::{
    load_calendar_config, load_holiday_table, load_tasks_from_csv, read_tasks_csv,
    save_calendar_config, save_productivity_report_to_csv, save_productivity_report_to_json,
    save_resolution_report_to_csv, save_resolution_report_to_json,
};
