use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::calendar::BusinessCalendarConfig;
use crate::filter::DEFAULT_EXCLUDED_CATEGORY;
use crate::holidays::Jurisdiction;
use crate::persistence::AnalyzerResult;

/// Header names of the task export. Headers are compared after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub created_at: String,
    pub completed_at: String,
    pub person: String,
    pub category: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            created_at: "Created Date".to_string(),
            completed_at: "Done Timestamp".to_string(),
            person: "Person".to_string(),
            category: "Ticket Category".to_string(),
        }
    }
}

impl ColumnNames {
    pub fn required(&self) -> [&str; 4] {
        [
            self.created_at.as_str(),
            self.completed_at.as_str(),
            self.person.as_str(),
            self.category.as_str(),
        ]
    }
}

/// Settings file shared by the CLI and HTTP entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub calendar: BusinessCalendarConfig,
    pub columns: ColumnNames,
    pub exclude_category: Option<String>,
    pub holiday_table: Option<PathBuf>,
    pub jurisdiction: Jurisdiction,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            calendar: BusinessCalendarConfig::default(),
            columns: ColumnNames::default(),
            exclude_category: Some(DEFAULT_EXCLUDED_CATEGORY.to_string()),
            holiday_table: None,
            jurisdiction: Jurisdiction::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> AnalyzerResult<Self> {
        let file = File::open(path.as_ref())?;
        let config: AnalyzerConfig = serde_json::from_reader(file)?;
        tracing::info!(path = %path.as_ref().display(), "loaded analyzer config");
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> AnalyzerResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
