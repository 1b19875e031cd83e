use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::period::DateRange;
use crate::task::TaskRecord;

pub const DEFAULT_EXCLUDED_CATEGORY: &str = "Renewal - Account Renewal";

/// Row selection applied before resolution. `None` for `persons` or
/// `categories` means every value is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub range: DateRange,
    #[serde(default)]
    pub persons: Option<BTreeSet<String>>,
    #[serde(default)]
    pub categories: Option<BTreeSet<String>>,
    #[serde(default)]
    pub exclude_category: Option<String>,
}

impl RecordFilter {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            persons: None,
            categories: None,
            exclude_category: Some(DEFAULT_EXCLUDED_CATEGORY.to_string()),
        }
    }

    pub fn matches(&self, record: &TaskRecord) -> bool {
        let Some(created) = record.created_date() else {
            return false;
        };
        if !self.range.contains(created) {
            return false;
        }
        if record.person.trim().is_empty() || record.category.trim().is_empty() {
            return false;
        }
        if self
            .exclude_category
            .as_deref()
            .is_some_and(|excluded| !excluded.is_empty() && record.category == excluded)
        {
            return false;
        }
        let person_ok = self
            .persons
            .as_ref()
            .is_none_or(|set| set.contains(&record.person));
        let category_ok = self
            .categories
            .as_ref()
            .is_none_or(|set| set.contains(&record.category));
        person_ok && category_ok
    }

    pub fn apply(&self, records: &[TaskRecord]) -> Vec<TaskRecord> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

/// Sorted distinct non-empty persons in `records`.
pub fn distinct_persons(records: &[TaskRecord]) -> BTreeSet<String> {
    records
        .iter()
        .map(|r| r.person.trim())
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Sorted distinct non-empty categories in `records`.
pub fn distinct_categories(records: &[TaskRecord]) -> BTreeSet<String> {
    records
        .iter()
        .map(|r| r.category.trim())
        .filter(|c| !c.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
