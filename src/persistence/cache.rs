use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::task::TaskRecord;

/// `(content hash, sheet name)`; the hash is the hex SHA-256 of the upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DatasetKey {
    pub content_hash: String,
    pub sheet: String,
}

impl DatasetKey {
    pub fn for_content(content: &[u8], sheet: impl Into<String>) -> Self {
        Self {
            content_hash: hex::encode(Sha256::digest(content)),
            sheet: sheet.into(),
        }
    }
}

/// Parsed uploads keyed by content and sheet. Entries live until
/// [`DatasetCache::invalidate`] or a new upload replaces them.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<DatasetKey, Arc<Vec<TaskRecord>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DatasetKey) -> Option<Arc<Vec<TaskRecord>>> {
        let hit = self.entries.get(key).cloned();
        tracing::debug!(sheet = %key.sheet, hit = hit.is_some(), "dataset cache lookup");
        hit
    }

    /// Store `records` under `key`, dropping every other entry for the same sheet.
    pub fn insert(&mut self, key: DatasetKey, records: Vec<TaskRecord>) -> Arc<Vec<TaskRecord>> {
        self.entries.retain(|existing, _| existing.sheet != key.sheet);
        let records = Arc::new(records);
        self.entries.insert(key, records.clone());
        records
    }

    /// Cached records for `key`, or the result of `load` stored under it.
    /// The flag is `true` when the records came from the cache.
    pub fn get_or_insert_with<F, E>(
        &mut self,
        key: DatasetKey,
        load: F,
    ) -> Result<(Arc<Vec<TaskRecord>>, bool), E>
    where
        F: FnOnce() -> Result<Vec<TaskRecord>, E>,
    {
        if let Some(records) = self.get(&key) {
            return Ok((records, true));
        }
        let records = load()?;
        Ok((self.insert(key, records), false))
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
