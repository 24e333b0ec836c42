//! Persistence of analysis records, one record per page visit

use shared_types::StoredAnalysis;
use std::cell::RefCell;
use std::collections::BTreeMap;
use thiserror::Error;

/// Key prefix shared by every persisted analysis record
pub const KEY_PREFIX: &str = "analysis_";

pub fn analysis_key(visit_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, visit_id)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation failed: {0}")]
    Backend(String),

    #[error("stored record is not valid JSON: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Key-value persistence for [`StoredAnalysis`] records.
///
/// Saving under an existing visit id replaces the previous record.
pub trait AnalysisStore {
    fn save(&self, visit_id: &str, record: &StoredAnalysis) -> Result<(), StoreError>;
    fn load(&self, visit_id: &str) -> Result<Option<StoredAnalysis>, StoreError>;
    fn remove(&self, visit_id: &str) -> Result<(), StoreError>;
    /// Remove every analysis record, returning how many were dropped
    fn clear_all(&self) -> Result<usize, StoreError>;
}

/// In-memory store holding serialized records, as a browser store would
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl AnalysisStore for MemoryStore {
    fn save(&self, visit_id: &str, record: &StoredAnalysis) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.entries.borrow_mut().insert(analysis_key(visit_id), json);
        Ok(())
    }

    fn load(&self, visit_id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        self.entries
            .borrow()
            .get(&analysis_key(visit_id))
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .transpose()
    }

    fn remove(&self, visit_id: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(&analysis_key(visit_id));
        Ok(())
    }

    fn clear_all(&self) -> Result<usize, StoreError> {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(KEY_PREFIX));
        Ok(before - entries.len())
    }
}

impl<S: AnalysisStore + ?Sized> AnalysisStore for std::rc::Rc<S> {
    fn save(&self, visit_id: &str, record: &StoredAnalysis) -> Result<(), StoreError> {
        (**self).save(visit_id, record)
    }

    fn load(&self, visit_id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        (**self).load(visit_id)
    }

    fn remove(&self, visit_id: &str) -> Result<(), StoreError> {
        (**self).remove(visit_id)
    }

    fn clear_all(&self) -> Result<usize, StoreError> {
        (**self).clear_all()
    }
}
