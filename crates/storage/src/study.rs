use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    ContinueEntry, HistoryEntry, ProblemId, SessionKey, Subject, WrongEntry,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::repository::{KeyValueStore, StorageError, StudyRepository, keys};

/// Most recent completed sessions kept in history.
pub const HISTORY_LIMIT: usize = 100;

/// `StudyRepository` that keeps each namespace as one JSON array under a well-known key.
///
/// Missing keys read as empty. Malformed values are logged and skipped, element by
/// element, so one damaged record never hides the rest. A skipped record is also
/// dropped from storage by the next write to its namespace.
#[derive(Clone)]
pub struct KvStudyRepository {
    store: Arc<dyn KeyValueStore>,
    history_limit: usize,
}

impl KvStudyRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            history_limit: HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!(key, error = %err, "discarding malformed stored list");
                return Ok(Vec::new());
            }
        };

        let mut items = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value(value) {
                Ok(item) => items.push(item),
                Err(err) => warn!(key, index, error = %err, "skipping malformed stored record"),
            }
        }
        Ok(items)
    }

    async fn write_list<T: Serialize + Sync>(
        &self,
        key: &str,
        items: &[T],
    ) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(items).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.put(key, &raw).await
    }
}

#[async_trait]
impl StudyRepository for KvStudyRepository {
    async fn list_continue_entries(&self) -> Result<Vec<ContinueEntry>, StorageError> {
        self.read_list(keys::CONTINUE_STUDY).await
    }

    async fn load_continue_entry(
        &self,
        key: &SessionKey,
    ) -> Result<Option<ContinueEntry>, StorageError> {
        let entries: Vec<ContinueEntry> = self.read_list(keys::CONTINUE_STUDY).await?;
        Ok(entries.into_iter().find(|entry| entry.matches(key)))
    }

    async fn save_continue_entry(&self, entry: &ContinueEntry) -> Result<(), StorageError> {
        let key = entry.key();
        let mut entries: Vec<ContinueEntry> = self.read_list(keys::CONTINUE_STUDY).await?;
        entries.retain(|existing| !existing.matches(&key));
        entries.insert(0, entry.clone());
        self.write_list(keys::CONTINUE_STUDY, &entries).await
    }

    async fn delete_continue_entry(&self, key: &SessionKey) -> Result<(), StorageError> {
        let mut entries: Vec<ContinueEntry> = self.read_list(keys::CONTINUE_STUDY).await?;
        let before = entries.len();
        entries.retain(|existing| !existing.matches(key));
        if entries.len() == before {
            return Ok(());
        }
        self.write_list(keys::CONTINUE_STUDY, &entries).await
    }

    async fn list_wrong_entries(&self) -> Result<Vec<WrongEntry>, StorageError> {
        self.read_list(keys::WRONG_PROBLEMS).await
    }

    async fn add_wrong(&self, entry: &WrongEntry) -> Result<(), StorageError> {
        let mut entries: Vec<WrongEntry> = self.read_list(keys::WRONG_PROBLEMS).await?;
        if entries
            .iter()
            .any(|existing| existing.is_same_problem(&entry.subject, &entry.id))
        {
            return Ok(());
        }
        entries.push(entry.clone());
        self.write_list(keys::WRONG_PROBLEMS, &entries).await
    }

    async fn remove_wrong(&self, subject: &Subject, id: &ProblemId) -> Result<(), StorageError> {
        let mut entries: Vec<WrongEntry> = self.read_list(keys::WRONG_PROBLEMS).await?;
        let before = entries.len();
        entries.retain(|existing| !existing.is_same_problem(subject, id));
        if entries.len() == before {
            return Ok(());
        }
        self.write_list(keys::WRONG_PROBLEMS, &entries).await
    }

    async fn list_history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        self.read_list(keys::STUDY_HISTORY).await
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        let mut entries: Vec<HistoryEntry> = self.read_list(keys::STUDY_HISTORY).await?;
        entries.insert(0, entry.clone());
        entries.truncate(self.history_limit);
        self.write_list(keys::STUDY_HISTORY, &entries).await
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        for key in keys::ALL {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}
