use async_trait::async_trait;
use quiz_core::model::{
    ContinueEntry, HistoryEntry, ProblemId, SessionKey, Subject, WrongEntry,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::study::KvStudyRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Well-known keys of the three study namespaces.
pub mod keys {
    pub const CONTINUE_STUDY: &str = "continueStudy";
    pub const WRONG_PROBLEMS: &str = "wrongProblems";
    pub const STUDY_HISTORY: &str = "studyHistory";

    pub const ALL: [&str; 3] = [CONTINUE_STUDY, WRONG_PROBLEMS, STUDY_HISTORY];
}

/// Raw string key/value store, persisted across restarts by the real backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed access to continue snapshots, review notes and study history.
#[async_trait]
pub trait StudyRepository: Send + Sync {
    /// All continue snapshots, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_continue_entries(&self) -> Result<Vec<ContinueEntry>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_continue_entry(
        &self,
        key: &SessionKey,
    ) -> Result<Option<ContinueEntry>, StorageError>;

    /// Store a snapshot, replacing any snapshot with the same key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_continue_entry(&self, entry: &ContinueEntry) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete_continue_entry(&self, key: &SessionKey) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_wrong_entries(&self) -> Result<Vec<WrongEntry>, StorageError>;

    /// Record a missed problem. Adding an already recorded `(subject, id)` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn add_wrong(&self, entry: &WrongEntry) -> Result<(), StorageError>;

    /// Forget a missed problem. Removing an unknown problem is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove_wrong(&self, subject: &Subject, id: &ProblemId) -> Result<(), StorageError>;

    /// Completed sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_history(&self) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Prepend a completed session and drop the oldest beyond the history cap.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StorageError>;

    /// Delete all three study namespaces.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the raw store and the typed study repository behind trait objects.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub study: Arc<dyn StudyRepository>,
}

impl Storage {
    #[must_use]
    pub fn from_store(kv: Arc<dyn KeyValueStore>) -> Self {
        let study: Arc<dyn StudyRepository> = Arc::new(KvStudyRepository::new(Arc::clone(&kv)));
        Self { kv, study }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }
}
