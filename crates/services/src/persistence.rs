use std::sync::Arc;

use tracing::warn;

use quiz_core::model::{ContinueEntry, HistoryEntry, SessionKey, WrongEntry};
use storage::repository::{StorageError, StudyRepository};

/// Failure-tolerant access to the study repository.
///
/// A storage failure never interrupts studying: reads degrade to "no data" and
/// writes to no-ops, with the error logged.
#[derive(Clone)]
pub struct PersistenceBridge {
    study: Arc<dyn StudyRepository>,
}

impl PersistenceBridge {
    #[must_use]
    pub fn new(study: Arc<dyn StudyRepository>) -> Self {
        Self { study }
    }

    pub async fn continue_entries(&self) -> Vec<ContinueEntry> {
        self.study
            .list_continue_entries()
            .await
            .unwrap_or_else(|err| degraded("list continue entries", &err))
    }

    pub async fn load_continue(&self, key: &SessionKey) -> Option<ContinueEntry> {
        self.study
            .load_continue_entry(key)
            .await
            .unwrap_or_else(|err| degraded("load continue entry", &err))
    }

    pub async fn save_continue(&self, entry: &ContinueEntry) {
        if let Err(err) = self.study.save_continue_entry(entry).await {
            log_failure("save continue entry", &err);
        }
    }

    pub async fn delete_continue(&self, key: &SessionKey) {
        if let Err(err) = self.study.delete_continue_entry(key).await {
            log_failure("delete continue entry", &err);
        }
    }

    pub async fn wrong_entries(&self) -> Vec<WrongEntry> {
        self.study
            .list_wrong_entries()
            .await
            .unwrap_or_else(|err| degraded("list wrong entries", &err))
    }

    /// Keep the review notes in line with the latest answer to a problem.
    pub async fn reconcile(&self, entry: &WrongEntry, correct: bool) {
        let outcome = if correct {
            self.study.remove_wrong(&entry.subject, &entry.id).await
        } else {
            self.study.add_wrong(entry).await
        };
        if let Err(err) = outcome {
            log_failure("update review notes", &err);
        }
    }

    pub async fn remove_wrong(&self, entry: &WrongEntry) {
        self.reconcile(entry, true).await;
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.study
            .list_history()
            .await
            .unwrap_or_else(|err| degraded("list history", &err))
    }

    pub async fn append_history(&self, entry: &HistoryEntry) {
        if let Err(err) = self.study.append_history(entry).await {
            log_failure("append history", &err);
        }
    }

    /// Delete every study record. Unlike the other operations, failures are returned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be removed.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.study.clear_all().await
    }
}

fn log_failure(operation: &'static str, err: &StorageError) {
    warn!(operation, error = %err, "storage unavailable; continuing without it");
}

fn degraded<T: Default>(operation: &'static str, err: &StorageError) -> T {
    log_failure(operation, err);
    T::default()
}
