//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{Difficulty, StudySettingsError, Subject};
use quiz_core::session::{StartError, TransitionError};
use storage::catalog::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no {difficulty} problems found for {subject}")]
    NotFound {
        subject: Subject,
        difficulty: Difficulty,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] StudySettingsError),
    #[error(transparent)]
    Start(#[from] StartError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SessionError {
    /// True when the learner tried to move on before submitting a quiz answer.
    #[must_use]
    pub fn is_precedence(&self) -> bool {
        matches!(self, SessionError::Transition(err) if err.is_precedence())
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
