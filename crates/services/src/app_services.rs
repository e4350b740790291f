use std::sync::Arc;

use chrono::FixedOffset;
use storage::catalog::ProblemCatalog;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::persistence::PersistenceBridge;
use crate::problem_source::ProblemSource;
use crate::review_note_service::ReviewNoteService;
use crate::sessions::SessionController;
use crate::stats_service::StatsService;

/// Assembles app-facing services over one storage backend and one catalog.
#[derive(Clone)]
pub struct AppServices {
    sessions: Arc<SessionController>,
    stats: Arc<StatsService>,
    review_notes: Arc<ReviewNoteService>,
    persistence: PersistenceBridge,
}

impl AppServices {
    #[must_use]
    pub fn new(
        storage: &Storage,
        catalog: Arc<dyn ProblemCatalog>,
        clock: Clock,
        offset: FixedOffset,
    ) -> Self {
        let persistence = PersistenceBridge::new(Arc::clone(&storage.study));
        let problems = ProblemSource::new(Arc::clone(&catalog));

        let sessions = Arc::new(SessionController::new(
            clock,
            problems,
            persistence.clone(),
        ));
        let stats = Arc::new(StatsService::new(clock, offset, persistence.clone()));
        let review_notes = Arc::new(ReviewNoteService::new(persistence.clone(), catalog));

        Self {
            sessions,
            stats,
            review_notes,
            persistence,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Arc<dyn ProblemCatalog>,
        clock: Clock,
        offset: FixedOffset,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, catalog, clock, offset))
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionController> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn review_notes(&self) -> Arc<ReviewNoteService> {
        Arc::clone(&self.review_notes)
    }

    /// Delete all study records.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the records cannot be removed.
    pub async fn reset_study_records(&self) -> Result<(), AppServicesError> {
        self.persistence.clear_all().await?;
        Ok(())
    }
}
