use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;
use tracing::debug;

use quiz_core::model::{Difficulty, Problem, Subject};
use storage::catalog::ProblemCatalog;

use crate::error::SessionError;

/// Most problems served by one fresh session.
pub const FRESH_PROBLEM_LIMIT: usize = 10;

/// Loads the problem set for a fresh session from a catalog.
#[derive(Clone)]
pub struct ProblemSource {
    catalog: Arc<dyn ProblemCatalog>,
    limit: usize,
    shuffle: bool,
}

impl ProblemSource {
    #[must_use]
    pub fn new(catalog: Arc<dyn ProblemCatalog>) -> Self {
        Self {
            catalog,
            limit: FRESH_PROBLEM_LIMIT,
            shuffle: false,
        }
    }

    /// Shuffle the bucket before capping it.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Up to the configured limit of problems for `subject` at `difficulty`, in catalog
    /// order unless shuffling is enabled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` when the subject or bucket has no valid problems
    /// and `SessionError::Catalog` when the catalog cannot be read.
    pub async fn load(
        &self,
        subject: &Subject,
        difficulty: Difficulty,
    ) -> Result<Vec<Problem>, SessionError> {
        let not_found = || SessionError::NotFound {
            subject: subject.clone(),
            difficulty,
        };

        let document = self.catalog.document(subject).await?.ok_or_else(not_found)?;
        let mut problems = document.problems(subject, difficulty);
        if problems.is_empty() {
            return Err(not_found());
        }

        if self.shuffle {
            problems.shuffle(&mut rng());
        }
        problems.truncate(self.limit);
        debug!(%subject, %difficulty, count = problems.len(), "loaded problems");
        Ok(problems)
    }
}
