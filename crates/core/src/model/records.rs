use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ProblemId, Subject};
use crate::model::problem::AnsweredProblem;
use crate::model::study::{Difficulty, SessionKey, StudyMode};

/// Snapshot of an interrupted session, keyed by `(subject, difficulty, mode)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueEntry {
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub mode: StudyMode,
    pub current: usize,
    pub total: usize,
    pub progress_percent: f64,
    /// Rounded percentage over the problems answered so far.
    pub correct_rate: u32,
    pub problems: Vec<AnsweredProblem>,
    #[serde(default)]
    pub remaining_time_seconds: Option<u32>,
    #[serde(default)]
    pub study_time_min: Option<u32>,
    pub saved_at: DateTime<Utc>,
}

impl ContinueEntry {
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.subject.clone(), self.difficulty, self.mode)
    }

    #[must_use]
    pub fn matches(&self, key: &SessionKey) -> bool {
        self.subject == key.subject && self.difficulty == key.difficulty && self.mode == key.mode
    }
}

/// A missed problem kept for review. Unique per `(subject, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WrongEntry {
    pub subject: Subject,
    pub id: ProblemId,
    pub difficulty: Difficulty,
}

impl WrongEntry {
    #[must_use]
    pub fn new(subject: Subject, id: ProblemId, difficulty: Difficulty) -> Self {
        Self {
            subject,
            id,
            difficulty,
        }
    }

    #[must_use]
    pub fn is_same_problem(&self, subject: &Subject, id: &ProblemId) -> bool {
        &self.subject == subject && &self.id == id
    }
}
