use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::Subject;
use crate::model::problem::AnsweredProblem;
use crate::model::study::{Difficulty, StudyMode};

/// Score awarded for each correct answer.
pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryEntryError {
    #[error("total ({total}) does not match correct + wrong ({sum})")]
    CountMismatch { total: u32, sum: u32 },

    #[error("total score ({score}) does not match correct count ({correct})")]
    ScoreMismatch { score: u32, correct: u32 },

    #[error("too many problems for a single session: {len}")]
    TooManyProblems { len: usize },
}

//
// ─── TALLY ─────────────────────────────────────────────────────────────────────
//

/// Correct/wrong counts and the derived score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub correct_count: u32,
    pub wrong_count: u32,
    pub total_score: u32,
}

impl Tally {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.total_score = self.total_score.saturating_add(POINTS_PER_CORRECT);
        } else {
            self.wrong_count = self.wrong_count.saturating_add(1);
        }
    }

    /// Count only problems that carry an answer.
    #[must_use]
    pub fn replay<'a>(problems: impl IntoIterator<Item = &'a AnsweredProblem>) -> Self {
        let mut tally = Self::default();
        for answered in problems.into_iter().filter(|p| p.is_answered()) {
            tally.record(answered.is_correct());
        }
        tally
    }

    /// Count every problem; an unanswered problem is wrong.
    #[must_use]
    pub fn score_all<'a>(problems: impl IntoIterator<Item = &'a AnsweredProblem>) -> Self {
        let mut tally = Self::default();
        for answered in problems {
            tally.record(answered.is_correct());
        }
        tally
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.correct_count.saturating_add(self.wrong_count)
    }

    /// Rounded percentage of correct answers among answered ones; 0 when nothing was answered.
    #[must_use]
    pub fn correct_rate_percent(&self) -> u32 {
        let answered = self.answered();
        if answered == 0 {
            return 0;
        }
        let rate = f64::from(self.correct_count) / f64::from(answered) * 100.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            rate.round() as u32
        }
    }
}

//
// ─── SESSION RESULT ────────────────────────────────────────────────────────────
//

/// Final outcome of a completed session, handed to the results view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    #[serde(flatten)]
    pub tally: Tally,
    pub problems: Vec<AnsweredProblem>,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub mode: StudyMode,
}

impl SessionResult {
    #[must_use]
    pub fn total(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.tally.correct_count
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.tally.wrong_count
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.tally.total_score
    }

    /// Problems whose final answer was wrong or missing.
    pub fn missed(&self) -> impl Iterator<Item = &AnsweredProblem> {
        self.problems.iter().filter(|p| !p.is_correct())
    }
}

//
// ─── HISTORY ENTRY ─────────────────────────────────────────────────────────────
//

/// Immutable record of one completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HistoryEntryRecord", into = "HistoryEntryRecord")]
pub struct HistoryEntry {
    subject: Subject,
    difficulty: Difficulty,
    mode: StudyMode,
    total: u32,
    correct_count: u32,
    wrong_count: u32,
    total_score: u32,
    date: DateTime<Utc>,
}

impl HistoryEntry {
    /// Rehydrate a history entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `HistoryEntryError::CountMismatch` if totals do not align and
    /// `HistoryEntryError::ScoreMismatch` if the score disagrees with the correct count.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        subject: Subject,
        difficulty: Difficulty,
        mode: StudyMode,
        total: u32,
        correct_count: u32,
        wrong_count: u32,
        total_score: u32,
        date: DateTime<Utc>,
    ) -> Result<Self, HistoryEntryError> {
        let sum = correct_count.saturating_add(wrong_count);
        if sum != total {
            return Err(HistoryEntryError::CountMismatch { total, sum });
        }
        if total_score != correct_count.saturating_mul(POINTS_PER_CORRECT) {
            return Err(HistoryEntryError::ScoreMismatch {
                score: total_score,
                correct: correct_count,
            });
        }

        Ok(Self {
            subject,
            difficulty,
            mode,
            total,
            correct_count,
            wrong_count,
            total_score,
            date,
        })
    }

    /// Build the history record for a completed session.
    ///
    /// # Errors
    ///
    /// Returns `HistoryEntryError::TooManyProblems` if the problem count cannot fit in `u32`.
    pub fn from_result(
        result: &SessionResult,
        date: DateTime<Utc>,
    ) -> Result<Self, HistoryEntryError> {
        let total = u32::try_from(result.problems.len())
            .map_err(|_| HistoryEntryError::TooManyProblems {
                len: result.problems.len(),
            })?;
        Self::from_persisted(
            result.subject.clone(),
            result.difficulty,
            result.mode,
            total,
            result.tally.correct_count,
            result.tally.wrong_count,
            result.tally.total_score,
            date,
        )
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntryRecord {
    subject: Subject,
    difficulty: Difficulty,
    mode: StudyMode,
    total: u32,
    correct_count: u32,
    wrong_count: u32,
    total_score: u32,
    date: DateTime<Utc>,
}

impl TryFrom<HistoryEntryRecord> for HistoryEntry {
    type Error = HistoryEntryError;

    fn try_from(r: HistoryEntryRecord) -> Result<Self, Self::Error> {
        HistoryEntry::from_persisted(
            r.subject,
            r.difficulty,
            r.mode,
            r.total,
            r.correct_count,
            r.wrong_count,
            r.total_score,
            r.date,
        )
    }
}

impl From<HistoryEntry> for HistoryEntryRecord {
    fn from(e: HistoryEntry) -> Self {
        Self {
            subject: e.subject,
            difficulty: e.difficulty,
            mode: e.mode,
            total: e.total,
            correct_count: e.correct_count,
            wrong_count: e.wrong_count,
            total_score: e.total_score,
            date: e.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn tally_scores_ten_per_correct() {
        let mut tally = Tally::default();
        tally.record(true);
        tally.record(false);
        tally.record(true);
        assert_eq!(tally.correct_count, 2);
        assert_eq!(tally.wrong_count, 1);
        assert_eq!(tally.total_score, 20);
        assert_eq!(tally.correct_rate_percent(), 67);
    }

    #[test]
    fn empty_tally_has_zero_rate() {
        assert_eq!(Tally::default().correct_rate_percent(), 0);
    }

    #[test]
    fn history_entry_rejects_inconsistent_counts() {
        let subject = Subject::new("os").unwrap();
        let err = HistoryEntry::from_persisted(
            subject.clone(),
            Difficulty::Easy,
            StudyMode::Exam,
            3,
            1,
            1,
            10,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, HistoryEntryError::CountMismatch { total: 3, sum: 2 });

        let err = HistoryEntry::from_persisted(
            subject,
            Difficulty::Easy,
            StudyMode::Exam,
            2,
            1,
            1,
            20,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, HistoryEntryError::ScoreMismatch { score: 20, correct: 1 });
    }

    #[test]
    fn history_entry_deserialization_validates() {
        let json = serde_json::json!({
            "subject": "os",
            "difficulty": "초급",
            "mode": "quiz",
            "total": 2,
            "correctCount": 2,
            "wrongCount": 1,
            "totalScore": 20,
            "date": "2023-11-14T22:13:20Z"
        });
        assert!(serde_json::from_value::<HistoryEntry>(json).is_err());
    }
}
