use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ProblemId, Subject};
use crate::model::study::Difficulty;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error("question cannot be empty")]
    EmptyQuestion,

    #[error("a problem needs at least 2 choices, got {0}")]
    TooFewChoices(usize),

    #[error("correct index {index} is out of range for {len} choices")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("selected index {index} is out of range for {len} choices")]
    SelectionOutOfRange { index: usize, len: usize },
}

//
// ─── PROBLEM ───────────────────────────────────────────────────────────────────
//

/// A multiple-choice problem. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    id: ProblemId,
    subject: Subject,
    difficulty: Difficulty,
    question: String,
    choices: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl Problem {
    /// Build a validated problem.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError` if the question is blank, fewer than two choices are
    /// given, or `correct_index` does not point at a choice.
    pub fn new(
        id: ProblemId,
        subject: Subject,
        difficulty: Difficulty,
        question: impl Into<String>,
        choices: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, ProblemError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(ProblemError::EmptyQuestion);
        }
        if choices.len() < 2 {
            return Err(ProblemError::TooFewChoices(choices.len()));
        }
        if correct_index >= choices.len() {
            return Err(ProblemError::CorrectIndexOutOfRange {
                index: correct_index,
                len: choices.len(),
            });
        }
        let explanation = explanation
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Self {
            id,
            subject,
            difficulty,
            question,
            choices,
            correct_index,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ProblemId {
        &self.id
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
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// A missing selection never matches the correct index.
    #[must_use]
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_index)
    }

    /// # Errors
    ///
    /// Returns `ProblemError::SelectionOutOfRange` if `index` is not a choice.
    pub fn check_choice(&self, index: usize) -> Result<(), ProblemError> {
        if index < self.choices.len() {
            Ok(())
        } else {
            Err(ProblemError::SelectionOutOfRange {
                index,
                len: self.choices.len(),
            })
        }
    }
}

//
// ─── ANSWERED PROBLEM ──────────────────────────────────────────────────────────
//

/// A problem plus the learner's latest recorded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnsweredProblemRecord", into = "AnsweredProblemRecord")]
pub struct AnsweredProblem {
    pub problem: Problem,
    pub user_selected_index: Option<usize>,
}

impl AnsweredProblem {
    #[must_use]
    pub fn unanswered(problem: Problem) -> Self {
        Self {
            problem,
            user_selected_index: None,
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.user_selected_index.is_some()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.problem.is_correct(self.user_selected_index)
    }
}

/// Wire shape of an answered problem inside persisted snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnsweredProblemRecord {
    id: ProblemId,
    subject: Subject,
    difficulty: Difficulty,
    question: String,
    choices: Vec<String>,
    answer_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_selected_index: Option<usize>,
}

impl TryFrom<AnsweredProblemRecord> for AnsweredProblem {
    type Error = ProblemError;

    fn try_from(record: AnsweredProblemRecord) -> Result<Self, Self::Error> {
        let problem = Problem::new(
            record.id,
            record.subject,
            record.difficulty,
            record.question,
            record.choices,
            record.answer_index,
            record.explanation,
        )?;
        if let Some(selected) = record.user_selected_index {
            problem.check_choice(selected)?;
        }
        Ok(Self {
            problem,
            user_selected_index: record.user_selected_index,
        })
    }
}

impl From<AnsweredProblem> for AnsweredProblemRecord {
    fn from(value: AnsweredProblem) -> Self {
        let AnsweredProblem {
            problem,
            user_selected_index,
        } = value;
        Self {
            id: problem.id,
            subject: problem.subject,
            difficulty: problem.difficulty,
            question: problem.question,
            choices: problem.choices,
            answer_index: problem.correct_index,
            explanation: problem.explanation,
            user_selected_index,
        }
    }
}
