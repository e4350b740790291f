//! Pure state machine for one quiz/exam run.
//!
//! Every learner action and timer event is a [`SessionEvent`] fed to
//! [`SessionState::apply`], which returns the next state together with the
//! [`Effect`]s the caller must carry out (review-note updates, completion).
//! The current state is never mutated in place, so a rejected event leaves it
//! untouched.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    AnsweredProblem, ContinueEntry, Difficulty, Problem, ProblemError, SessionKey, SessionResult,
    StudyMode, StudySettings, Subject, Tally, WrongEntry,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected transitions. None of these end the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("select an option first")]
    NoSelection,

    #[error("submit the answer before moving on")]
    SubmitRequired,

    #[error(transparent)]
    InvalidChoice(#[from] ProblemError),
}

impl TransitionError {
    /// True for the "advance before submit" ordering violation.
    #[must_use]
    pub fn is_precedence(&self) -> bool {
        matches!(self, TransitionError::SubmitRequired)
    }
}

/// Reasons a session cannot be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StartError {
    #[error("no problems available for session")]
    Empty,

    #[error("start index {index} is out of range for {len} problems")]
    StartIndexOutOfRange { index: usize, len: usize },
}

//
// ─── EVENTS / EFFECTS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tentatively choose an option on the current problem.
    Select(usize),
    /// Lock in the selection and reveal feedback (quiz mode).
    Submit,
    /// Record the answer and move to the next problem, or finish.
    Advance,
    /// Go back one problem.
    Retreat,
    /// One second of the time budget elapsed.
    Tick,
    /// The time budget ran out (exam mode).
    TimeExpire,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// An answer was recorded; the review-note store should reflect `correct`.
    Reconcile { entry: WrongEntry, correct: bool },
    /// The session finished. Emitted exactly once per session.
    Completed(SessionResult),
}

/// Outcome of applying one event.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Completed(result) => Some(result),
            Effect::Reconcile { .. } => None,
        })
    }
}

//
// ─── PHASE / FEEDBACK ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingAnswer,
    /// Quiz mode only: an option is chosen but not submitted.
    AwaitingSubmit,
    /// Quiz answer submitted, or exam option chosen.
    AwaitingAdvance,
    Completed,
}

/// Feedback for a submitted quiz answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback<'a> {
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
    pub explanation: Option<&'a str>,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    subject: Subject,
    difficulty: Difficulty,
    mode: StudyMode,
    problems: Vec<AnsweredProblem>,
    current_index: usize,
    selection: Option<usize>,
    submitted: bool,
    remaining_time_seconds: Option<u32>,
    study_time_min: Option<u32>,
    completed: bool,
}

impl SessionState {
    /// Start a fresh session over freshly loaded problems.
    ///
    /// # Errors
    ///
    /// Returns `StartError::Empty` if `problems` is empty.
    pub fn start(settings: &StudySettings, problems: Vec<Problem>) -> Result<Self, StartError> {
        Self::from_parts(
            settings.key(),
            problems.into_iter().map(AnsweredProblem::unanswered).collect(),
            0,
            settings.time_budget_seconds(),
            settings.study_time_min(),
        )
    }

    /// Rebuild a session from a continue snapshot.
    ///
    /// The running tally is derived from the recorded answers, so it matches what an
    /// uninterrupted session would show at the same index.
    ///
    /// # Errors
    ///
    /// Returns `StartError` if the snapshot has no problems or points past its end.
    pub fn resume(entry: &ContinueEntry) -> Result<Self, StartError> {
        let remaining = entry
            .remaining_time_seconds
            .or_else(|| entry.study_time_min.map(|min| min.saturating_mul(60)));
        Self::from_parts(
            entry.key(),
            entry.problems.clone(),
            entry.current,
            remaining,
            entry.study_time_min,
        )
    }

    /// Build a session from a caller-supplied list and start index.
    ///
    /// # Errors
    ///
    /// Returns `StartError::Empty` for an empty list and
    /// `StartError::StartIndexOutOfRange` if `start_index` is past the end.
    pub fn from_parts(
        key: SessionKey,
        problems: Vec<AnsweredProblem>,
        start_index: usize,
        remaining_time_seconds: Option<u32>,
        study_time_min: Option<u32>,
    ) -> Result<Self, StartError> {
        if problems.is_empty() {
            return Err(StartError::Empty);
        }
        if start_index >= problems.len() {
            return Err(StartError::StartIndexOutOfRange {
                index: start_index,
                len: problems.len(),
            });
        }

        let mut state = Self {
            subject: key.subject,
            difficulty: key.difficulty,
            mode: key.mode,
            problems,
            current_index: start_index,
            selection: None,
            submitted: false,
            remaining_time_seconds,
            study_time_min,
            completed: false,
        };
        state.restore_transient();
        Ok(state)
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
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.subject.clone(), self.difficulty, self.mode)
    }

    #[must_use]
    pub fn problems(&self) -> &[AnsweredProblem] {
        &self.problems
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current(&self) -> &AnsweredProblem {
        &self.problems[self.current_index]
    }

    #[must_use]
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Always false in exam mode.
    #[must_use]
    pub fn submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn remaining_time_seconds(&self) -> Option<u32> {
        self.remaining_time_seconds
    }

    #[must_use]
    pub fn study_time_min(&self) -> Option<u32> {
        self.study_time_min
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.problems.len()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.completed {
            SessionPhase::Completed
        } else if self.selection.is_none() {
            SessionPhase::AwaitingAnswer
        } else if self.mode.is_quiz() && !self.submitted {
            SessionPhase::AwaitingSubmit
        } else {
            SessionPhase::AwaitingAdvance
        }
    }

    /// `(current_index + 1) / total * 100`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        (self.current_index + 1) as f64 / self.problems.len() as f64 * 100.0
    }

    /// Score over every recorded answer so far.
    #[must_use]
    pub fn running_tally(&self) -> Tally {
        Tally::replay(&self.problems)
    }

    /// Feedback for the submitted quiz answer, judged only on the locked-in selection.
    #[must_use]
    pub fn feedback(&self) -> Option<Feedback<'_>> {
        if self.completed || !self.mode.is_quiz() || !self.submitted {
            return None;
        }
        let selected = self.selection?;
        let problem = &self.current().problem;
        Some(Feedback {
            selected,
            correct_index: problem.correct_index(),
            is_correct: problem.is_correct(Some(selected)),
            explanation: problem.explanation(),
        })
    }

    /// Snapshot for resuming later. `None` once the session is completed.
    #[must_use]
    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> Option<ContinueEntry> {
        if self.completed {
            return None;
        }
        Some(ContinueEntry {
            subject: self.subject.clone(),
            difficulty: self.difficulty,
            mode: self.mode,
            current: self.current_index,
            total: self.problems.len(),
            progress_percent: self.progress_percent(),
            correct_rate: self.running_tally().correct_rate_percent(),
            problems: self.problems.clone(),
            remaining_time_seconds: self.remaining_time_seconds,
            study_time_min: self.study_time_min,
            saved_at,
        })
    }

    /// Apply one event.
    ///
    /// Events that do not apply in the current mode or phase are no-ops and return the
    /// state unchanged with no effects. Every event is a no-op once completed.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` when the event is rejected; `self` is left as it was.
    pub fn apply(&self, event: SessionEvent) -> Result<Transition, TransitionError> {
        let mut next = self.clone();
        if next.completed {
            return Ok(Transition::unchanged(next));
        }

        let mut effects = Vec::new();
        match event {
            SessionEvent::Select(index) => {
                // A first-pass quiz answer is locked once submitted. A revisited one can
                // be changed, but needs a fresh submit.
                let revisited = next.current().user_selected_index.is_some();
                if next.mode.is_quiz() && next.submitted && !revisited {
                    return Ok(Transition::unchanged(next));
                }
                next.current().problem.check_choice(index)?;
                if next.selection != Some(index) {
                    next.selection = Some(index);
                    next.submitted = false;
                }
            }
            SessionEvent::Submit => {
                if !next.mode.is_quiz() || next.submitted {
                    return Ok(Transition::unchanged(next));
                }
                if next.selection.is_none() {
                    return Err(TransitionError::NoSelection);
                }
                next.submitted = true;
            }
            SessionEvent::Advance => {
                if next.mode.is_quiz() && !next.submitted {
                    return Err(TransitionError::SubmitRequired);
                }
                let selected = next.selection.ok_or(TransitionError::NoSelection)?;
                next.lock_current(selected, &mut effects);
                if next.is_last() {
                    next.finalize(&mut effects);
                } else {
                    next.current_index += 1;
                    next.restore_transient();
                }
            }
            SessionEvent::Retreat => {
                if next.current_index == 0 {
                    return Ok(Transition::unchanged(next));
                }
                next.current_index -= 1;
                next.restore_transient();
            }
            SessionEvent::Tick => {
                let Some(remaining) = next.remaining_time_seconds else {
                    return Ok(Transition::unchanged(next));
                };
                let remaining = remaining.saturating_sub(1);
                next.remaining_time_seconds = Some(remaining);
                if remaining == 0 && !next.mode.is_quiz() {
                    next.expire(&mut effects);
                }
            }
            SessionEvent::TimeExpire => {
                if next.mode.is_quiz() {
                    return Ok(Transition::unchanged(next));
                }
                next.expire(&mut effects);
            }
        }

        Ok(Transition {
            state: next,
            effects,
        })
    }

    fn lock_current(&mut self, selected: usize, effects: &mut Vec<Effect>) {
        let answered = &mut self.problems[self.current_index];
        answered.user_selected_index = Some(selected);
        let problem = &answered.problem;
        effects.push(Effect::Reconcile {
            entry: WrongEntry::new(
                self.subject.clone(),
                problem.id().clone(),
                self.difficulty,
            ),
            correct: problem.is_correct(Some(selected)),
        });
    }

    fn expire(&mut self, effects: &mut Vec<Effect>) {
        if let Some(selected) = self.selection {
            self.lock_current(selected, effects);
        }
        self.finalize(effects);
    }

    fn finalize(&mut self, effects: &mut Vec<Effect>) {
        self.completed = true;
        self.selection = None;
        self.submitted = false;
        effects.push(Effect::Completed(SessionResult {
            tally: Tally::score_all(&self.problems),
            problems: self.problems.clone(),
            subject: self.subject.clone(),
            difficulty: self.difficulty,
            mode: self.mode,
        }));
    }

    /// Recall the recorded answer for the current problem, or clear transient flags.
    fn restore_transient(&mut self) {
        let recorded = self.problems[self.current_index].user_selected_index;
        self.selection = recorded;
        self.submitted = recorded.is_some() && self.mode.is_quiz();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
