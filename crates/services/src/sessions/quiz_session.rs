use quiz_core::model::{AnsweredProblem, SessionKey, SessionResult, Tally};
use quiz_core::session::{Effect, Feedback, SessionPhase, SessionState, Transition};

/// A running quiz or exam, driven through `SessionController`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    state: SessionState,
    result: Option<SessionResult>,
}

impl QuizSession {
    pub(crate) fn new(state: SessionState) -> Self {
        Self {
            state,
            result: None,
        }
    }

    /// Adopt the next state, keeping the first completion result seen, and hand back
    /// the effects still to be carried out.
    pub(crate) fn commit(&mut self, transition: Transition) -> Vec<Effect> {
        if self.result.is_none() {
            self.result = transition.result().cloned();
        }
        self.state = transition.state;
        transition.effects
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn key(&self) -> SessionKey {
        self.state.key()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn current(&self) -> &AnsweredProblem {
        self.state.current()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<Feedback<'_>> {
        self.state.feedback()
    }

    #[must_use]
    pub fn running_tally(&self) -> Tally {
        self.state.running_tally()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    /// The final result, present once the session has completed.
    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }
}
