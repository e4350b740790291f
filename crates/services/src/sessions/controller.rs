use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{ContinueEntry, HistoryEntry, SessionKey, StudySettings};
use quiz_core::session::{Effect, SessionEvent, SessionPhase, SessionState};

use super::quiz_session::QuizSession;
use crate::error::SessionError;
use crate::persistence::PersistenceBridge;
use crate::problem_source::ProblemSource;

/// Starts, resumes and drives quiz sessions, carrying out their persistence effects.
#[derive(Clone)]
pub struct SessionController {
    clock: Clock,
    problems: ProblemSource,
    persistence: PersistenceBridge,
}

impl SessionController {
    #[must_use]
    pub fn new(clock: Clock, problems: ProblemSource, persistence: PersistenceBridge) -> Self {
        Self {
            clock,
            problems,
            persistence,
        }
    }

    /// Start a fresh session for validated settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` when no problems match and
    /// `SessionError::Catalog` when the catalog cannot be read.
    pub async fn start(&self, settings: &StudySettings) -> Result<QuizSession, SessionError> {
        let problems = self
            .problems
            .load(settings.subject(), settings.difficulty())
            .await?;
        let state = SessionState::start(settings, problems)?;
        info!(
            subject = %settings.subject(),
            difficulty = %settings.difficulty(),
            mode = %settings.mode(),
            total = state.total(),
            "session started"
        );
        Ok(QuizSession::new(state))
    }

    /// Resume from a continue snapshot. The problem list is taken as saved, uncapped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Start` if the snapshot is empty or points past its end.
    pub fn resume(&self, entry: &ContinueEntry) -> Result<QuizSession, SessionError> {
        let state = SessionState::resume(entry)?;
        info!(
            subject = %entry.subject,
            difficulty = %entry.difficulty,
            mode = %entry.mode,
            current = entry.current,
            "session resumed"
        );
        Ok(QuizSession::new(state))
    }

    /// Resume the saved session for `key`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Start` if the stored snapshot cannot be resumed.
    pub async fn resume_key(&self, key: &SessionKey) -> Result<Option<QuizSession>, SessionError> {
        match self.persistence.load_continue(key).await {
            Some(entry) => self.resume(&entry).map(Some),
            None => Ok(None),
        }
    }

    /// Saved sessions, most recent first.
    pub async fn list_resumable(&self) -> Vec<ContinueEntry> {
        self.persistence.continue_entries().await
    }

    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the option does not exist.
    pub async fn select(
        &self,
        session: &mut QuizSession,
        index: usize,
    ) -> Result<SessionPhase, SessionError> {
        self.apply(session, SessionEvent::Select(index)).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::Transition` if nothing is selected.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<SessionPhase, SessionError> {
        self.apply(session, SessionEvent::Submit).await
    }

    /// Record the current answer and move on, completing the session after the last problem.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if nothing is selected or a quiz answer was not
    /// submitted yet.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<SessionPhase, SessionError> {
        self.apply(session, SessionEvent::Advance).await
    }

    /// Go back one problem, recalling its recorded answer. No-op on the first problem.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the event is rejected.
    pub async fn retreat(&self, session: &mut QuizSession) -> Result<SessionPhase, SessionError> {
        self.apply(session, SessionEvent::Retreat).await
    }

    /// One second of the time budget elapsed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the event is rejected.
    pub async fn tick(&self, session: &mut QuizSession) -> Result<SessionPhase, SessionError> {
        self.apply(session, SessionEvent::Tick).await
    }

    /// End an exam whose time ran out. No-op in quiz mode.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the event is rejected.
    pub async fn time_expire(
        &self,
        session: &mut QuizSession,
    ) -> Result<SessionPhase, SessionError> {
        self.apply(session, SessionEvent::TimeExpire).await
    }

    /// Leave a session. Unless it completed, `persist` saves a continue snapshot,
    /// which is returned.
    pub async fn exit(&self, session: QuizSession, persist: bool) -> Option<ContinueEntry> {
        if !persist {
            debug!(key = ?session.key(), "session discarded");
            return None;
        }
        let entry = session.state().snapshot(self.clock.now())?;
        self.persistence.save_continue(&entry).await;
        info!(
            subject = %entry.subject,
            current = entry.current,
            total = entry.total,
            "session saved for later"
        );
        Some(entry)
    }

    async fn apply(
        &self,
        session: &mut QuizSession,
        event: SessionEvent,
    ) -> Result<SessionPhase, SessionError> {
        let transition = session.state().apply(event)?;
        let effects = session.commit(transition);
        for effect in effects {
            self.perform(effect).await;
        }
        Ok(session.phase())
    }

    async fn perform(&self, effect: Effect) {
        match effect {
            Effect::Reconcile { entry, correct } => {
                debug!(id = %entry.id, correct, "answer recorded");
                self.persistence.reconcile(&entry, correct).await;
            }
            Effect::Completed(result) => {
                let key = SessionKey::new(result.subject.clone(), result.difficulty, result.mode);
                self.persistence.delete_continue(&key).await;
                match HistoryEntry::from_result(&result, self.clock.now()) {
                    Ok(entry) => self.persistence.append_history(&entry).await,
                    Err(err) => warn!(error = %err, "completed session not added to history"),
                }
                info!(
                    subject = %result.subject,
                    correct = result.correct_count(),
                    wrong = result.wrong_count(),
                    score = result.total_score(),
                    "session completed"
                );
            }
        }
    }
}
