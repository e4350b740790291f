use std::sync::Arc;

use async_trait::async_trait;
use chrono::FixedOffset;
use quiz_core::model::{
    Difficulty, ProblemId, SessionKey, StudyMode, StudySettings, StudySettingsDraft,
    StudySettingsError, Subject, WrongEntry,
};
use quiz_core::session::SessionPhase;
use quiz_core::time::fixed_now;
use services::{AppServices, Clock, SessionError};
use storage::catalog::StaticCatalog;
use storage::repository::{KeyValueStore, Storage, StorageError};

const OS_CATALOG: &str = r#"{
    "easy": [
        { "id": "os_e_01", "question": "Which component schedules processes?", "choices": ["Shell", "Scheduler", "Compiler", "Linker"], "answerIndex": 1, "explanation": "The scheduler picks the next process." },
        { "id": "os_e_02", "question": "What does a page fault mean?", "choices": ["Disk full", "Page not in memory", "CPU overheat", "Bad pointer"], "answerIndex": 1 },
        { "id": "os_e_03", "question": "Which is not a process state?", "choices": ["Ready", "Running", "Compiling", "Blocked"], "answerIndex": 2 }
    ]
}"#;

fn os() -> Subject {
    Subject::new("os").unwrap()
}

fn settings(mode: StudyMode, minutes: Option<u32>) -> StudySettings {
    StudySettingsDraft {
        subject: Some("os".into()),
        difficulty: Some(Difficulty::Easy),
        mode: Some(mode),
        study_time_min: minutes,
    }
    .validate()
    .unwrap()
}

fn catalog(raw: &str) -> Arc<StaticCatalog> {
    Arc::new(StaticCatalog::new().with_json(os(), raw).unwrap())
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn services_over(storage: &Storage) -> AppServices {
    AppServices::new(storage, catalog(OS_CATALOG), Clock::fixed(fixed_now()), utc())
}

/// Store whose every operation fails, standing in for unavailable storage.
struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

#[tokio::test]
async fn exam_expiry_after_answering_both_scores_one_of_two() {
    let two_problems = r#"{ "easy": [
        { "id": "os_e_01", "question": "Q1", "choices": ["a", "b"], "answerIndex": 1 },
        { "id": "os_e_02", "question": "Q2", "choices": ["a", "b"], "answerIndex": 1 }
    ] }"#;
    let storage = Storage::in_memory();
    let app = AppServices::new(&storage, catalog(two_problems), Clock::fixed(fixed_now()), utc());
    let sessions = app.sessions();

    let mut session = sessions
        .start(&settings(StudyMode::Exam, Some(10)))
        .await
        .unwrap();
    sessions.select(&mut session, 1).await.unwrap();
    sessions.advance(&mut session).await.unwrap();
    sessions.select(&mut session, 0).await.unwrap();
    let phase = sessions.time_expire(&mut session).await.unwrap();

    assert_eq!(phase, SessionPhase::Completed);
    let result = session.result().expect("result emitted");
    assert_eq!(result.correct_count(), 1);
    assert_eq!(result.wrong_count(), 1);
    assert_eq!(result.total_score(), 10);

    let wrong = storage.study.list_wrong_entries().await.unwrap();
    assert_eq!(wrong.len(), 1);
    assert_eq!(wrong[0].id.as_str(), "os_e_02");

    let history = storage.study.list_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total(), 2);
}

#[tokio::test]
async fn quiz_advance_before_submit_is_a_precedence_error() {
    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let sessions = app.sessions();

    let mut session = sessions
        .start(&settings(StudyMode::Quiz, None))
        .await
        .unwrap();
    sessions.select(&mut session, 1).await.unwrap();

    let err = sessions.advance(&mut session).await.unwrap_err();
    assert!(err.is_precedence());
    assert_eq!(session.state().current_index(), 0);
    assert_eq!(session.phase(), SessionPhase::AwaitingSubmit);

    assert_eq!(
        sessions.submit(&mut session).await.unwrap(),
        SessionPhase::AwaitingAdvance
    );
    let feedback = session.feedback().expect("feedback after submit");
    assert!(feedback.is_correct);
    assert_eq!(
        feedback.explanation,
        Some("The scheduler picks the next process.")
    );

    sessions.advance(&mut session).await.unwrap();
    assert_eq!(session.state().current_index(), 1);
}

#[tokio::test]
async fn exit_and_resume_finishes_with_full_total() {
    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let sessions = app.sessions();

    let mut session = sessions
        .start(&settings(StudyMode::Quiz, None))
        .await
        .unwrap();
    sessions.select(&mut session, 0).await.unwrap();
    sessions.submit(&mut session).await.unwrap();
    sessions.advance(&mut session).await.unwrap();
    let tally_before = session.running_tally();

    let saved = sessions.exit(session, true).await.expect("snapshot saved");
    assert_eq!(saved.current, 1);
    assert_eq!(saved.total, 3);
    assert_eq!(sessions.list_resumable().await.len(), 1);

    let key = SessionKey::new(os(), Difficulty::Easy, StudyMode::Quiz);
    let mut resumed = sessions
        .resume_key(&key)
        .await
        .unwrap()
        .expect("resumable session");
    assert_eq!(resumed.state().current_index(), 1);
    assert_eq!(resumed.running_tally(), tally_before);

    for answer in [1, 2] {
        sessions.select(&mut resumed, answer).await.unwrap();
        sessions.submit(&mut resumed).await.unwrap();
        sessions.advance(&mut resumed).await.unwrap();
    }

    let result = resumed.result().expect("completed");
    assert_eq!(result.total(), 3);
    assert_eq!(result.correct_count() + result.wrong_count(), 3);
    assert_eq!(result.correct_count(), 2);
    assert!(sessions.list_resumable().await.is_empty());
    assert!(sessions.exit(resumed, true).await.is_none());
}

#[tokio::test]
async fn exit_without_persist_saves_nothing() {
    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let sessions = app.sessions();

    let session = sessions
        .start(&settings(StudyMode::Quiz, None))
        .await
        .unwrap();
    assert!(sessions.exit(session, false).await.is_none());
    assert!(sessions.list_resumable().await.is_empty());
}

#[tokio::test]
async fn reanswering_correctly_clears_the_review_note() {
    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let sessions = app.sessions();

    let mut session = sessions
        .start(&settings(StudyMode::Exam, Some(10)))
        .await
        .unwrap();
    sessions.select(&mut session, 0).await.unwrap();
    sessions.advance(&mut session).await.unwrap();
    assert_eq!(storage.study.list_wrong_entries().await.unwrap().len(), 1);

    sessions.retreat(&mut session).await.unwrap();
    sessions.select(&mut session, 0).await.unwrap();
    sessions.advance(&mut session).await.unwrap();
    assert_eq!(storage.study.list_wrong_entries().await.unwrap().len(), 1);

    sessions.retreat(&mut session).await.unwrap();
    sessions.select(&mut session, 1).await.unwrap();
    sessions.advance(&mut session).await.unwrap();
    assert!(storage.study.list_wrong_entries().await.unwrap().is_empty());
    assert_eq!(
        session.state().problems()[0].user_selected_index,
        Some(1)
    );
}

#[tokio::test]
async fn quiz_reanswer_after_going_back_replaces_the_wrong_answer() {
    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let sessions = app.sessions();

    let mut session = sessions
        .start(&settings(StudyMode::Quiz, None))
        .await
        .unwrap();
    sessions.select(&mut session, 0).await.unwrap();
    sessions.submit(&mut session).await.unwrap();
    sessions.advance(&mut session).await.unwrap();
    assert_eq!(storage.study.list_wrong_entries().await.unwrap().len(), 1);

    sessions.retreat(&mut session).await.unwrap();
    assert_eq!(
        sessions.select(&mut session, 1).await.unwrap(),
        SessionPhase::AwaitingSubmit
    );
    assert!(sessions.advance(&mut session).await.unwrap_err().is_precedence());
    sessions.submit(&mut session).await.unwrap();
    assert!(session.feedback().expect("fresh feedback").is_correct);
    sessions.advance(&mut session).await.unwrap();

    assert_eq!(session.state().current_index(), 1);
    assert_eq!(
        session.state().problems()[0].user_selected_index,
        Some(1)
    );
    assert_eq!(session.running_tally().correct_count, 1);
    assert!(storage.study.list_wrong_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_storage_never_interrupts_a_session() {
    let storage = Storage::from_store(Arc::new(UnavailableStore));
    let app = services_over(&storage);
    let sessions = app.sessions();

    assert!(sessions.list_resumable().await.is_empty());
    let mut session = sessions
        .start(&settings(StudyMode::Quiz, None))
        .await
        .unwrap();
    for answer in [1, 0, 2] {
        sessions.select(&mut session, answer).await.unwrap();
        sessions.submit(&mut session).await.unwrap();
        sessions.advance(&mut session).await.unwrap();
    }
    assert_eq!(session.result().unwrap().correct_count(), 2);

    let stats = app.stats().stats().await;
    assert_eq!(stats.total_problems, 0);
    assert!(app.reset_study_records().await.is_err());
}

#[tokio::test]
async fn stats_and_review_notes_reflect_completed_sessions() {
    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let sessions = app.sessions();

    let mut session = sessions
        .start(&settings(StudyMode::Quiz, None))
        .await
        .unwrap();
    for answer in [1, 0, 0] {
        sessions.select(&mut session, answer).await.unwrap();
        sessions.submit(&mut session).await.unwrap();
        sessions.advance(&mut session).await.unwrap();
    }

    let stats = app.stats().stats().await;
    assert_eq!(stats.today_problems, 3);
    assert_eq!(stats.total_correct, 1);
    assert_eq!(stats.streak_days, 1);
    let recent = app.stats().recent(5).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].wrong_count(), 2);

    let notes = app.review_notes().notes(Some(&os()), None).await;
    let ids: Vec<&str> = notes.iter().map(|n| n.entry.id.as_str()).collect();
    assert_eq!(ids, vec!["os_e_02", "os_e_03"]);
    assert_eq!(
        notes[0].problem.as_ref().map(|p| p.question()),
        Some("What does a page fault mean?")
    );
    assert!(
        app.review_notes()
            .notes(None, Some(Difficulty::Hard))
            .await
            .is_empty()
    );

    app.review_notes()
        .dismiss(&WrongEntry::new(os(), ProblemId::new("os_e_02"), Difficulty::Easy))
        .await;
    assert_eq!(app.review_notes().notes(None, None).await.len(), 1);

    app.reset_study_records().await.unwrap();
    assert_eq!(app.stats().stats().await.total_problems, 0);
    assert!(app.review_notes().notes(None, None).await.is_empty());
}

#[tokio::test]
async fn missing_subject_and_empty_bucket_are_reported() {
    let draft = StudySettingsDraft {
        subject: None,
        ..StudySettingsDraft::default()
    };
    let err = SessionError::from(draft.validate().unwrap_err());
    assert!(matches!(
        err,
        SessionError::InvalidRequest(StudySettingsError::MissingSubject)
    ));

    let storage = Storage::in_memory();
    let app = services_over(&storage);
    let hard = StudySettingsDraft {
        subject: Some("os".into()),
        difficulty: Some(Difficulty::Hard),
        mode: Some(StudyMode::Quiz),
        study_time_min: None,
    }
    .validate()
    .unwrap();
    let err = app.sessions().start(&hard).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound { .. }));
}
