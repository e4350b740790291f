#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod persistence;
pub mod problem_source;
pub mod review_note_service;
pub mod sessions;
pub mod stats_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError};
pub use persistence::PersistenceBridge;
pub use problem_source::{FRESH_PROBLEM_LIMIT, ProblemSource};
pub use review_note_service::{ReviewNote, ReviewNoteService};
pub use sessions::{QuizSession, SessionController};
pub use stats_service::StatsService;
