mod controller;
mod quiz_session;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::SessionController;
pub use quiz_session::QuizSession;
