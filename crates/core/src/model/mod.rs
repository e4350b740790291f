mod ids;
mod problem;
mod records;
mod result;
mod study;

pub use ids::{ParseIdError, ProblemId, Subject};
pub use problem::{AnsweredProblem, Problem, ProblemError};
pub use records::{ContinueEntry, WrongEntry};
pub use result::{HistoryEntry, HistoryEntryError, POINTS_PER_CORRECT, SessionResult, Tally};
pub use study::{
    Difficulty, MAX_STUDY_TIME_MIN, MIN_STUDY_TIME_MIN, SessionKey, StudyMode, StudySettings,
    StudySettingsDraft, StudySettingsError,
};
