use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::Subject;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySettingsError {
    #[error("subject is required")]
    MissingSubject,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("unknown study mode: {0}")]
    UnknownMode(String),

    #[error("study time must be between {min} and {max} minutes, got {got}")]
    InvalidStudyTime { min: u32, max: u32, got: u32 },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty bucket of the problem catalog.
///
/// Persisted and displayed with the Korean labels (`초급`, `중급`, `고급`);
/// the catalog addresses the same buckets as `easy`, `medium`, `hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "초급", alias = "easy")]
    Easy,
    #[serde(rename = "중급", alias = "medium")]
    Medium,
    #[serde(rename = "고급", alias = "hard")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "초급",
            Difficulty::Medium => "중급",
            Difficulty::Hard => "고급",
        }
    }

    /// Key of this bucket inside a catalog document.
    #[must_use]
    pub fn catalog_key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = StudySettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "초급" | "easy" => Ok(Difficulty::Easy),
            "중급" | "medium" => Ok(Difficulty::Medium),
            "고급" | "hard" => Ok(Difficulty::Hard),
            other => Err(StudySettingsError::UnknownDifficulty(other.to_string())),
        }
    }
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// How feedback is delivered during a session.
///
/// - `Quiz`: each answer is submitted and checked before moving on.
/// - `Exam`: feedback is withheld until the session completes or time runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    Quiz,
    Exam,
}

impl StudyMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StudyMode::Quiz => "quiz",
            StudyMode::Exam => "exam",
        }
    }

    #[must_use]
    pub fn is_quiz(self) -> bool {
        matches!(self, StudyMode::Quiz)
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyMode {
    type Err = StudySettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "quiz" => Ok(StudyMode::Quiz),
            "exam" => Ok(StudyMode::Exam),
            other => Err(StudySettingsError::UnknownMode(other.to_string())),
        }
    }
}

//
// ─── SESSION KEY ───────────────────────────────────────────────────────────────
//

/// Identifies a resumable session: at most one continue entry exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub mode: StudyMode,
}

impl SessionKey {
    #[must_use]
    pub fn new(subject: Subject, difficulty: Difficulty, mode: StudyMode) -> Self {
        Self {
            subject,
            difficulty,
            mode,
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

pub const MIN_STUDY_TIME_MIN: u32 = 10;
pub const MAX_STUDY_TIME_MIN: u32 = 120;

/// Validated request to start a study session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySettings {
    subject: Subject,
    difficulty: Difficulty,
    mode: StudyMode,
    study_time_min: Option<u32>,
}

/// Unvalidated start request, as collected from the course picker.
#[derive(Debug, Clone, Default)]
pub struct StudySettingsDraft {
    pub subject: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub mode: Option<StudyMode>,
    pub study_time_min: Option<u32>,
}

impl StudySettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft.
    ///
    /// Difficulty defaults to `Easy` and mode to `Quiz` when not picked.
    ///
    /// # Errors
    ///
    /// Returns `StudySettingsError::MissingSubject` when no subject was chosen and
    /// `StudySettingsError::InvalidStudyTime` when the time budget is out of range.
    pub fn validate(self) -> Result<StudySettings, StudySettingsError> {
        let subject = self
            .subject
            .and_then(|raw| Subject::new(raw).ok())
            .ok_or(StudySettingsError::MissingSubject)?;

        if let Some(minutes) = self.study_time_min {
            if !(MIN_STUDY_TIME_MIN..=MAX_STUDY_TIME_MIN).contains(&minutes) {
                return Err(StudySettingsError::InvalidStudyTime {
                    min: MIN_STUDY_TIME_MIN,
                    max: MAX_STUDY_TIME_MIN,
                    got: minutes,
                });
            }
        }

        Ok(StudySettings {
            subject,
            difficulty: self.difficulty.unwrap_or(Difficulty::Easy),
            mode: self.mode.unwrap_or(StudyMode::Quiz),
            study_time_min: self.study_time_min,
        })
    }
}

impl StudySettings {
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
    pub fn study_time_min(&self) -> Option<u32> {
        self.study_time_min
    }

    /// Time budget in seconds, if one was configured.
    #[must_use]
    pub fn time_budget_seconds(&self) -> Option<u32> {
        self.study_time_min.map(|min| min.saturating_mul(60))
    }

    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.subject.clone(), self.difficulty, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_both_forms() {
        assert_eq!("초급".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_serializes_as_label_and_accepts_catalog_key() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"중급\"");
        let parsed: Difficulty = serde_json::from_str("\"easy\"").unwrap();
        assert_eq!(parsed, Difficulty::Easy);
    }

    #[test]
    fn missing_subject_is_rejected() {
        let err = StudySettingsDraft::new().validate().unwrap_err();
        assert_eq!(err, StudySettingsError::MissingSubject);

        let blank = StudySettingsDraft {
            subject: Some("  ".into()),
            ..StudySettingsDraft::default()
        };
        assert_eq!(blank.validate().unwrap_err(), StudySettingsError::MissingSubject);
    }

    #[test]
    fn study_time_is_bounded() {
        let draft = StudySettingsDraft {
            subject: Some("os".into()),
            study_time_min: Some(5),
            ..StudySettingsDraft::default()
        };
        assert!(matches!(
            draft.validate(),
            Err(StudySettingsError::InvalidStudyTime { got: 5, .. })
        ));
    }

    #[test]
    fn defaults_fill_difficulty_and_mode() {
        let settings = StudySettingsDraft {
            subject: Some("ds".into()),
            study_time_min: Some(30),
            ..StudySettingsDraft::default()
        }
        .validate()
        .unwrap();

        assert_eq!(settings.difficulty(), Difficulty::Easy);
        assert_eq!(settings.mode(), StudyMode::Quiz);
        assert_eq!(settings.time_budget_seconds(), Some(1800));
    }
}
