use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog identifier for a problem (e.g. `os_e_02`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(String);

impl ProblemId {
    /// Creates a new `ProblemId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Subject key used to address the problem catalog (e.g. `os`, `ds`, `web`).
///
/// Always non-empty and trimmed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
    /// Creates a subject from a raw key.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the key is blank.
    pub fn new(key: impl Into<String>) -> Result<Self, ParseIdError> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "Subject".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-facing label for the known subjects; unknown keys label as themselves.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.0.as_str() {
            "os" => "운영체제",
            "ds" => "자료구조",
            "web" => "웹프레임워크",
            other => other,
        }
    }
}

impl TryFrom<String> for Subject {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.0
    }
}

impl fmt::Debug for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProblemId({})", self.0)
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subject({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an identifier from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ProblemId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "ProblemId".to_string(),
            });
        }
        Ok(ProblemId::new(trimmed))
    }
}

impl FromStr for Subject {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_id_display() {
        let id = ProblemId::new("os_e_02");
        assert_eq!(id.to_string(), "os_e_02");
    }

    #[test]
    fn problem_id_from_str_rejects_blank() {
        assert!("   ".parse::<ProblemId>().is_err());
        assert_eq!("os_m_01".parse::<ProblemId>().unwrap(), ProblemId::new("os_m_01"));
    }

    #[test]
    fn subject_is_trimmed_and_labelled() {
        let subject: Subject = "  os ".parse().unwrap();
        assert_eq!(subject.as_str(), "os");
        assert_eq!(subject.label(), "운영체제");

        let custom = Subject::new("network").unwrap();
        assert_eq!(custom.label(), "network");
    }

    #[test]
    fn subject_rejects_blank() {
        assert!(Subject::new("").is_err());
    }

    #[test]
    fn subject_serde_rejects_blank() {
        let result: Result<Subject, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
        let ok: Subject = serde_json::from_str("\"ds\"").unwrap();
        assert_eq!(ok.as_str(), "ds");
    }
}
