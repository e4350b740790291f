//! Problem catalogs: one JSON document per subject with `easy`/`medium`/`hard` buckets.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quiz_core::model::{Difficulty, Problem, ProblemError, ProblemId, Subject};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("subject key {0:?} cannot name a catalog document")]
    InvalidSubject(String),

    #[error("failed to read catalog for {subject}: {message}")]
    Io { subject: String, message: String },

    #[error("malformed catalog for {subject}: {message}")]
    Parse { subject: String, message: String },
}

/// One catalog item as authored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProblem {
    pub id: ProblemId,
    pub question: String,
    #[serde(alias = "options")]
    pub choices: Vec<String>,
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl CatalogProblem {
    /// Validate the item into a domain problem.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError` if the item does not describe a valid multiple-choice problem.
    pub fn to_problem(
        &self,
        subject: &Subject,
        difficulty: Difficulty,
    ) -> Result<Problem, ProblemError> {
        Problem::new(
            self.id.clone(),
            subject.clone(),
            difficulty,
            self.question.clone(),
            self.choices.clone(),
            self.answer_index,
            self.explanation.clone(),
        )
    }
}

/// All problems of one subject, bucketed by difficulty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub easy: Vec<CatalogProblem>,
    #[serde(default)]
    pub medium: Vec<CatalogProblem>,
    #[serde(default)]
    pub hard: Vec<CatalogProblem>,
}

impl CatalogDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the text is not a catalog document.
    pub fn from_json(subject: &Subject, raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|e| CatalogError::Parse {
            subject: subject.to_string(),
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn bucket(&self, difficulty: Difficulty) -> &[CatalogProblem] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Valid problems of one bucket in catalog order. Invalid items are logged and skipped.
    #[must_use]
    pub fn problems(&self, subject: &Subject, difficulty: Difficulty) -> Vec<Problem> {
        self.bucket(difficulty)
            .iter()
            .filter_map(|item| match item.to_problem(subject, difficulty) {
                Ok(problem) => Some(problem),
                Err(err) => {
                    warn!(%subject, id = %item.id, error = %err, "skipping invalid catalog problem");
                    None
                }
            })
            .collect()
    }

    /// Look up a problem by id across all buckets.
    #[must_use]
    pub fn find(&self, subject: &Subject, id: &ProblemId) -> Option<Problem> {
        Difficulty::ALL.into_iter().find_map(|difficulty| {
            self.bucket(difficulty)
                .iter()
                .find(|item| &item.id == id)
                .and_then(|item| item.to_problem(subject, difficulty).ok())
        })
    }
}

/// Source of catalog documents.
#[async_trait]
pub trait ProblemCatalog: Send + Sync {
    /// Load the document for `subject`; `None` when the catalog has no such subject.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the document exists but cannot be read or parsed.
    async fn document(&self, subject: &Subject) -> Result<Option<CatalogDocument>, CatalogError>;
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    documents: HashMap<Subject, CatalogDocument>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(mut self, subject: Subject, document: CatalogDocument) -> Self {
        self.documents.insert(subject, document);
        self
    }

    /// Add a document parsed from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the text is not a catalog document.
    pub fn with_json(self, subject: Subject, raw: &str) -> Result<Self, CatalogError> {
        let document = CatalogDocument::from_json(&subject, raw)?;
        Ok(self.with_document(subject, document))
    }
}

#[async_trait]
impl ProblemCatalog for StaticCatalog {
    async fn document(&self, subject: &Subject) -> Result<Option<CatalogDocument>, CatalogError> {
        Ok(self.documents.get(subject).cloned())
    }
}

/// Catalog reading `<root>/<subject>.json` on every load.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, subject: &Subject) -> Result<PathBuf, CatalogError> {
        let key = subject.as_str();
        let safe = key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if !safe {
            return Err(CatalogError::InvalidSubject(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl ProblemCatalog for DirectoryCatalog {
    async fn document(&self, subject: &Subject) -> Result<Option<CatalogDocument>, CatalogError> {
        let path = self.path_for(subject)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no catalog document");
                return Ok(None);
            }
            Err(err) => {
                return Err(CatalogError::Io {
                    subject: subject.to_string(),
                    message: err.to_string(),
                });
            }
        };
        CatalogDocument::from_json(subject, &raw).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OS_JSON: &str = r#"{
        "easy": [
            { "id": "os_e_01", "question": "Q1", "choices": ["a", "b", "c"], "answerIndex": 1, "explanation": "because" },
            { "id": "os_e_02", "question": "Q2", "options": ["a", "b"], "answerIndex": 0, "type": "multiple" },
            { "id": "os_e_bad", "question": "Q3", "choices": ["a", "b"], "answerIndex": 5 }
        ],
        "hard": [
            { "id": "os_h_01", "question": "H1", "choices": ["x", "y"], "answerIndex": 1 }
        ]
    }"#;

    fn os() -> Subject {
        Subject::new("os").unwrap()
    }

    #[test]
    fn invalid_items_are_skipped_in_order() {
        let doc = CatalogDocument::from_json(&os(), OS_JSON).unwrap();
        let problems = doc.problems(&os(), Difficulty::Easy);
        let ids: Vec<&str> = problems.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["os_e_01", "os_e_02"]);
        assert_eq!(problems[0].explanation(), Some("because"));
        assert!(doc.problems(&os(), Difficulty::Medium).is_empty());
    }

    #[test]
    fn find_searches_every_bucket() {
        let doc = CatalogDocument::from_json(&os(), OS_JSON).unwrap();
        let found = doc.find(&os(), &ProblemId::new("os_h_01")).unwrap();
        assert_eq!(found.difficulty(), Difficulty::Hard);
        assert!(doc.find(&os(), &ProblemId::new("nope")).is_none());
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = CatalogDocument::from_json(&os(), "[1, 2]").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[tokio::test]
    async fn static_catalog_returns_known_subjects_only() {
        let catalog = StaticCatalog::new().with_json(os(), OS_JSON).unwrap();
        assert!(catalog.document(&os()).await.unwrap().is_some());
        let ds = Subject::new("ds").unwrap();
        assert!(catalog.document(&ds).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn directory_catalog_reads_subject_files() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("os.json"), OS_JSON)
            .await
            .unwrap();
        let catalog = DirectoryCatalog::new(dir.path());

        let doc = catalog.document(&os()).await.unwrap().unwrap();
        assert_eq!(doc.hard.len(), 1);

        let missing = Subject::new("web").unwrap();
        assert!(catalog.document(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn directory_catalog_rejects_path_like_subjects() {
        let catalog = DirectoryCatalog::new("unused");
        let sneaky = Subject::new("../secrets").unwrap();
        assert!(matches!(
            catalog.document(&sneaky).await,
            Err(CatalogError::InvalidSubject(_))
        ));
    }
}
