use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use quiz_core::model::{Difficulty, Problem, Subject, WrongEntry};
use storage::catalog::{CatalogDocument, ProblemCatalog};

use crate::persistence::PersistenceBridge;

/// A missed problem, with its catalog content when the catalog still has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewNote {
    pub entry: WrongEntry,
    pub problem: Option<Problem>,
}

/// Lists and dismisses review notes.
#[derive(Clone)]
pub struct ReviewNoteService {
    persistence: PersistenceBridge,
    catalog: Arc<dyn ProblemCatalog>,
}

impl ReviewNoteService {
    #[must_use]
    pub fn new(persistence: PersistenceBridge, catalog: Arc<dyn ProblemCatalog>) -> Self {
        Self {
            persistence,
            catalog,
        }
    }

    /// Review notes matching the optional subject and difficulty filters, in the
    /// order they were recorded.
    pub async fn notes(
        &self,
        subject: Option<&Subject>,
        difficulty: Option<Difficulty>,
    ) -> Vec<ReviewNote> {
        let entries: Vec<WrongEntry> = self
            .persistence
            .wrong_entries()
            .await
            .into_iter()
            .filter(|entry| subject.is_none_or(|s| &entry.subject == s))
            .filter(|entry| difficulty.is_none_or(|d| entry.difficulty == d))
            .collect();

        let mut documents: HashMap<Subject, Option<CatalogDocument>> = HashMap::new();
        let mut notes = Vec::with_capacity(entries.len());
        for entry in entries {
            if !documents.contains_key(&entry.subject) {
                let document = self.document(&entry.subject).await;
                documents.insert(entry.subject.clone(), document);
            }
            let problem = documents
                .get(&entry.subject)
                .and_then(Option::as_ref)
                .and_then(|doc| doc.find(&entry.subject, &entry.id));
            notes.push(ReviewNote { entry, problem });
        }
        notes
    }

    /// Drop a note once the learner has reviewed it.
    pub async fn dismiss(&self, entry: &WrongEntry) {
        self.persistence.remove_wrong(entry).await;
    }

    async fn document(&self, subject: &Subject) -> Option<CatalogDocument> {
        match self.catalog.document(subject).await {
            Ok(document) => document,
            Err(err) => {
                warn!(%subject, error = %err, "review notes shown without catalog content");
                None
            }
        }
    }
}
