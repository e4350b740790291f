#![forbid(unsafe_code)]

pub mod catalog;
pub mod repository;
pub mod sqlite;
pub mod study;

pub use catalog::{CatalogDocument, CatalogError, DirectoryCatalog, ProblemCatalog, StaticCatalog};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError, StudyRepository};
pub use study::KvStudyRepository;
