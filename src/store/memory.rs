//! In-memory document store using `DashMap`.
//!
//! Data is lost on process restart. For persistence, use
//! [`FileDocumentStore`](super::FileDocumentStore).

use dashmap::DashMap;
use tracing::debug;

use super::{validate_name, DocumentStore, RawDocuments};
use crate::{Error, Result};

/// In-memory document store.
///
/// Each experiment's documents are swapped in as a whole, so concurrent
/// readers never see a partially replaced set.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    experiments: DashMap<String, RawDocuments>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            experiments: DashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            experiments: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Whether no experiment is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Remove every experiment.
    pub fn clear(&self) {
        self.experiments.clear();
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn store(&self, experiment: &str, documents: &RawDocuments) -> Result<()> {
        validate_name(experiment)?;
        for name in documents.keys() {
            validate_name(name)?;
        }
        self.experiments
            .insert(experiment.to_string(), documents.clone());
        debug!(experiment, documents = documents.len(), "Experiment stored in memory");
        Ok(())
    }

    fn load(&self, experiment: &str) -> Result<RawDocuments> {
        let documents = self
            .experiments
            .get(experiment)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ExperimentNotFound(experiment.to_string()))?;
        debug!(experiment, documents = documents.len(), "Experiment loaded from memory");
        Ok(documents)
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .experiments
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
