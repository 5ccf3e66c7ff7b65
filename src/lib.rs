//! # netprop-db: Node Property Persistence for Network Simulations
//!
//! **Version**: 0.1.0
//!
//! netprop-db stores the hierarchical node-property model of a network or
//! epidemic simulation experiment as a set of named, tagged JSON documents,
//! and rebuilds a validated model from them.
//!
//! ## Design Principles
//!
//! - **One validation path**: reconstruction replays documents through the
//!   same [`BuildSession`](session::BuildSession) used to build experiments by hand
//! - **Dependency order**: properties are rebuilt in ascending dependency level,
//!   so every condition resolves against already-built properties
//! - **All or nothing**: a load yields a complete experiment or an error, never
//!   a partial model
//!
//! ## Example Usage
//!
//! ```rust
//! use netprop_db::model::{ProbabilityMap, PropertyKind};
//! use netprop_db::session::BuildSession;
//! use netprop_db::store::MemoryDocumentStore;
//! use netprop_db::Repository;
//!
//! # fn example() -> netprop_db::Result<()> {
//! let mut session = BuildSession::new("seir");
//! session.new_property("gender", PropertyKind::Enumerator, "Biological sex")?;
//! let male = session.add_range("male")?;
//! let female = session.add_range("female")?;
//! session.set_default_distribution(ProbabilityMap::new().with(male, 1.0).with(female, 1.0))?;
//! session.commit()?;
//! let experiment = session.into_experiment()?;
//!
//! let repository = Repository::builder(MemoryDocumentStore::new()).build();
//! repository.save(&experiment)?;
//!
//! let restored = repository.load("seir")?;
//! assert_eq!(restored.snapshot(), experiment.snapshot());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod codec;
pub mod engine;
pub mod error;
pub mod model;
pub mod session;
pub mod store;

pub use error::{Error, ErrorKind, ReferenceKind, Result};

use tracing::info;

use codec::{Codec, DocumentSet};
use model::Experiment;
use session::BuildSession;
use store::DocumentStore;

/// Experiment repository over a document store.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    codec: Codec,
}

impl<S: DocumentStore> Repository<S> {
    /// Create a new repository builder
    #[must_use]
    pub fn builder(store: S) -> RepositoryBuilder<S> {
        RepositoryBuilder {
            store,
            codec: Codec::new(),
        }
    }

    /// Serialize and store an experiment, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the store write fails.
    pub fn save(&self, experiment: &Experiment) -> Result<()> {
        let documents = engine::serialize(experiment)?;
        let raw = self.codec.encode_all(&documents)?;
        self.store.store(experiment.name(), &raw)?;
        info!(
            experiment = %experiment.name(),
            documents = raw.len(),
            "Experiment saved"
        );
        Ok(())
    }

    /// Load and decode the documents of an experiment without rebuilding it.
    ///
    /// Documents with an unrecognized type tag are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the experiment is absent or a document is not a
    /// valid envelope.
    pub fn load_documents(&self, name: &str) -> Result<DocumentSet> {
        let raw = self.store.load(name)?;
        self.codec.decode_all(&raw)
    }

    /// Load and rebuild an experiment.
    ///
    /// # Errors
    ///
    /// Returns error if the experiment is absent, a document is malformed, a
    /// reference does not resolve, or a property violates a model invariant.
    pub fn load(&self, name: &str) -> Result<Experiment> {
        let documents = self.load_documents(name)?;
        engine::reconstruct(name, &documents)
    }

    /// Names of all stored experiments.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be listed.
    pub fn experiment_names(&self) -> Result<Vec<String>> {
        self.store.list_names()
    }

    /// Load an experiment and open a session for editing it.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn open_session(&self, name: &str) -> Result<BuildSession> {
        Ok(BuildSession::from_experiment(self.load(name)?))
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Codec used for encoding and decoding.
    #[must_use]
    pub const fn codec(&self) -> &Codec {
        &self.codec
    }
}

/// Repository builder
#[derive(Debug)]
pub struct RepositoryBuilder<S> {
    store: S,
    codec: Codec,
}

impl<S: DocumentStore> RepositoryBuilder<S> {
    /// Also accept type tags qualified with `namespace` when loading
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.codec = self.codec.with_namespace(namespace);
        self
    }

    /// Write pretty-printed documents
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.codec = self.codec.pretty(pretty);
        self
    }

    /// Build the repository
    #[must_use]
    pub fn build(self) -> Repository<S> {
        Repository {
            store: self.store,
            codec: self.codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[test]
    fn test_builder_configures_codec() {
        let repository = Repository::builder(MemoryDocumentStore::new())
            .namespace("legacy.")
            .pretty(true)
            .build();
        assert!(repository
            .codec()
            .namespaces()
            .iter()
            .any(|namespace| namespace == "legacy."));
        assert!(repository.store().is_empty());
    }

    #[test]
    fn test_load_missing_experiment() {
        let repository = Repository::builder(MemoryDocumentStore::new()).build();
        let err = repository.load("absent").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
    }

    #[test]
    fn test_save_then_list() {
        let repository = Repository::builder(MemoryDocumentStore::new()).build();
        repository.save(&Experiment::new("empty")).unwrap();
        assert_eq!(repository.experiment_names().unwrap(), vec!["empty"]);
        let restored = repository.load("empty").unwrap();
        assert_eq!(restored.name(), "empty");
        assert!(restored.properties().is_empty());
    }
}
