//! Document Store
//!
//! Stored documents are grouped by experiment name and keyed by document
//! name. Values are the encoded envelopes produced by
//! [`Codec`](crate::codec::Codec); the store never looks inside them.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use netprop_db::store::{DocumentStore, MemoryDocumentStore};
//!
//! # fn example() -> netprop_db::Result<()> {
//! let store = MemoryDocumentStore::new();
//!
//! let mut documents = BTreeMap::new();
//! documents.insert("NodeSettings".to_string(), "{}".to_string());
//! store.store("seir", &documents)?;
//!
//! assert_eq!(store.load("seir")?, documents);
//! assert_eq!(store.list_names()?, vec!["seir".to_string()]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod file;
mod memory;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Encoded documents of one experiment, keyed by document name.
pub type RawDocuments = BTreeMap<String, String>;

/// Persistence collaborator of [`Repository`](crate::Repository).
pub trait DocumentStore: Send + Sync {
    /// Replace every document stored under `experiment`.
    ///
    /// Readers observe either the previous documents or the new ones, never
    /// a mix.
    ///
    /// # Errors
    ///
    /// Returns error if a name is not a valid storage key or the backend
    /// fails.
    fn store(&self, experiment: &str, documents: &RawDocuments) -> Result<()>;

    /// Load every document stored under `experiment`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`] if nothing is stored under that
    /// name.
    fn load(&self, experiment: &str) -> Result<RawDocuments>;

    /// Names of all stored experiments, sorted.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be listed.
    fn list_names(&self) -> Result<Vec<String>>;

    /// Whether an experiment is stored under this name.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be listed.
    fn contains(&self, experiment: &str) -> Result<bool> {
        Ok(self.list_names()?.iter().any(|name| name == experiment))
    }
}

/// Reject names that cannot serve as a single path component.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("seir_2024").is_ok());
        assert!(validate_name("layer1.degree_distribution").is_ok());
        assert!(matches!(validate_name(""), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name(".hidden"), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("a/b"), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("a\\b"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_default_contains() {
        let store = MemoryDocumentStore::new();
        assert!(!store.contains("seir").unwrap());
        store.store("seir", &RawDocuments::new()).unwrap();
        assert!(store.contains("seir").unwrap());
    }
}
