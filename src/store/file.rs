//! Directory-backed document store.
//!
//! Layout: one directory per experiment under the store root, one
//! `<document>.json` file per document.
//!
//! ```text
//! root/
//! ├── seir/
//! │   ├── NodeSettings.json
//! │   └── risk_days_distribution.json
//! └── sir/
//!     └── NodeSettings.json
//! ```
//!
//! A store first writes every document into a hidden `.<experiment>.staging`
//! directory. The current version is then renamed aside to
//! `.<experiment>.previous`, the staging directory is renamed into place, and
//! the previous version is deleted. A crash between the two renames leaves
//! the experiment directory absent; [`load`](DocumentStore::load) then reads
//! the previous version instead. Hidden entries are ignored by
//! [`list_names`](DocumentStore::list_names).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{validate_name, DocumentStore, RawDocuments};
use crate::{Error, Result};

const EXTENSION: &str = "json";

/// Document store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    /// Open an existing store root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if `root` does not exist and
    /// [`Error::NotADirectory`] if it is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|err| {
            Error::StoreUnavailable(format!("{}: {err}", root.display()))
        })?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        Ok(Self { root })
    }

    /// Create the store root (and parents) if needed, then open it.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or is not a directory.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
            info!(root = %root.display(), "Created document store root");
        }
        Self::open(root)
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn experiment_dir(&self, experiment: &str) -> PathBuf {
        self.root.join(experiment)
    }

    fn staging_dir(&self, experiment: &str) -> PathBuf {
        self.root.join(format!(".{experiment}.staging"))
    }

    fn previous_dir(&self, experiment: &str) -> PathBuf {
        self.root.join(format!(".{experiment}.previous"))
    }
}

impl DocumentStore for FileDocumentStore {
    fn store(&self, experiment: &str, documents: &RawDocuments) -> Result<()> {
        validate_name(experiment)?;
        for name in documents.keys() {
            validate_name(name)?;
        }

        let staging = self.staging_dir(experiment);
        remove_if_present(&staging)?;
        fs::create_dir(&staging)?;
        for (name, text) in documents {
            fs::write(staging.join(format!("{name}.{EXTENSION}")), text)?;
        }

        let target = self.experiment_dir(experiment);
        let previous = self.previous_dir(experiment);
        remove_if_present(&previous)?;
        match fs::rename(&target, &previous) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(err.into()),
            _ => {}
        }
        fs::rename(&staging, &target)?;
        remove_if_present(&previous)?;

        debug!(
            experiment,
            documents = documents.len(),
            path = %target.display(),
            "Experiment stored"
        );
        Ok(())
    }

    fn load(&self, experiment: &str) -> Result<RawDocuments> {
        validate_name(experiment)?;
        let mut dir = self.experiment_dir(experiment);
        let metadata = match fs::metadata(&dir) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let previous = self.previous_dir(experiment);
                match fs::metadata(&previous) {
                    Ok(metadata) if metadata.is_dir() => {
                        warn!(experiment, "Interrupted store detected, reading previous version");
                        dir = previous;
                        metadata
                    }
                    _ => return Err(Error::ExperimentNotFound(experiment.to_string())),
                }
            }
            Err(err) => return Err(err.into()),
        };
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(dir));
        }

        let mut documents = RawDocuments::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            documents.insert(name.to_string(), fs::read_to_string(&path)?);
        }

        debug!(experiment, documents = documents.len(), "Experiment loaded");
        Ok(documents)
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(matches!(
            FileDocumentStore::open(&missing),
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_open_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.txt");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            FileDocumentStore::open(&file),
            Err(Error::NotADirectory(path)) if path == file
        ));
    }

    #[test]
    fn test_staging_directory_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::create(dir.path().join("root")).unwrap();

        let mut documents = RawDocuments::new();
        documents.insert("NodeSettings".to_string(), "{}".to_string());
        store.store("seir", &documents).unwrap();

        assert!(!store.staging_dir("seir").exists());
        assert!(!store.previous_dir("seir").exists());
        assert!(store.root().join("seir").join("NodeSettings.json").is_file());
    }

    #[test]
    fn test_replace_keeps_no_previous_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();

        let mut documents = RawDocuments::new();
        documents.insert("NodeSettings".to_string(), "{}".to_string());
        store.store("seir", &documents).unwrap();
        documents.insert("NodeSettings".to_string(), "[]".to_string());
        store.store("seir", &documents).unwrap();

        assert_eq!(store.load("seir").unwrap(), documents);
        assert!(!store.previous_dir("seir").exists());
    }

    #[test]
    fn test_interrupted_swap_reads_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();

        // state after the old version moved aside but before the new one landed
        let previous = store.previous_dir("seir");
        fs::create_dir(&previous).unwrap();
        fs::write(previous.join("NodeSettings.json"), "{}").unwrap();

        let documents = store.load("seir").unwrap();
        assert_eq!(documents["NodeSettings"], "{}");
        assert!(store.list_names().unwrap().is_empty());
    }

    #[test]
    fn test_non_json_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        fs::create_dir(dir.path().join("seir")).unwrap();
        fs::write(dir.path().join("seir").join("notes.txt"), "hi").unwrap();
        fs::write(dir.path().join("seir").join("NodeSettings.json"), "{}").unwrap();

        let documents = store.load("seir").unwrap();
        assert_eq!(documents.keys().collect::<Vec<_>>(), vec!["NodeSettings"]);
    }
}
