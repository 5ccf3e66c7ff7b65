//! Error types for netprop-db
//!
//! Every failure falls into one of three kinds (see [`ErrorKind`]): the
//! environment the documents live in, the structure of a document, or a
//! reference that does not resolve among already-built entities.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::session::BuildError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length of a document fragment carried by a structural error.
pub const FRAGMENT_LIMIT: usize = 240;

/// netprop-db error types
#[derive(Error, Debug)]
pub enum Error {
    /// Document store cannot be reached
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    /// No experiment stored under this name
    #[error("Experiment not found: {0}")]
    ExperimentNotFound(String),

    /// Store root or experiment path is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Experiment or document name unusable as a storage key
    #[error("Invalid name `{0}`: names must be non-empty, must not start with '.', and must not contain path separators")]
    InvalidName(String),

    /// Document is missing a field, has an unexpected tag, or breaks an ordering invariant
    #[error("Malformed document `{document}` at `{field}`: {reason}\nFragment: {fragment}")]
    Structural {
        /// Document name
        document: String,
        /// Offending field
        field: String,
        /// What is wrong
        reason: String,
        /// Compact JSON snapshot of the malformed fragment
        fragment: String,
    },

    /// Name or label reference does not resolve
    #[error("Unresolved {kind} `{reference}`: {context}")]
    Unresolved {
        /// What kind of reference failed
        kind: ReferenceKind,
        /// The reference as written
        reference: String,
        /// Where it was used
        context: String,
    },

    /// Property definition rejected by the build session
    #[error("Invalid property definition: {0}")]
    Build(#[from] BuildError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The three failure kinds of a load or save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store unreachable, experiment absent, bad path.
    Environment,
    /// Missing field, unknown tag, broken ordering or model invariant.
    Structural,
    /// Unresolved property name, range label, distribution ID or binding.
    Referential,
}

/// Kinds of cross-document references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Property name in a condition
    PropertyName,
    /// Range label in a condition or sample
    RangeLabel,
    /// `DistributionID` of a property
    DistributionId,
    /// `BindToPropertyName` of a distribution
    BoundProperty,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PropertyName => "property name",
            Self::RangeLabel => "range label",
            Self::DistributionId => "distribution ID",
            Self::BoundProperty => "bound property name",
        })
    }
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreUnavailable(_)
            | Self::ExperimentNotFound(_)
            | Self::NotADirectory(_)
            | Self::InvalidName(_)
            | Self::Io(_) => ErrorKind::Environment,
            Self::Unresolved { .. }
            | Self::Build(BuildError::IllegalDependency { .. } | BuildError::UnknownProperty { .. }) => {
                ErrorKind::Referential
            }
            Self::Structural { .. } | Self::Build(_) | Self::Json(_) => ErrorKind::Structural,
        }
    }

    pub(crate) fn structural(
        document: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
        fragment: &serde_json::Value,
    ) -> Self {
        Self::Structural {
            document: document.into(),
            field: field.into(),
            reason: reason.into(),
            fragment: truncate_fragment(fragment.to_string()),
        }
    }

    pub(crate) fn unresolved(
        kind: ReferenceKind,
        reference: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::Unresolved {
            kind,
            reference: reference.into(),
            context: context.into(),
        }
    }
}

fn truncate_fragment(mut fragment: String) -> String {
    if fragment.len() > FRAGMENT_LIMIT {
        let mut cut = FRAGMENT_LIMIT;
        while !fragment.is_char_boundary(cut) {
            cut -= 1;
        }
        fragment.truncate(cut);
        fragment.push_str("...");
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_truncated() {
        let long = serde_json::Value::String("x".repeat(FRAGMENT_LIMIT * 2));
        let Error::Structural { fragment, .. } =
            Error::structural("NodeSettings", "Object", "bad", &long)
        else {
            panic!("expected structural error");
        };
        assert_eq!(fragment.len(), FRAGMENT_LIMIT + 3);
        assert!(fragment.ends_with("..."));
    }

    #[test]
    fn test_fragment_truncation_respects_char_boundary() {
        let long = serde_json::Value::String("é".repeat(FRAGMENT_LIMIT));
        let Error::Structural { fragment, .. } = Error::structural("d", "f", "r", &long) else {
            panic!("expected structural error");
        };
        assert!(fragment.ends_with("..."));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::ExperimentNotFound("x".into()).kind(),
            ErrorKind::Environment
        );
        assert_eq!(
            Error::unresolved(ReferenceKind::RangeLabel, "male", "condition").kind(),
            ErrorKind::Referential
        );
        assert_eq!(
            Error::Build(BuildError::MissingInitValue("f".into())).kind(),
            ErrorKind::Structural
        );
    }
}
