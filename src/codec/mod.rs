//! Tagged Entry Codec
//!
//! Every stored document is an envelope
//! `{ "ExperimentName": ..., "Type": ..., "Object": ... }`. Encoding wraps a
//! typed value with its tag and owning experiment; decoding resolves the tag
//! against a fixed list of known namespaces.
//!
//! Decoding distinguishes three outcomes:
//! - `Ok(Decoded::Known(_))` - envelope valid, tag recognized
//! - `Ok(Decoded::UnknownTag(_))` - envelope valid, tag unknown; skip it
//! - `Err(_)` - the document is not a valid envelope
//!
//! [`Codec::decode_all`] skips unknown tags with a warning and aborts on
//! anything else. This is the only place a load tolerates partial failure.

pub(crate) mod fields;
pub mod schema;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{Error, Result};
use fields::Fields;

/// Document name and type tag of the node settings document.
pub const NODE_SETTINGS: &str = "NodeSettings";

/// Type tag of distribution documents.
pub const UNIVARIAT_DISTRIBUTION: &str = "UnivariatDistribution";

/// Namespaces searched when resolving a tag, in order.
pub const DEFAULT_NAMESPACES: [&str; 3] = ["", "netprop.settings.", "netprop.distribution."];

/// Known document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// Property and layer definitions.
    NodeSettings,
    /// One (conditional) distribution bound to a property.
    UnivariatDistribution,
}

impl DocumentType {
    /// All known types.
    pub const ALL: [Self; 2] = [Self::NodeSettings, Self::UnivariatDistribution];

    /// Bare tag written to the `Type` field.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::NodeSettings => NODE_SETTINGS,
            Self::UnivariatDistribution => UNIVARIAT_DISTRIBUTION,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A decoded document of a known type.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    experiment_name: String,
    doc_type: DocumentType,
    object: Value,
}

impl Document {
    /// Create a document from an already-structured object.
    #[must_use]
    pub fn new(experiment_name: impl Into<String>, doc_type: DocumentType, object: Value) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            doc_type,
            object,
        }
    }

    /// Wrap a typed value.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be represented as JSON.
    pub fn wrap<T: Serialize>(
        experiment_name: impl Into<String>,
        doc_type: DocumentType,
        value: &T,
    ) -> Result<Self> {
        Ok(Self::new(experiment_name, doc_type, serde_json::to_value(value)?))
    }

    /// Get the owning experiment name.
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Get the resolved type.
    #[must_use]
    pub const fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    /// Get the type-specific object.
    #[must_use]
    pub const fn object(&self) -> &Value {
        &self.object
    }
}

/// Outcome of decoding one stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Tag recognized.
    Known(Document),
    /// Valid envelope with an unrecognized tag.
    UnknownTag(String),
}

/// Decoded documents keyed by document name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet(BTreeMap<String, Document>);

impl DocumentSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&mut self, name: impl Into<String>, document: Document) {
        self.0.insert(name.into(), document);
    }

    /// Remove a document.
    pub fn remove(&mut self, name: &str) -> Option<Document> {
        self.0.remove(name)
    }

    /// Get a document by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Document> {
        self.0.get(name)
    }

    /// Whether a document with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate `(name, document)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.0.iter().map(|(name, document)| (name.as_str(), document))
    }

    /// Documents of one type.
    pub fn of_type(&self, doc_type: DocumentType) -> impl Iterator<Item = (&str, &Document)> {
        self.iter()
            .filter(move |(_, document)| document.doc_type == doc_type)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Envelope encoder/decoder.
#[derive(Debug, Clone)]
pub struct Codec {
    namespaces: Vec<String>,
    pretty: bool,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    /// Codec with [`DEFAULT_NAMESPACES`] and compact output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: DEFAULT_NAMESPACES.iter().map(ToString::to_string).collect(),
            pretty: false,
        }
    }

    /// Also accept tags qualified with `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
        self
    }

    /// Select pretty-printed output.
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Namespaces searched by [`resolve`](Self::resolve).
    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Resolve a (possibly namespace-qualified) tag.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<DocumentType> {
        self.namespaces.iter().find_map(|namespace| {
            let bare = tag.strip_prefix(namespace.as_str())?;
            DocumentType::ALL
                .into_iter()
                .find(|doc_type| doc_type.tag() == bare)
        })
    }

    /// Encode a document to text.
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails.
    pub fn encode(&self, document: &Document) -> Result<String> {
        let envelope = json!({
            "ExperimentName": document.experiment_name,
            "Type": document.doc_type.tag(),
            "Object": document.object,
        });
        let text = if self.pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };
        Ok(text)
    }

    /// Encode every document of a set.
    ///
    /// # Errors
    ///
    /// Returns error if any document fails to encode.
    pub fn encode_all(&self, documents: &DocumentSet) -> Result<BTreeMap<String, String>> {
        documents
            .iter()
            .map(|(name, document)| Ok((name.to_string(), self.encode(document)?)))
            .collect()
    }

    /// Decode one stored document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if the text is not JSON or the envelope
    /// lacks `ExperimentName`, `Type` or `Object`.
    pub fn decode(&self, name: &str, text: &str) -> Result<Decoded> {
        let value: Value = serde_json::from_str(text).map_err(|err| {
            let head: String = text.chars().take(crate::error::FRAGMENT_LIMIT).collect();
            Error::structural(name, "<document>", format!("invalid JSON: {err}"), &Value::String(head))
        })?;

        let envelope = Fields::new(name, "", &value)?;
        let experiment_name = envelope.str("ExperimentName")?;
        let tag = envelope.str("Type")?;
        let object = envelope.require("Object")?;

        Ok(match self.resolve(tag) {
            Some(doc_type) => {
                Decoded::Known(Document::new(experiment_name, doc_type, object.clone()))
            }
            None => Decoded::UnknownTag(tag.to_string()),
        })
    }

    /// Decode every stored document, skipping unknown tags.
    ///
    /// # Errors
    ///
    /// Returns the first hard decode failure.
    pub fn decode_all(&self, raw: &BTreeMap<String, String>) -> Result<DocumentSet> {
        let mut documents = DocumentSet::new();
        for (name, text) in raw {
            match self.decode(name, text)? {
                Decoded::Known(document) => {
                    debug!(document = %name, doc_type = %document.doc_type, "Document decoded");
                    documents.insert(name.clone(), document);
                }
                Decoded::UnknownTag(tag) => {
                    warn!(document = %name, tag = %tag, "Skipping document with unrecognized type tag");
                }
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bare_and_qualified_tags() {
        let codec = Codec::new();
        assert_eq!(codec.resolve("NodeSettings"), Some(DocumentType::NodeSettings));
        assert_eq!(
            codec.resolve("netprop.distribution.UnivariatDistribution"),
            Some(DocumentType::UnivariatDistribution)
        );
        assert_eq!(codec.resolve("legacy.NodeSettings"), None);
        assert_eq!(
            codec.with_namespace("legacy.").resolve("legacy.NodeSettings"),
            Some(DocumentType::NodeSettings)
        );
    }

    #[test]
    fn test_encode_decode_envelope() {
        let codec = Codec::new();
        let document = Document::new("exp", DocumentType::NodeSettings, json!({"a": 1}));
        let text = codec.encode(&document).unwrap();
        assert_eq!(
            codec.decode("NodeSettings", &text).unwrap(),
            Decoded::Known(document)
        );
    }

    #[test]
    fn test_unknown_tag_is_not_an_error() {
        let codec = Codec::new();
        let text = r#"{"ExperimentName": "exp", "Type": "GraphLayout", "Object": {}}"#;
        assert_eq!(
            codec.decode("layout", text).unwrap(),
            Decoded::UnknownTag("GraphLayout".to_string())
        );
    }

    #[test]
    fn test_missing_envelope_field_is_structural() {
        let codec = Codec::new();
        let err = codec
            .decode("broken", r#"{"ExperimentName": "exp", "Object": {}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Structural { ref field, .. } if field == "Type"));
    }

    #[test]
    fn test_invalid_json_is_structural() {
        let codec = Codec::new();
        let err = codec.decode("broken", "{not json").unwrap_err();
        assert!(matches!(err, Error::Structural { ref document, .. } if document == "broken"));
    }

    #[test]
    fn test_decode_all_skips_unknown() {
        let codec = Codec::new();
        let mut raw = BTreeMap::new();
        raw.insert(
            "NodeSettings".to_string(),
            r#"{"ExperimentName": "exp", "Type": "NodeSettings", "Object": {}}"#.to_string(),
        );
        raw.insert(
            "layout".to_string(),
            r#"{"ExperimentName": "exp", "Type": "GraphLayout", "Object": {}}"#.to_string(),
        );
        let documents = codec.decode_all(&raw).unwrap();
        assert_eq!(documents.len(), 1);
        assert!(documents.contains("NodeSettings"));
    }

    #[test]
    fn test_pretty_output() {
        let codec = Codec::new().pretty(true);
        let document = Document::new("exp", DocumentType::NodeSettings, json!({}));
        assert!(codec.encode(&document).unwrap().contains('\n'));
    }
}
