//! Field extraction from raw JSON with structural diagnostics

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Cursor over one JSON object inside a named document.
///
/// Every failed lookup becomes [`Error::Structural`] naming the document, the
/// field path, and a snapshot of the object being read.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields<'a> {
    document: &'a str,
    path: &'a str,
    value: &'a Value,
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(document: &'a str, path: &'a str, value: &'a Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::structural(document, path, "expected an object", value))?;
        Ok(Self {
            document,
            path,
            value,
            object,
        })
    }

    pub(crate) const fn document(&self) -> &'a str {
        self.document
    }

    pub(crate) const fn object(&self) -> &'a Map<String, Value> {
        self.object
    }

    pub(crate) fn fail(&self, field: &str, reason: impl Into<String>) -> Error {
        Error::structural(self.document, self.qualify(field), reason, self.value)
    }

    fn qualify(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.path)
        }
    }

    pub(crate) fn optional(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|value| !value.is_null())
    }

    pub(crate) fn require(&self, field: &str) -> Result<&'a Value> {
        self.optional(field)
            .ok_or_else(|| self.fail(field, "required field is missing"))
    }

    pub(crate) fn str(&self, field: &str) -> Result<&'a str> {
        self.require(field)?
            .as_str()
            .ok_or_else(|| self.fail(field, "expected a string"))
    }

    pub(crate) fn i64(&self, field: &str) -> Result<i64> {
        self.require(field)?
            .as_i64()
            .ok_or_else(|| self.fail(field, "expected an integer"))
    }

    pub(crate) fn f64(&self, field: &str) -> Result<f64> {
        self.require(field)?
            .as_f64()
            .ok_or_else(|| self.fail(field, "expected a number"))
    }

    pub(crate) fn array(&self, field: &str) -> Result<&'a [Value]> {
        self.require(field)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.fail(field, "expected an array"))
    }

    pub(crate) fn optional_array(&self, field: &str) -> Result<Option<&'a [Value]>> {
        self.optional(field)
            .map(|value| {
                value
                    .as_array()
                    .map(Vec::as_slice)
                    .ok_or_else(|| self.fail(field, "expected an array"))
            })
            .transpose()
    }
}
