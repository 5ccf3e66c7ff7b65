//! Layer - an independently ID-scoped group of properties

use super::{LayerId, Property, PropertyId};

/// One network relationship type with its own property namespace.
///
/// Property IDs inside a layer never collide with top-level IDs or with the
/// IDs of another layer; lookups always go through the owning scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    pub(crate) properties: Vec<Property>,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Get the layer ID.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Get the layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the layer's properties, in commit order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Look up a layer property by ID.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.iter().find(|property| property.id == id)
    }

    /// Look up a layer property by name.
    #[must_use]
    pub fn property_by_name(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }
}
