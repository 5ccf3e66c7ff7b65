//! Experiment - root of the property model

use std::fmt;

use super::{ExperimentSnapshot, Layer, LayerId, Property, PropertyId};

/// Namespace in which property names and IDs are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Properties owned directly by the experiment.
    TopLevel,
    /// Properties owned by one layer.
    Layer(LayerId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevel => f.write_str("top-level scope"),
            Self::Layer(id) => write!(f, "scope of {id}"),
        }
    }
}

/// A complete node property model.
///
/// Mutable only through a [`BuildSession`](crate::session::BuildSession);
/// once handed back by the session it is an immutable snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub(crate) name: String,
    pub(crate) properties: Vec<Property>,
    pub(crate) layers: Vec<Layer>,
}

impl Experiment {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the top-level properties, in commit order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Get the layers, in creation order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Look up a layer by ID.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Look up a layer by name.
    #[must_use]
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Properties of a scope, or `None` for an unknown layer.
    #[must_use]
    pub fn scope(&self, scope: Scope) -> Option<&[Property]> {
        match scope {
            Scope::TopLevel => Some(&self.properties),
            Scope::Layer(id) => self.layer(id).map(Layer::properties),
        }
    }

    /// Look up a property by ID within a scope.
    #[must_use]
    pub fn property(&self, scope: Scope, id: PropertyId) -> Option<&Property> {
        self.scope(scope)?.iter().find(|property| property.id == id)
    }

    /// Look up a property by name within a scope.
    #[must_use]
    pub fn property_by_name(&self, scope: Scope, name: &str) -> Option<&Property> {
        self.scope(scope)?
            .iter()
            .find(|property| property.name == name)
    }

    /// Total number of properties across all scopes.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
            + self
                .layers
                .iter()
                .map(|layer| layer.properties.len())
                .sum::<usize>()
    }

    /// Name- and label-keyed canonical form, independent of ID assignment.
    #[must_use]
    pub fn snapshot(&self) -> ExperimentSnapshot {
        ExperimentSnapshot::of(self)
    }

    pub(crate) fn scope_mut(&mut self, scope: Scope) -> Option<&mut Vec<Property>> {
        match scope {
            Scope::TopLevel => Some(&mut self.properties),
            Scope::Layer(id) => self
                .layers
                .iter_mut()
                .find(|layer| layer.id == id)
                .map(|layer| &mut layer.properties),
        }
    }
}
