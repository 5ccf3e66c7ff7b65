//! Scoped name and label symbol tables
//!
//! Populated incrementally as properties commit, so resolution during
//! reconstruction only ever sees properties that are already built.

use rustc_hash::FxHashMap;

use crate::model::{Property, PropertyId, RangeId, Scope};

#[derive(Debug, Default)]
pub(crate) struct SymbolTables {
    properties: FxHashMap<Scope, FxHashMap<String, PropertyId>>,
    ranges: FxHashMap<(Scope, PropertyId), FxHashMap<String, RangeId>>,
}

impl SymbolTables {
    pub(crate) fn open_scope(&mut self, scope: Scope) {
        self.properties.entry(scope).or_default();
    }

    pub(crate) fn register(&mut self, scope: Scope, property: &Property) {
        self.properties
            .entry(scope)
            .or_default()
            .insert(property.name().to_string(), property.id());
        self.ranges.insert(
            (scope, property.id()),
            property
                .ranges()
                .iter()
                .map(|range| (range.label().to_string(), range.id()))
                .collect(),
        );
    }

    pub(crate) fn unregister(&mut self, scope: Scope, property: &Property) {
        if let Some(names) = self.properties.get_mut(&scope) {
            names.remove(property.name());
        }
        self.ranges.remove(&(scope, property.id()));
    }

    pub(crate) fn property(&self, scope: Scope, name: &str) -> Option<PropertyId> {
        self.properties.get(&scope)?.get(name).copied()
    }

    pub(crate) fn range(&self, scope: Scope, property: PropertyId, label: &str) -> Option<RangeId> {
        self.ranges.get(&(scope, property))?.get(label).copied()
    }
}
