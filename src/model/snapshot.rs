//! Canonical, ID-free view of an experiment
//!
//! Property and range IDs depend on commit order, which reconstruction does
//! not preserve for properties committed out of dependency-level order. The
//! snapshot replaces every ID with the name or label it stands for so two
//! experiments can be compared on content alone.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    Bounds, Distribution, Experiment, LayerId, ProbabilityMap, Property, PropertyId, PropertyKind,
};

/// Weights keyed by range label.
pub type LabelWeights = BTreeMap<String, f64>;

/// Condition keyed by dependency name, valued by range label.
pub type LabelCondition = BTreeMap<String, String>;

/// Canonical distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSnapshot {
    /// Conditional entries in evaluation order.
    pub conditionals: Vec<(LabelCondition, LabelWeights)>,
    /// Trailing default.
    pub default: LabelWeights,
}

/// Canonical property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySnapshot {
    /// Property name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Kind tag.
    pub kind: PropertyKind,
    /// Dependency level.
    pub dependency_level: u32,
    /// Range labels and bounds, in declaration order.
    pub ranges: Vec<(String, Option<Bounds>)>,
    /// Fraction init value.
    pub init_value: Option<f64>,
    /// Names of dependency properties.
    pub dependencies: BTreeSet<String>,
    /// Distribution, if any.
    pub distribution: Option<DistributionSnapshot>,
}

/// Canonical layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    /// Layer ID.
    pub id: LayerId,
    /// Layer name.
    pub name: String,
    /// Properties sorted by name.
    pub properties: Vec<PropertySnapshot>,
}

/// Canonical experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSnapshot {
    /// Experiment name.
    pub name: String,
    /// Top-level properties sorted by name.
    pub properties: Vec<PropertySnapshot>,
    /// Layers sorted by ID.
    pub layers: Vec<LayerSnapshot>,
}

impl ExperimentSnapshot {
    pub(crate) fn of(experiment: &Experiment) -> Self {
        let mut layers: Vec<LayerSnapshot> = experiment
            .layers
            .iter()
            .map(|layer| LayerSnapshot {
                id: layer.id,
                name: layer.name.clone(),
                properties: snapshot_scope(&layer.properties),
            })
            .collect();
        layers.sort_by_key(|layer| layer.id);

        Self {
            name: experiment.name.clone(),
            properties: snapshot_scope(&experiment.properties),
            layers,
        }
    }
}

fn snapshot_scope(properties: &[Property]) -> Vec<PropertySnapshot> {
    let mut snapshots: Vec<PropertySnapshot> = properties
        .iter()
        .map(|property| snapshot_property(property, properties))
        .collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    snapshots
}

fn snapshot_property(property: &Property, scope: &[Property]) -> PropertySnapshot {
    let name_of = |id: PropertyId| {
        scope
            .iter()
            .find(|candidate| candidate.id == id)
            .map_or_else(|| id.to_string(), |candidate| candidate.name.clone())
    };

    PropertySnapshot {
        name: property.name.clone(),
        description: property.description.clone(),
        kind: property.kind(),
        dependency_level: property.dependency_level,
        ranges: property
            .ranges()
            .iter()
            .map(|range| (range.label().to_string(), range.bounds()))
            .collect(),
        init_value: property.init_value(),
        dependencies: property.dependencies.iter().map(|id| name_of(*id)).collect(),
        distribution: property
            .distribution
            .as_ref()
            .map(|distribution| snapshot_distribution(distribution, property, scope)),
    }
}

fn snapshot_distribution(
    distribution: &Distribution,
    property: &Property,
    scope: &[Property],
) -> DistributionSnapshot {
    let conditionals = distribution
        .conditionals()
        .iter()
        .map(|entry| {
            let condition = entry
                .condition()
                .iter()
                .map(|(dependency, range)| {
                    let dependency = scope.iter().find(|candidate| candidate.id == *dependency);
                    let name = dependency.map_or_else(String::new, |d| d.name.clone());
                    let label = dependency
                        .and_then(|d| d.range(*range))
                        .map_or_else(|| range.to_string(), |r| r.label().to_string());
                    (name, label)
                })
                .collect();
            (condition, label_weights(entry.weights(), property))
        })
        .collect();

    DistributionSnapshot {
        conditionals,
        default: label_weights(distribution.default_weights(), property),
    }
}

fn label_weights(weights: &ProbabilityMap, property: &Property) -> LabelWeights {
    weights
        .iter()
        .map(|(range, weight)| {
            let label = property
                .range(range)
                .map_or_else(|| range.to_string(), |r| r.label().to_string());
            (label, weight)
        })
        .collect()
}
