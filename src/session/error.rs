//! Build session errors

use thiserror::Error;

use crate::model::{LayerId, PropertyId, PropertyKind, RangeId, Scope};

/// Reasons a session operation or commit is rejected.
///
/// A rejected operation leaves both the committed experiment and the scratch
/// buffer exactly as they were.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Property name already taken in the target scope
    #[error("a property named `{name}` already exists in the {scope}")]
    DuplicateName {
        /// Scope searched
        scope: Scope,
        /// Offending name
        name: String,
    },

    /// Layer ID unknown
    #[error("{0} does not exist")]
    UnknownLayer(LayerId),

    /// Layer ID already in use
    #[error("{0} already exists")]
    DuplicateLayer(LayerId),

    /// Layer ID leaves no room for a following ID
    #[error("{0} is the last representable layer ID")]
    LayerIdOverflow(LayerId),

    /// Layer name already in use
    #[error("a layer named `{0}` already exists")]
    DuplicateLayerName(String),

    /// Scratch operation without a property under construction
    #[error("no property is under construction")]
    NoScratch,

    /// New scratch cycle while another is still open
    #[error("property `{0}` is still under construction; commit or discard it first")]
    ScratchInProgress(String),

    /// Level below zero or beyond `u32`
    #[error("dependency level must be a non-negative 32-bit integer, got {0}")]
    InvalidDependencyLevel(i64),

    /// Range label already used by the scratch property
    #[error("range label `{label}` is already used by property `{property}`")]
    DuplicateRangeLabel {
        /// Scratch property name
        property: String,
        /// Offending label
        label: String,
    },

    /// Range ID not declared by the property
    #[error("{range} does not belong to property `{property}`")]
    UnknownRange {
        /// Property the range was looked up in
        property: String,
        /// Offending range
        range: RangeId,
    },

    /// Operation does not apply to this kind
    #[error("`{operation}` is not supported by {kind} properties")]
    KindMismatch {
        /// Scratch property kind
        kind: PropertyKind,
        /// Rejected operation
        operation: &'static str,
    },

    /// Property ID not committed in the scope
    #[error("{id} does not exist in the {scope}")]
    UnknownProperty {
        /// Scope searched
        scope: Scope,
        /// Missing property
        id: PropertyId,
    },

    /// Dependency on an equal or higher level
    #[error("property `{property}` (level {level}) cannot depend on `{dependency}` (level {dependency_level})")]
    IllegalDependency {
        /// Dependent property
        property: String,
        /// Dependent level
        level: u32,
        /// Referenced property
        dependency: String,
        /// Referenced level
        dependency_level: u32,
    },

    /// Condition key not declared as dependency
    #[error("condition on {0} is not a declared dependency")]
    UndeclaredCondition(PropertyId),

    /// Conditional entry without any condition
    #[error("conditional distribution must name at least one dependency")]
    EmptyCondition,

    /// Declared dependency never used by a condition
    #[error("dependency {0} is not referenced by any conditional distribution")]
    UnusedDependency(PropertyId),

    /// Weight negative, NaN or infinite
    #[error("weight {weight} for {range} must be finite and non-negative")]
    InvalidWeight {
        /// Weighted range
        range: RangeId,
        /// Offending weight
        weight: f64,
    },

    /// Fraction init value outside `[0, 1]`
    #[error("fraction init value {0} must lie in [0, 1]")]
    InvalidInitValue(f64),

    /// Enumerator or `IntegerRange` without ranges
    #[error("{kind} property `{property}` declares no ranges")]
    MissingRanges {
        /// Scratch property name
        property: String,
        /// Scratch property kind
        kind: PropertyKind,
    },

    /// Integer range with an unset bound
    #[error("range `{label}` of `{property}` is missing its {bound} bound")]
    MissingBound {
        /// Scratch property name
        property: String,
        /// Range label
        label: String,
        /// `"min"` or `"max"`
        bound: &'static str,
    },

    /// Integer range with `min > max`
    #[error("range `{label}` of `{property}` has min {min} greater than max {max}")]
    InvertedRange {
        /// Scratch property name
        property: String,
        /// Range label
        label: String,
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },

    /// Fraction without init value
    #[error("fraction property `{0}` has no init value")]
    MissingInitValue(String),

    /// No default distribution on a kind that needs one
    #[error("property `{0}` has no default distribution")]
    MissingDistribution(String),

    /// Removal of a property others depend on
    #[error("property `{property}` is a dependency of `{dependent}`")]
    PropertyInUse {
        /// Property being removed
        property: String,
        /// Property depending on it
        dependent: String,
    },

    /// Edited level no longer below a dependent's level
    #[error("level {level} of `{property}` must stay below level {dependent_level} of dependent `{dependent}`")]
    LevelConflict {
        /// Edited property
        property: String,
        /// New level
        level: u32,
        /// Dependent property
        dependent: String,
        /// Dependent level
        dependent_level: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_message() {
        let error = BuildError::InvertedRange {
            property: "risk_days".to_string(),
            label: "transient".to_string(),
            min: 14,
            max: 1,
        };
        let message = error.to_string();
        assert!(message.contains("risk_days"));
        assert!(message.contains("min 14 greater than max 1"));
    }

    #[test]
    fn test_duplicate_name_mentions_scope() {
        let error = BuildError::DuplicateName {
            scope: Scope::Layer(LayerId::new(1)),
            name: "degree".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "a property named `degree` already exists in the scope of layer#1"
        );
    }
}
