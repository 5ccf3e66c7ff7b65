//! Wire schema of the node settings and distribution documents
//!
//! Field names are fixed by the document format, including the space in
//! `"Dependency Level"` and the `Univariat` spelling.

use serde::{Deserialize, Serialize};

/// `Object` of a `NodeSettings` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSettingsBody {
    /// Top-level property definitions.
    #[serde(rename = "PropertyDefinitionList")]
    pub properties: Vec<PropertyWrapper>,
    /// Layer definitions.
    #[serde(rename = "LayerAttributesList")]
    pub layers: Vec<LayerAttributes>,
}

/// One layer with its own property definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerAttributes {
    /// Layer ID.
    #[serde(rename = "LayerID")]
    pub layer_id: u32,
    /// Layer name; readers fall back to `layer<id>` when absent.
    #[serde(rename = "LayerName", default, skip_serializing_if = "Option::is_none")]
    pub layer_name: Option<String>,
    /// Properties of the layer.
    #[serde(rename = "PropertyDefinitionList")]
    pub properties: Vec<PropertyWrapper>,
}

/// Single-key mapping from kind name to kind-specific body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyWrapper {
    /// `{"Enumerator": {...}}`
    Enumerator(PropertyBody),
    /// `{"IntegerRange": {...}}`
    IntegerRange(PropertyBody),
    /// `{"Boolean": {...}}`
    Boolean(PropertyBody),
    /// `{"Fraction": {...}}`
    Fraction(PropertyBody),
    /// `{"Attachment": {...}}`
    Attachment(PropertyBody),
}

impl PropertyWrapper {
    /// The wrapped body.
    #[must_use]
    pub const fn body(&self) -> &PropertyBody {
        match self {
            Self::Enumerator(body)
            | Self::IntegerRange(body)
            | Self::Boolean(body)
            | Self::Fraction(body)
            | Self::Attachment(body) => body,
        }
    }
}

/// Fields common to every kind plus the optional kind-specific ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBody {
    /// Dependency level.
    #[serde(rename = "Dependency Level")]
    pub dependency_level: u32,
    /// Property name.
    #[serde(rename = "PropertyName")]
    pub name: String,
    /// Description.
    #[serde(rename = "Description")]
    pub description: String,
    /// `"uniform"`, `"null"` or a distribution document ID.
    #[serde(rename = "DistributionID")]
    pub distribution_id: String,
    /// Enumerator labels.
    #[serde(rename = "EnumValues", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// `IntegerRange` intervals.
    #[serde(rename = "IntegerRangeList", default, skip_serializing_if = "Option::is_none")]
    pub integer_ranges: Option<Vec<IntegerRangeEntry>>,
    /// Fraction init value.
    #[serde(
        rename = "DisableRandom_UseInitValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub init_value: Option<f64>,
}

/// One labelled integer interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerRangeEntry {
    /// Range label.
    #[serde(rename = "RangeID")]
    pub label: String,
    /// Lower bound.
    #[serde(rename = "Min")]
    pub min: i64,
    /// Upper bound.
    #[serde(rename = "Max")]
    pub max: i64,
}

/// `Object` of a `UnivariatDistribution` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBody {
    /// ID referenced by `DistributionID`.
    #[serde(rename = "UnivariatDistributionID")]
    pub id: String,
    /// Name of the property this distribution belongs to.
    #[serde(rename = "BindToPropertyName")]
    pub bind_to: String,
    /// Conditional entries followed by exactly one unconditional default.
    #[serde(rename = "DependencyDistributionList")]
    pub entries: Vec<DependencyDistribution>,
}

/// One entry of a distribution list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyDistribution {
    /// Present on conditional entries only.
    #[serde(
        rename = "PropertyDependencyList",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub conditions: Option<Vec<ConditionEntry>>,
    /// Weights by range label.
    #[serde(rename = "DistributionSampleList")]
    pub samples: Vec<Sample>,
}

/// Dependency property name and required range label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Dependency property name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Range label of the dependency.
    #[serde(rename = "Value")]
    pub value: String,
}

/// Weight of one range label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Range label of the owning property.
    #[serde(rename = "Label")]
    pub label: String,
    /// Relative weight.
    #[serde(rename = "Value")]
    pub value: f64,
}
