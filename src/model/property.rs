//! Property - one configurable node attribute

use std::collections::BTreeSet;
use std::fmt;

use super::{Distribution, PropertyId, RangeId};

/// Closed set of property kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Named categories.
    Enumerator,
    /// Labelled inclusive integer intervals.
    IntegerRange,
    /// Two implicit ranges, `false` and `true`.
    Boolean,
    /// Scalar in `[0, 1]`, optionally fixed to an init value.
    Fraction,
    /// Opaque attachment, no ranges.
    Attachment,
}

impl PropertyKind {
    /// All kinds, in wire-tag order.
    pub const ALL: [Self; 5] = [
        Self::Enumerator,
        Self::IntegerRange,
        Self::Boolean,
        Self::Fraction,
        Self::Attachment,
    ];

    /// Wire tag used as the single key of a property wrapper.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Enumerator => "Enumerator",
            Self::IntegerRange => "IntegerRange",
            Self::Boolean => "Boolean",
            Self::Fraction => "Fraction",
            Self::Attachment => "Attachment",
        }
    }

    /// Resolve a wire tag back to a kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Whether ranges can be added to properties of this kind.
    #[must_use]
    pub const fn accepts_ranges(self) -> bool {
        matches!(self, Self::Enumerator | Self::IntegerRange)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Inclusive integer bounds of an `IntegerRange` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Lower bound (inclusive).
    pub min: i64,
    /// Upper bound (inclusive).
    pub max: i64,
}

impl Bounds {
    /// Whether `value` falls inside the bounds.
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// One labelled value bucket of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    id: RangeId,
    label: String,
    bounds: Option<Bounds>,
}

impl Range {
    pub(crate) fn new(id: RangeId, label: impl Into<String>, bounds: Option<Bounds>) -> Self {
        Self {
            id,
            label: label.into(),
            bounds,
        }
    }

    /// Get the range ID.
    #[must_use]
    pub const fn id(&self) -> RangeId {
        self.id
    }

    /// Get the range label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the integer bounds (`IntegerRange` properties only).
    #[must_use]
    pub const fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}

/// Kind tag plus the payload that only that kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum KindSpec {
    /// Category labels.
    Enumerator {
        /// Declared categories.
        ranges: Vec<Range>,
    },
    /// Bounded integer intervals.
    IntegerRange {
        /// Declared intervals, each with bounds.
        ranges: Vec<Range>,
    },
    /// The implicit `false`/`true` pair.
    Boolean {
        /// Always `[false, true]`.
        ranges: Vec<Range>,
    },
    /// Fraction with its init value.
    Fraction {
        /// Value used when random sampling is disabled.
        init_value: f64,
    },
    /// No payload.
    Attachment,
}

impl KindSpec {
    /// The kind tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::Enumerator { .. } => PropertyKind::Enumerator,
            Self::IntegerRange { .. } => PropertyKind::IntegerRange,
            Self::Boolean { .. } => PropertyKind::Boolean,
            Self::Fraction { .. } => PropertyKind::Fraction,
            Self::Attachment => PropertyKind::Attachment,
        }
    }

    /// Ranges of the payload; empty for kinds without ranges.
    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        match self {
            Self::Enumerator { ranges }
            | Self::IntegerRange { ranges }
            | Self::Boolean { ranges } => ranges,
            Self::Fraction { .. } | Self::Attachment => &[],
        }
    }
}

/// Labels of the implicit Boolean ranges, in ID order.
pub const BOOLEAN_LABELS: [&str; 2] = ["false", "true"];

/// A committed property.
///
/// Only [`BuildSession`](crate::session::BuildSession) constructs these, so
/// every instance satisfies the model invariants: unique range labels,
/// `min <= max` on every integer range, dependencies strictly below
/// `dependency_level`, and distributions keyed by this property's ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub(crate) id: PropertyId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) dependency_level: u32,
    pub(crate) dependencies: BTreeSet<PropertyId>,
    pub(crate) spec: KindSpec,
    pub(crate) distribution: Option<Distribution>,
}

impl Property {
    /// Get the property ID.
    #[must_use]
    pub const fn id(&self) -> PropertyId {
        self.id
    }

    /// Get the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the property kind.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        self.spec.kind()
    }

    /// Get the kind-specific payload.
    #[must_use]
    pub const fn spec(&self) -> &KindSpec {
        &self.spec
    }

    /// Get the dependency level.
    #[must_use]
    pub const fn dependency_level(&self) -> u32 {
        self.dependency_level
    }

    /// Get the IDs of the properties this one is conditioned on.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<PropertyId> {
        &self.dependencies
    }

    /// Get the declared ranges, in declaration order.
    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        self.spec.ranges()
    }

    /// Look up a range by ID.
    #[must_use]
    pub fn range(&self, id: RangeId) -> Option<&Range> {
        self.ranges().iter().find(|range| range.id == id)
    }

    /// Look up a range by label.
    #[must_use]
    pub fn range_by_label(&self, label: &str) -> Option<&Range> {
        self.ranges().iter().find(|range| range.label == label)
    }

    /// Get the Fraction init value, if this is a Fraction.
    #[must_use]
    pub const fn init_value(&self) -> Option<f64> {
        match self.spec {
            KindSpec::Fraction { init_value } => Some(init_value),
            _ => None,
        }
    }

    /// Get the distribution; `None` only for a Fraction fixed to its init value.
    #[must_use]
    pub const fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tag_round_trip() {
        for kind in PropertyKind::ALL {
            assert_eq!(PropertyKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(PropertyKind::from_tag("Enum"), None);
    }

    #[test]
    fn test_accepts_ranges() {
        assert!(PropertyKind::Enumerator.accepts_ranges());
        assert!(PropertyKind::IntegerRange.accepts_ranges());
        assert!(!PropertyKind::Boolean.accepts_ranges());
        assert!(!PropertyKind::Fraction.accepts_ranges());
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds { min: 1, max: 14 };
        assert!(bounds.contains(1));
        assert!(bounds.contains(14));
        assert!(!bounds.contains(15));
    }

    #[test]
    fn test_spec_ranges_empty_for_fraction() {
        let spec = KindSpec::Fraction { init_value: 0.3 };
        assert!(spec.ranges().is_empty());
        assert_eq!(spec.kind(), PropertyKind::Fraction);
    }
}
