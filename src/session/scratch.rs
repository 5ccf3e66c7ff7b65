//! Scratch buffer - a property under construction

use std::collections::BTreeSet;

use super::BuildError;
use crate::model::{
    Bounds, ConditionalDistribution, Distribution, KindSpec, ProbabilityMap, Property, PropertyId,
    PropertyKind, Range, RangeId, Scope, BOOLEAN_LABELS,
};

#[derive(Debug, Clone)]
pub(crate) struct ScratchRange {
    pub(crate) id: RangeId,
    pub(crate) label: String,
    pub(crate) min: Option<i64>,
    pub(crate) max: Option<i64>,
}

/// Invisible, freely mutable draft of one property.
#[derive(Debug, Clone)]
pub(crate) struct ScratchProperty {
    pub(crate) scope: Scope,
    pub(crate) existing: Option<PropertyId>,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) kind: PropertyKind,
    pub(crate) dependency_level: u32,
    pub(crate) ranges: Vec<ScratchRange>,
    next_range: u32,
    pub(crate) init_value: Option<f64>,
    pub(crate) dependencies: BTreeSet<PropertyId>,
    pub(crate) conditionals: Vec<ConditionalDistribution>,
    pub(crate) default: Option<ProbabilityMap>,
    pub(crate) uniform: bool,
}

impl ScratchProperty {
    pub(crate) fn new(scope: Scope, name: String, kind: PropertyKind, description: String) -> Self {
        let mut scratch = Self {
            scope,
            existing: None,
            name,
            description,
            kind,
            dependency_level: 0,
            ranges: Vec::new(),
            next_range: 0,
            init_value: None,
            dependencies: BTreeSet::new(),
            conditionals: Vec::new(),
            default: None,
            uniform: false,
        };
        if kind == PropertyKind::Boolean {
            for label in BOOLEAN_LABELS {
                scratch.push_range(label.to_string());
            }
        }
        scratch
    }

    /// Reopen a committed property; it keeps its ID on commit.
    pub(crate) fn from_property(scope: Scope, property: &Property) -> Self {
        let ranges: Vec<ScratchRange> = property
            .ranges()
            .iter()
            .map(|range| ScratchRange {
                id: range.id(),
                label: range.label().to_string(),
                min: range.bounds().map(|b| b.min),
                max: range.bounds().map(|b| b.max),
            })
            .collect();
        let next_range = ranges.iter().map(|r| r.id.get() + 1).max().unwrap_or(0);
        let (conditionals, default) = property.distribution().map_or((Vec::new(), None), |d| {
            (d.conditionals().to_vec(), Some(d.default_weights().clone()))
        });

        Self {
            scope,
            existing: Some(property.id()),
            name: property.name().to_string(),
            description: property.description().to_string(),
            kind: property.kind(),
            dependency_level: property.dependency_level(),
            ranges,
            next_range,
            init_value: property.init_value(),
            dependencies: property.dependencies().clone(),
            conditionals,
            default,
            uniform: false,
        }
    }

    pub(crate) fn push_range(&mut self, label: String) -> RangeId {
        let id = RangeId::new(self.next_range);
        self.next_range += 1;
        self.ranges.push(ScratchRange {
            id,
            label,
            min: None,
            max: None,
        });
        id
    }

    pub(crate) fn range_id(&self, label: &str) -> Option<RangeId> {
        self.ranges
            .iter()
            .find(|range| range.label == label)
            .map(|range| range.id)
    }

    pub(crate) fn range_mut(&mut self, id: RangeId) -> Result<&mut ScratchRange, BuildError> {
        let property = &self.name;
        self.ranges
            .iter_mut()
            .find(|range| range.id == id)
            .ok_or_else(|| BuildError::UnknownRange {
                property: property.clone(),
                range: id,
            })
    }

    pub(crate) fn require_kind(
        &self,
        kind: PropertyKind,
        operation: &'static str,
    ) -> Result<(), BuildError> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(BuildError::KindMismatch {
                kind: self.kind,
                operation,
            })
        }
    }

    /// Every key must be one of our ranges, every weight finite and non-negative.
    pub(crate) fn check_weights(&self, weights: &ProbabilityMap) -> Result<(), BuildError> {
        for (range, weight) in weights.iter() {
            if !self.ranges.iter().any(|r| r.id == range) {
                return Err(BuildError::UnknownRange {
                    property: self.name.clone(),
                    range,
                });
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(BuildError::InvalidWeight { range, weight });
            }
        }
        Ok(())
    }

    /// Validate the draft and produce the committed property.
    ///
    /// Checks that need the surrounding scope (dependency levels, dependents)
    /// are done by the session before calling this.
    pub(crate) fn build(&self, id: PropertyId) -> Result<Property, BuildError> {
        let ranges = self.build_ranges()?;

        let spec = match self.kind {
            PropertyKind::Enumerator => KindSpec::Enumerator { ranges },
            PropertyKind::IntegerRange => KindSpec::IntegerRange { ranges },
            PropertyKind::Boolean => KindSpec::Boolean { ranges },
            PropertyKind::Fraction => KindSpec::Fraction {
                init_value: self
                    .init_value
                    .ok_or_else(|| BuildError::MissingInitValue(self.name.clone()))?,
            },
            PropertyKind::Attachment => KindSpec::Attachment,
        };

        for dependency in &self.dependencies {
            let used = self
                .conditionals
                .iter()
                .any(|entry| entry.condition().contains_key(dependency));
            if !used {
                return Err(BuildError::UnusedDependency(*dependency));
            }
        }

        let default = match (&self.default, self.uniform) {
            (Some(weights), _) => Some(weights.clone()),
            (None, true) => Some(ProbabilityMap::uniform(spec.ranges())),
            (None, false) => None,
        };
        let distribution = match default {
            Some(default) => Some(Distribution::new(self.conditionals.clone(), default)),
            None if self.kind == PropertyKind::Fraction && self.conditionals.is_empty() => None,
            None => return Err(BuildError::MissingDistribution(self.name.clone())),
        };

        Ok(Property {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            dependency_level: self.dependency_level,
            dependencies: self.dependencies.clone(),
            spec,
            distribution,
        })
    }

    fn build_ranges(&self) -> Result<Vec<Range>, BuildError> {
        if self.kind.accepts_ranges() && self.ranges.is_empty() {
            return Err(BuildError::MissingRanges {
                property: self.name.clone(),
                kind: self.kind,
            });
        }

        self.ranges
            .iter()
            .map(|range| {
                let bounds = if self.kind == PropertyKind::IntegerRange {
                    let min = range.min.ok_or_else(|| self.missing_bound(range, "min"))?;
                    let max = range.max.ok_or_else(|| self.missing_bound(range, "max"))?;
                    if min > max {
                        return Err(BuildError::InvertedRange {
                            property: self.name.clone(),
                            label: range.label.clone(),
                            min,
                            max,
                        });
                    }
                    Some(Bounds { min, max })
                } else {
                    None
                };
                Ok(Range::new(range.id, range.label.clone(), bounds))
            })
            .collect()
    }

    fn missing_bound(&self, range: &ScratchRange, bound: &'static str) -> BuildError {
        BuildError::MissingBound {
            property: self.name.clone(),
            label: range.label.clone(),
            bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(kind: PropertyKind) -> ScratchProperty {
        ScratchProperty::new(Scope::TopLevel, "p".to_string(), kind, String::new())
    }

    #[test]
    fn test_boolean_seeds_implicit_ranges() {
        let boolean = scratch(PropertyKind::Boolean);
        assert_eq!(boolean.range_id("false"), Some(RangeId::new(0)));
        assert_eq!(boolean.range_id("true"), Some(RangeId::new(1)));
    }

    #[test]
    fn test_build_requires_ranges() {
        let mut enumerator = scratch(PropertyKind::Enumerator);
        enumerator.uniform = true;
        assert!(matches!(
            enumerator.build(PropertyId::new(0)),
            Err(BuildError::MissingRanges { .. })
        ));
    }

    #[test]
    fn test_build_rejects_missing_bound() {
        let mut integer = scratch(PropertyKind::IntegerRange);
        let id = integer.push_range("low".to_string());
        integer.range_mut(id).unwrap().min = Some(1);
        integer.uniform = true;
        assert_eq!(
            integer.build(PropertyId::new(0)),
            Err(BuildError::MissingBound {
                property: "p".to_string(),
                label: "low".to_string(),
                bound: "max",
            })
        );
    }

    #[test]
    fn test_uniform_resolved_at_build() {
        let mut enumerator = scratch(PropertyKind::Enumerator);
        enumerator.uniform = true;
        enumerator.push_range("a".to_string());
        enumerator.push_range("b".to_string());
        let property = enumerator.build(PropertyId::new(4)).unwrap();
        let distribution = property.distribution().unwrap();
        assert!(distribution.default_weights().is_uniform_over(property.ranges()));
        assert_eq!(property.id(), PropertyId::new(4));
    }

    #[test]
    fn test_fraction_without_distribution() {
        let mut fraction = scratch(PropertyKind::Fraction);
        fraction.init_value = Some(0.25);
        let property = fraction.build(PropertyId::new(0)).unwrap();
        assert!(property.distribution().is_none());
        assert_eq!(property.init_value(), Some(0.25));
    }

    #[test]
    fn test_check_weights_rejects_negative() {
        let mut enumerator = scratch(PropertyKind::Enumerator);
        let a = enumerator.push_range("a".to_string());
        let weights = ProbabilityMap::new().with(a, -1.0);
        assert!(matches!(
            enumerator.check_weights(&weights),
            Err(BuildError::InvalidWeight { .. })
        ));
    }
}
