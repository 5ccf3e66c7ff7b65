//! Probability maps and conditional distributions

use std::collections::BTreeMap;

use super::{PropertyId, Range, RangeId};

/// Relative weights over the ranges of one property.
///
/// Weights are not normalized; `{a: 6, b: 4}` and `{a: 0.6, b: 0.4}` describe
/// the same distribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityMap(BTreeMap<RangeId, f64>);

impl ProbabilityMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight 1 on every given range.
    #[must_use]
    pub fn uniform(ranges: &[Range]) -> Self {
        ranges.iter().map(|range| (range.id(), 1.0)).collect()
    }

    /// Set the weight of a range, replacing any previous weight.
    pub fn insert(&mut self, range: RangeId, weight: f64) {
        self.0.insert(range, weight);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, range: RangeId, weight: f64) -> Self {
        self.insert(range, weight);
        self
    }

    /// Get the weight of a range.
    #[must_use]
    pub fn weight(&self, range: RangeId) -> Option<f64> {
        self.0.get(&range).copied()
    }

    /// Iterate `(range, weight)` pairs in range-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (RangeId, f64)> + '_ {
        self.0.iter().map(|(range, weight)| (*range, *weight))
    }

    /// Range IDs carrying a weight.
    pub fn ranges(&self) -> impl Iterator<Item = RangeId> + '_ {
        self.0.keys().copied()
    }

    /// Number of weighted ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no range carries a weight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Weight of `range` divided by the total, or `None` when the total is zero.
    #[must_use]
    pub fn probability(&self, range: RangeId) -> Option<f64> {
        let total = self.total();
        if total > 0.0 {
            Some(self.weight(range).unwrap_or(0.0) / total)
        } else {
            None
        }
    }

    /// Whether this is exactly weight 1 on each of `ranges` and nothing else.
    #[must_use]
    pub fn is_uniform_over(&self, ranges: &[Range]) -> bool {
        self.0.len() == ranges.len()
            && ranges
                .iter()
                .all(|range| self.weight(range.id()) == Some(1.0))
    }
}

impl FromIterator<(RangeId, f64)> for ProbabilityMap {
    fn from_iter<I: IntoIterator<Item = (RangeId, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Assignment of dependency properties to one required range each.
pub type Condition = BTreeMap<PropertyId, RangeId>;

/// A probability map active only while its condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalDistribution {
    condition: Condition,
    weights: ProbabilityMap,
}

impl ConditionalDistribution {
    pub(crate) const fn new(condition: Condition, weights: ProbabilityMap) -> Self {
        Self { condition, weights }
    }

    /// Get the required dependency ranges.
    #[must_use]
    pub const fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Get the weights used when the condition holds.
    #[must_use]
    pub const fn weights(&self) -> &ProbabilityMap {
        &self.weights
    }

    /// Whether every required range is present in `assignment`.
    #[must_use]
    pub fn matches(&self, assignment: &Condition) -> bool {
        self.condition
            .iter()
            .all(|(property, range)| assignment.get(property) == Some(range))
    }
}

/// Ordered conditional maps followed by the unconditional default.
///
/// The split into `conditionals` and `default` makes the "all conditional
/// except the last" ordering a property of the type.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    conditionals: Vec<ConditionalDistribution>,
    default: ProbabilityMap,
}

impl Distribution {
    pub(crate) const fn new(
        conditionals: Vec<ConditionalDistribution>,
        default: ProbabilityMap,
    ) -> Self {
        Self {
            conditionals,
            default,
        }
    }

    /// Get the conditional entries, in evaluation order.
    #[must_use]
    pub fn conditionals(&self) -> &[ConditionalDistribution] {
        &self.conditionals
    }

    /// Get the trailing unconditional map.
    #[must_use]
    pub const fn default_weights(&self) -> &ProbabilityMap {
        &self.default
    }

    /// Whether there are no conditional entries.
    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.conditionals.is_empty()
    }

    /// Weights in effect for a given assignment of dependency ranges.
    ///
    /// The first conditional entry whose condition holds wins; the default
    /// applies when none does.
    #[must_use]
    pub fn select(&self, assignment: &Condition) -> &ProbabilityMap {
        self.conditionals
            .iter()
            .find(|entry| entry.matches(assignment))
            .map_or(&self.default, ConditionalDistribution::weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(id: u32, label: &str) -> Range {
        Range::new(RangeId::new(id), label, None)
    }

    #[test]
    fn test_probability_normalizes() {
        let map = ProbabilityMap::new()
            .with(RangeId::new(0), 6.0)
            .with(RangeId::new(1), 4.0);
        assert!((map.total() - 10.0).abs() < f64::EPSILON);
        assert!((map.probability(RangeId::new(0)).unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(map.probability(RangeId::new(5)), Some(0.0));
    }

    #[test]
    fn test_probability_zero_total() {
        let map = ProbabilityMap::new().with(RangeId::new(0), 0.0);
        assert_eq!(map.probability(RangeId::new(0)), None);
    }

    #[test]
    fn test_uniform_detection() {
        let ranges = vec![range(0, "a"), range(1, "b")];
        let uniform = ProbabilityMap::uniform(&ranges);
        assert!(uniform.is_uniform_over(&ranges));

        let skewed = uniform.clone().with(RangeId::new(1), 2.0);
        assert!(!skewed.is_uniform_over(&ranges));
        assert!(!uniform.is_uniform_over(&ranges[..1]));
    }

    #[test]
    fn test_select_first_matching_conditional() {
        let gender = PropertyId::new(0);
        let male = RangeId::new(0);
        let female = RangeId::new(1);

        let on_male = ProbabilityMap::new().with(RangeId::new(0), 10.0);
        let default = ProbabilityMap::new().with(RangeId::new(0), 25.0);
        let distribution = Distribution::new(
            vec![ConditionalDistribution::new(
                Condition::from([(gender, male)]),
                on_male.clone(),
            )],
            default.clone(),
        );

        assert_eq!(distribution.select(&Condition::from([(gender, male)])), &on_male);
        assert_eq!(
            distribution.select(&Condition::from([(gender, female)])),
            &default
        );
        assert_eq!(distribution.select(&Condition::new()), &default);
    }
}
