//! Build Session - the only way to create or change a property
//!
//! A session owns one [`Experiment`] under construction plus at most one
//! scratch property. All editing calls touch only the scratch buffer;
//! [`BuildSession::commit`] validates it and, on success, moves it into the
//! experiment with a freshly assigned ID.
//!
//! ## Usage
//!
//! ```rust
//! use netprop_db::model::{ProbabilityMap, PropertyKind};
//! use netprop_db::session::BuildSession;
//!
//! let mut session = BuildSession::new("baseline");
//!
//! session.new_property("gender", PropertyKind::Enumerator, "Sex of the node")?;
//! let male = session.add_range("male")?;
//! let female = session.add_range("female")?;
//! session.set_default_distribution(ProbabilityMap::new().with(male, 6.0).with(female, 4.0))?;
//! let gender = session.commit()?;
//!
//! let experiment = session.into_experiment()?;
//! assert_eq!(experiment.properties()[0].id(), gender);
//! # Ok::<(), netprop_db::session::BuildError>(())
//! ```

mod error;
mod scratch;
mod symbols;

pub use error::BuildError;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::model::{
    Condition, ConditionalDistribution, Experiment, Layer, LayerId, ProbabilityMap, Property,
    PropertyId, PropertyKind, RangeId, Scope,
};
use scratch::ScratchProperty;
use symbols::SymbolTables;

/// Result type for session operations
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Stateful, one-property-at-a-time editor of an experiment.
///
/// Not meant to be shared: one session models exactly one in-progress edit
/// or reconstruction.
#[derive(Debug)]
pub struct BuildSession {
    experiment: Experiment,
    scratch: Option<ScratchProperty>,
    symbols: SymbolTables,
    next_property: FxHashMap<Scope, u32>,
    next_layer: u32,
}

impl BuildSession {
    /// Start an empty experiment.
    #[must_use]
    pub fn new(experiment_name: impl Into<String>) -> Self {
        Self::from_experiment(Experiment::new(experiment_name))
    }

    /// Continue editing an existing experiment.
    ///
    /// Fresh IDs continue after the highest ID already used in each scope.
    #[must_use]
    pub fn from_experiment(experiment: Experiment) -> Self {
        let mut symbols = SymbolTables::default();
        let mut next_property = FxHashMap::default();

        let scopes = std::iter::once((Scope::TopLevel, experiment.properties()))
            .chain(
                experiment
                    .layers()
                    .iter()
                    .map(|layer| (Scope::Layer(layer.id()), layer.properties())),
            );
        for (scope, properties) in scopes {
            symbols.open_scope(scope);
            for property in properties {
                symbols.register(scope, property);
            }
            let next = properties
                .iter()
                .map(|property| property.id().get().saturating_add(1))
                .max()
                .unwrap_or(0);
            next_property.insert(scope, next);
        }

        let next_layer = experiment
            .layers()
            .iter()
            .map(|layer| layer.id().get().saturating_add(1))
            .max()
            .unwrap_or(0);

        Self {
            experiment,
            scratch: None,
            symbols,
            next_property,
            next_layer,
        }
    }

    /// Get the committed state.
    #[must_use]
    pub const fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Finish the session and hand out the experiment.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ScratchInProgress`] while a property is still
    /// under construction.
    pub fn into_experiment(self) -> BuildResult<Experiment> {
        match self.scratch {
            Some(scratch) => Err(BuildError::ScratchInProgress(scratch.name)),
            None => Ok(self.experiment),
        }
    }

    /// Whether a property is under construction.
    #[must_use]
    pub const fn has_scratch(&self) -> bool {
        self.scratch.is_some()
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    /// Create a layer with the next free ID.
    ///
    /// # Errors
    ///
    /// Returns error if the name is already used by another layer.
    pub fn add_layer(&mut self, name: impl Into<String>) -> BuildResult<LayerId> {
        self.add_layer_with_id(LayerId::new(self.next_layer), name)
    }

    /// Create a layer with a caller-chosen ID (used when restoring documents).
    ///
    /// # Errors
    ///
    /// Returns error if the ID or the name is already in use.
    pub fn add_layer_with_id(&mut self, id: LayerId, name: impl Into<String>) -> BuildResult<LayerId> {
        let name = name.into();
        if self.experiment.layer(id).is_some() {
            return Err(BuildError::DuplicateLayer(id));
        }
        if self.experiment.layer_by_name(&name).is_some() {
            return Err(BuildError::DuplicateLayerName(name));
        }
        let next = id
            .get()
            .checked_add(1)
            .ok_or(BuildError::LayerIdOverflow(id))?;

        debug!(layer = %id, name = %name, "Layer added");
        self.experiment.layers.push(Layer::new(id, name));
        self.symbols.open_scope(Scope::Layer(id));
        self.next_property.insert(Scope::Layer(id), 0);
        self.next_layer = self.next_layer.max(next);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Scratch lifecycle
    // ------------------------------------------------------------------

    /// Begin a new top-level scratch property.
    ///
    /// # Errors
    ///
    /// Returns error if the name exists at top level or another scratch
    /// property is open.
    pub fn new_property(
        &mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        description: impl Into<String>,
    ) -> BuildResult<()> {
        self.open_scratch(Scope::TopLevel, name.into(), kind, description.into())
    }

    /// Begin a new scratch property inside a layer.
    ///
    /// # Errors
    ///
    /// Returns error if the layer is unknown, the name exists in the layer,
    /// or another scratch property is open.
    pub fn new_property_in_layer(
        &mut self,
        layer: LayerId,
        name: impl Into<String>,
        kind: PropertyKind,
        description: impl Into<String>,
    ) -> BuildResult<()> {
        if self.experiment.layer(layer).is_none() {
            return Err(BuildError::UnknownLayer(layer));
        }
        self.open_scratch(Scope::Layer(layer), name.into(), kind, description.into())
    }

    fn open_scratch(
        &mut self,
        scope: Scope,
        name: String,
        kind: PropertyKind,
        description: String,
    ) -> BuildResult<()> {
        self.ensure_no_scratch()?;
        if self.symbols.property(scope, &name).is_some() {
            return Err(BuildError::DuplicateName { scope, name });
        }
        self.scratch = Some(ScratchProperty::new(scope, name, kind, description));
        Ok(())
    }

    /// Reopen a committed property for editing; commit keeps its ID.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or another scratch
    /// property is open.
    pub fn edit_property(&mut self, scope: Scope, id: PropertyId) -> BuildResult<()> {
        self.ensure_no_scratch()?;
        let property = self.committed(scope, id)?;
        self.scratch = Some(ScratchProperty::from_property(scope, property));
        Ok(())
    }

    /// Drop the scratch property without committing it.
    pub fn discard(&mut self) {
        self.scratch = None;
    }

    /// Remove a committed property. Its ID is never handed out again.
    ///
    /// # Errors
    ///
    /// Returns error if the property does not exist or another property in
    /// the scope depends on it.
    pub fn remove_property(&mut self, scope: Scope, id: PropertyId) -> BuildResult<Property> {
        self.ensure_no_scratch()?;
        let property = self.committed(scope, id)?;
        if let Some(dependent) = self
            .scope(scope)?
            .iter()
            .find(|candidate| candidate.dependencies().contains(&id))
        {
            return Err(BuildError::PropertyInUse {
                property: property.name().to_string(),
                dependent: dependent.name().to_string(),
            });
        }

        let properties = self
            .experiment
            .scope_mut(scope)
            .ok_or(BuildError::UnknownProperty { scope, id })?;
        let position = properties
            .iter()
            .position(|property| property.id() == id)
            .ok_or(BuildError::UnknownProperty { scope, id })?;
        let removed = properties.remove(position);
        self.symbols.unregister(scope, &removed);
        debug!(property = %removed.name(), %scope, "Property removed");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Scratch edits
    // ------------------------------------------------------------------

    /// Set the dependency level of the scratch property.
    ///
    /// # Errors
    ///
    /// Returns error if the level is negative or exceeds `u32::MAX`.
    pub fn set_dependency_level(&mut self, level: i64) -> BuildResult<()> {
        let level = u32::try_from(level).map_err(|_| BuildError::InvalidDependencyLevel(level))?;
        self.scratch_mut()?.dependency_level = level;
        Ok(())
    }

    /// Replace the description of the scratch property.
    ///
    /// # Errors
    ///
    /// Returns error if no property is under construction.
    pub fn set_description(&mut self, description: impl Into<String>) -> BuildResult<()> {
        self.scratch_mut()?.description = description.into();
        Ok(())
    }

    /// Add a range and return its ID.
    ///
    /// # Errors
    ///
    /// Returns error for kinds without user ranges or a duplicate label.
    pub fn add_range(&mut self, label: impl Into<String>) -> BuildResult<RangeId> {
        let label = label.into();
        let scratch = self.scratch_mut()?;
        if !scratch.kind.accepts_ranges() {
            return Err(BuildError::KindMismatch {
                kind: scratch.kind,
                operation: "add_range",
            });
        }
        if scratch.range_id(&label).is_some() {
            return Err(BuildError::DuplicateRangeLabel {
                property: scratch.name.clone(),
                label,
            });
        }
        Ok(scratch.push_range(label))
    }

    /// Set the lower bound of an integer range. Ordering is checked at commit.
    ///
    /// # Errors
    ///
    /// Returns error for non-`IntegerRange` properties or an unknown range.
    pub fn set_range_min(&mut self, range: RangeId, value: i64) -> BuildResult<()> {
        let scratch = self.scratch_mut()?;
        scratch.require_kind(PropertyKind::IntegerRange, "set_range_min")?;
        scratch.range_mut(range)?.min = Some(value);
        Ok(())
    }

    /// Set the upper bound of an integer range. Ordering is checked at commit.
    ///
    /// # Errors
    ///
    /// Returns error for non-`IntegerRange` properties or an unknown range.
    pub fn set_range_max(&mut self, range: RangeId, value: i64) -> BuildResult<()> {
        let scratch = self.scratch_mut()?;
        scratch.require_kind(PropertyKind::IntegerRange, "set_range_max")?;
        scratch.range_mut(range)?.max = Some(value);
        Ok(())
    }

    /// Set the fixed value of a Fraction.
    ///
    /// # Errors
    ///
    /// Returns error for non-Fraction properties or a value outside `[0, 1]`.
    pub fn set_fraction_init_value(&mut self, value: f64) -> BuildResult<()> {
        let scratch = self.scratch_mut()?;
        scratch.require_kind(PropertyKind::Fraction, "set_fraction_init_value")?;
        if !(0.0..=1.0).contains(&value) {
            return Err(BuildError::InvalidInitValue(value));
        }
        scratch.init_value = Some(value);
        Ok(())
    }

    /// Declare that the scratch property is conditioned on `dependency`.
    ///
    /// # Errors
    ///
    /// Returns error if the dependency is not committed in the same scope or
    /// its level is not strictly below the scratch property's level.
    pub fn add_dependency(&mut self, dependency: PropertyId) -> BuildResult<()> {
        let scratch = self.scratch.as_ref().ok_or(BuildError::NoScratch)?;
        let target = self.committed(scratch.scope, dependency)?;
        if target.dependency_level() >= scratch.dependency_level {
            return Err(BuildError::IllegalDependency {
                property: scratch.name.clone(),
                level: scratch.dependency_level,
                dependency: target.name().to_string(),
                dependency_level: target.dependency_level(),
            });
        }
        self.scratch_mut()?.dependencies.insert(dependency);
        Ok(())
    }

    /// Request weight 1 on every range, resolved at commit time.
    ///
    /// # Errors
    ///
    /// Returns error if no property is under construction.
    pub fn set_uniform_distribution(&mut self) -> BuildResult<()> {
        let scratch = self.scratch_mut()?;
        scratch.uniform = true;
        scratch.default = None;
        Ok(())
    }

    /// Replace the trailing unconditional distribution.
    ///
    /// # Errors
    ///
    /// Returns error if a key is not one of the scratch ranges or a weight is
    /// negative or not finite.
    pub fn set_default_distribution(&mut self, weights: ProbabilityMap) -> BuildResult<()> {
        let scratch = self.scratch_mut()?;
        scratch.check_weights(&weights)?;
        scratch.default = Some(weights);
        scratch.uniform = false;
        Ok(())
    }

    /// Append one conditional entry.
    ///
    /// # Errors
    ///
    /// Returns error if the condition is empty, a key is not a declared dependency, a
    /// condition value is not a range of that dependency, or the weights are
    /// invalid for the scratch property.
    pub fn add_conditional_distribution(
        &mut self,
        condition: Condition,
        weights: ProbabilityMap,
    ) -> BuildResult<()> {
        let scratch = self.scratch.as_ref().ok_or(BuildError::NoScratch)?;
        if condition.is_empty() {
            return Err(BuildError::EmptyCondition);
        }
        for (dependency, range) in &condition {
            if !scratch.dependencies.contains(dependency) {
                return Err(BuildError::UndeclaredCondition(*dependency));
            }
            let target = self.committed(scratch.scope, *dependency)?;
            if target.range(*range).is_none() {
                return Err(BuildError::UnknownRange {
                    property: target.name().to_string(),
                    range: *range,
                });
            }
        }
        scratch.check_weights(&weights)?;

        self.scratch_mut()?
            .conditionals
            .push(ConditionalDistribution::new(condition, weights));
        Ok(())
    }

    /// Validate the scratch property and move it into the experiment.
    ///
    /// On failure the scratch property is left untouched so the caller can
    /// fix it and retry.
    ///
    /// # Errors
    ///
    /// Returns error if kind-required fields are missing, an integer range
    /// has `min > max`, a dependency is illegal or unused, or (for edits) a
    /// dependent property's level is no longer strictly higher.
    pub fn commit(&mut self) -> BuildResult<PropertyId> {
        let scratch = self.scratch.as_ref().ok_or(BuildError::NoScratch)?;
        let scope = scratch.scope;

        for dependency in &scratch.dependencies {
            let target = self.committed(scope, *dependency)?;
            if target.dependency_level() >= scratch.dependency_level {
                return Err(BuildError::IllegalDependency {
                    property: scratch.name.clone(),
                    level: scratch.dependency_level,
                    dependency: target.name().to_string(),
                    dependency_level: target.dependency_level(),
                });
            }
        }
        if let Some(existing) = scratch.existing {
            self.check_dependents(scratch, existing)?;
        }

        let existing = scratch.existing;
        let id = match existing {
            Some(existing) => existing,
            None => PropertyId::new(self.next_property.get(&scope).copied().unwrap_or(0)),
        };
        let property = scratch.build(id)?;

        let properties = self
            .experiment
            .scope_mut(scope)
            .ok_or(BuildError::UnknownProperty { scope, id })?;
        match (existing, properties.iter_mut().find(|candidate| candidate.id() == id)) {
            (Some(_), Some(slot)) => *slot = property.clone(),
            (Some(_), None) => return Err(BuildError::UnknownProperty { scope, id }),
            (None, _) => {
                properties.push(property.clone());
                let next = self.next_property.entry(scope).or_insert(0);
                *next = (*next).max(id.get().saturating_add(1));
            }
        }
        self.symbols.register(scope, &property);
        self.scratch = None;

        debug!(property = %property.name(), id = %id, %scope, level = property.dependency_level(), "Property committed");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve a committed property name within a scope.
    #[must_use]
    pub fn resolve_property(&self, scope: Scope, name: &str) -> Option<PropertyId> {
        self.symbols.property(scope, name)
    }

    /// Resolve a range label of a committed property.
    #[must_use]
    pub fn resolve_range(&self, scope: Scope, property: PropertyId, label: &str) -> Option<RangeId> {
        self.symbols.range(scope, property, label)
    }

    /// Resolve a range label of the scratch property.
    #[must_use]
    pub fn resolve_scratch_range(&self, label: &str) -> Option<RangeId> {
        self.scratch.as_ref()?.range_id(label)
    }

    /// Scope of the scratch property.
    #[must_use]
    pub fn scratch_scope(&self) -> Option<Scope> {
        self.scratch.as_ref().map(|scratch| scratch.scope)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn ensure_no_scratch(&self) -> BuildResult<()> {
        match &self.scratch {
            Some(scratch) => Err(BuildError::ScratchInProgress(scratch.name.clone())),
            None => Ok(()),
        }
    }

    fn scratch_mut(&mut self) -> BuildResult<&mut ScratchProperty> {
        self.scratch.as_mut().ok_or(BuildError::NoScratch)
    }

    fn scope(&self, scope: Scope) -> BuildResult<&[Property]> {
        match scope {
            Scope::Layer(layer) => self
                .experiment
                .scope(scope)
                .ok_or(BuildError::UnknownLayer(layer)),
            Scope::TopLevel => Ok(self.experiment.properties()),
        }
    }

    fn committed(&self, scope: Scope, id: PropertyId) -> BuildResult<&Property> {
        self.experiment
            .property(scope, id)
            .ok_or(BuildError::UnknownProperty { scope, id })
    }

    fn check_dependents(&self, scratch: &ScratchProperty, id: PropertyId) -> BuildResult<()> {
        let dependent = self.scope(scratch.scope)?.iter().find(|candidate| {
            candidate.dependencies().contains(&id)
                && candidate.dependency_level() <= scratch.dependency_level
        });
        match dependent {
            Some(dependent) => Err(BuildError::LevelConflict {
                property: scratch.name.clone(),
                level: scratch.dependency_level,
                dependent: dependent.name().to_string(),
                dependent_level: dependent.dependency_level(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gender(session: &mut BuildSession) -> (PropertyId, RangeId, RangeId) {
        session
            .new_property("gender", PropertyKind::Enumerator, "Sex of the node")
            .unwrap();
        let male = session.add_range("male").unwrap();
        let female = session.add_range("female").unwrap();
        session
            .set_default_distribution(ProbabilityMap::new().with(male, 6.0).with(female, 4.0))
            .unwrap();
        (session.commit().unwrap(), male, female)
    }

    #[test]
    fn test_ids_assigned_sequentially_at_commit() {
        let mut session = BuildSession::new("exp");
        let (first, _, _) = gender(&mut session);

        session
            .new_property("vaccinated", PropertyKind::Boolean, "")
            .unwrap();
        session.set_uniform_distribution().unwrap();
        let second = session.commit().unwrap();

        assert_eq!(first, PropertyId::new(0));
        assert_eq!(second, PropertyId::new(1));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut session = BuildSession::new("exp");
        gender(&mut session);
        let err = session
            .new_property("gender", PropertyKind::Boolean, "")
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateName { .. }));
        assert!(!session.has_scratch());
    }

    #[test]
    fn test_negative_level_rejected() {
        let mut session = BuildSession::new("exp");
        session.new_property("p", PropertyKind::Boolean, "").unwrap();
        assert_eq!(
            session.set_dependency_level(-1),
            Err(BuildError::InvalidDependencyLevel(-1))
        );
    }

    #[test]
    fn test_duplicate_range_label_rejected() {
        let mut session = BuildSession::new("exp");
        session.new_property("p", PropertyKind::Enumerator, "").unwrap();
        session.add_range("a").unwrap();
        assert!(matches!(
            session.add_range("a"),
            Err(BuildError::DuplicateRangeLabel { .. })
        ));
    }

    #[test]
    fn test_add_range_rejected_for_boolean() {
        let mut session = BuildSession::new("exp");
        session.new_property("p", PropertyKind::Boolean, "").unwrap();
        assert!(matches!(
            session.add_range("maybe"),
            Err(BuildError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_dependency_on_same_level_rejected() {
        let mut session = BuildSession::new("exp");
        let (gender_id, _, _) = gender(&mut session);

        session.new_property("risk", PropertyKind::Boolean, "").unwrap();
        assert!(matches!(
            session.add_dependency(gender_id),
            Err(BuildError::IllegalDependency { .. })
        ));

        session.set_dependency_level(1).unwrap();
        session.add_dependency(gender_id).unwrap();
    }

    #[test]
    fn test_commit_rejects_inverted_range_and_allows_retry() {
        let mut session = BuildSession::new("exp");
        session
            .new_property("days", PropertyKind::IntegerRange, "")
            .unwrap();
        let range = session.add_range("short").unwrap();
        session.set_range_min(range, 14).unwrap();
        session.set_range_max(range, 1).unwrap();
        session.set_uniform_distribution().unwrap();

        assert!(matches!(
            session.commit(),
            Err(BuildError::InvertedRange { min: 14, max: 1, .. })
        ));
        assert!(session.has_scratch());
        assert!(session.experiment().properties().is_empty());

        session.set_range_max(range, 30).unwrap();
        assert_eq!(session.commit().unwrap(), PropertyId::new(0));
    }

    #[test]
    fn test_conditional_requires_declared_dependency() {
        let mut session = BuildSession::new("exp");
        let (gender_id, male, _) = gender(&mut session);

        session.new_property("risk", PropertyKind::Boolean, "").unwrap();
        session.set_dependency_level(1).unwrap();
        let condition = Condition::from([(gender_id, male)]);
        assert_eq!(
            session.add_conditional_distribution(condition.clone(), ProbabilityMap::new()),
            Err(BuildError::UndeclaredCondition(gender_id))
        );

        session.add_dependency(gender_id).unwrap();
        session
            .add_conditional_distribution(condition, ProbabilityMap::new())
            .unwrap();
        session.set_uniform_distribution().unwrap();
        session.commit().unwrap();
    }

    #[test]
    fn test_unused_dependency_rejected() {
        let mut session = BuildSession::new("exp");
        let (gender_id, _, _) = gender(&mut session);

        session.new_property("risk", PropertyKind::Boolean, "").unwrap();
        session.set_dependency_level(1).unwrap();
        session.add_dependency(gender_id).unwrap();
        session.set_uniform_distribution().unwrap();
        assert_eq!(
            session.commit(),
            Err(BuildError::UnusedDependency(gender_id))
        );
    }

    #[test]
    fn test_level_lowered_below_dependency_fails_at_commit() {
        let mut session = BuildSession::new("exp");
        let (gender_id, male, _) = gender(&mut session);

        session.new_property("risk", PropertyKind::Boolean, "").unwrap();
        session.set_dependency_level(1).unwrap();
        session.add_dependency(gender_id).unwrap();
        session
            .add_conditional_distribution(Condition::from([(gender_id, male)]), ProbabilityMap::new())
            .unwrap();
        session.set_uniform_distribution().unwrap();
        session.set_dependency_level(0).unwrap();
        assert!(matches!(
            session.commit(),
            Err(BuildError::IllegalDependency { .. })
        ));
    }

    #[test]
    fn test_fraction_init_value_kind_checked() {
        let mut session = BuildSession::new("exp");
        session.new_property("p", PropertyKind::Boolean, "").unwrap();
        assert!(matches!(
            session.set_fraction_init_value(0.5),
            Err(BuildError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_layer_scopes_are_independent() {
        let mut session = BuildSession::new("exp");
        gender(&mut session);
        let layer = session.add_layer("drug_co_use").unwrap();

        session
            .new_property_in_layer(layer, "gender", PropertyKind::Boolean, "")
            .unwrap();
        session.set_uniform_distribution().unwrap();
        let id = session.commit().unwrap();

        assert_eq!(id, PropertyId::new(0));
        assert_eq!(
            session.resolve_property(Scope::Layer(layer), "gender"),
            Some(PropertyId::new(0))
        );
        assert_eq!(session.experiment().property_count(), 2);
    }

    #[test]
    fn test_edit_keeps_id_and_checks_dependents() {
        let mut session = BuildSession::new("exp");
        let (gender_id, male, _) = gender(&mut session);

        session.new_property("risk", PropertyKind::Boolean, "").unwrap();
        session.set_dependency_level(1).unwrap();
        session.add_dependency(gender_id).unwrap();
        session
            .add_conditional_distribution(Condition::from([(gender_id, male)]), ProbabilityMap::new())
            .unwrap();
        session.set_uniform_distribution().unwrap();
        session.commit().unwrap();

        session.edit_property(Scope::TopLevel, gender_id).unwrap();
        session.add_range("other").unwrap();
        session.set_dependency_level(1).unwrap();
        assert!(matches!(
            session.commit(),
            Err(BuildError::LevelConflict { .. })
        ));
        session.set_dependency_level(0).unwrap();
        assert_eq!(session.commit().unwrap(), gender_id);

        let gender = session.experiment().property(Scope::TopLevel, gender_id).unwrap();
        assert_eq!(gender.ranges().len(), 3);
    }

    #[test]
    fn test_removed_ids_not_reused() {
        let mut session = BuildSession::new("exp");
        let (gender_id, _, _) = gender(&mut session);
        session.remove_property(Scope::TopLevel, gender_id).unwrap();

        session.new_property("gender", PropertyKind::Boolean, "").unwrap();
        session.set_uniform_distribution().unwrap();
        assert_eq!(session.commit().unwrap(), PropertyId::new(1));
    }

    #[test]
    fn test_remove_rejected_while_editing() {
        let mut session = BuildSession::new("exp");
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            session.new_property(name, PropertyKind::Boolean, "").unwrap();
            session.set_uniform_distribution().unwrap();
            ids.push(session.commit().unwrap());
        }

        session.edit_property(Scope::TopLevel, ids[0]).unwrap();
        assert_eq!(
            session.remove_property(Scope::TopLevel, ids[0]).unwrap_err(),
            BuildError::ScratchInProgress("a".to_string())
        );
        assert_eq!(session.commit().unwrap(), ids[0]);

        session.new_property("d", PropertyKind::Boolean, "").unwrap();
        session.set_uniform_distribution().unwrap();
        assert_eq!(session.commit().unwrap(), PropertyId::new(3));

        let experiment = session.experiment();
        let names: Vec<(&str, PropertyId)> = experiment
            .properties()
            .iter()
            .map(|p| (p.name(), p.id()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a", ids[0]),
                ("b", ids[1]),
                ("c", ids[2]),
                ("d", PropertyId::new(3))
            ]
        );
        assert_eq!(session.resolve_property(Scope::TopLevel, "b"), Some(ids[1]));
    }

    #[test]
    fn test_last_layer_id_rejected() {
        let mut session = BuildSession::new("exp");
        let last = LayerId::new(u32::MAX);
        assert_eq!(
            session.add_layer_with_id(last, "edge").unwrap_err(),
            BuildError::LayerIdOverflow(last)
        );
        assert!(session.experiment().layers().is_empty());
        assert_eq!(session.add_layer("first").unwrap(), LayerId::new(0));
    }

    #[test]
    fn test_into_experiment_with_open_scratch_fails() {
        let mut session = BuildSession::new("exp");
        session.new_property("p", PropertyKind::Boolean, "").unwrap();
        assert_eq!(
            session.into_experiment().unwrap_err(),
            BuildError::ScratchInProgress("p".to_string())
        );
    }
}
