//! Document set -> Experiment
//!
//! ## Build order
//!
//! Top-level properties are committed in ascending dependency level, with
//! input order preserved among equal levels (a stable sort). Because a
//! property may only depend on strictly lower levels, every dependency is
//! committed, and resolvable by name, before its dependents are built.
//!
//! Layer properties are committed in declaration order with no level
//! ordering. A layer property that refers to a later-declared one therefore
//! fails with an unresolved property name.
//!
//! ## Atomicity
//!
//! All work happens in a private [`BuildSession`]; the experiment is handed
//! out only after every property and layer committed. Any error drops the
//! session, so callers see either a complete experiment or an error.

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, info};

use super::{NULL_DISTRIBUTION, UNIFORM_DISTRIBUTION};
use crate::codec::fields::Fields;
use crate::codec::{DocumentSet, DocumentType, NODE_SETTINGS};
use crate::error::ReferenceKind;
use crate::model::{Condition, Experiment, LayerId, ProbabilityMap, PropertyKind, Scope};
use crate::session::BuildSession;
use crate::{Error, Result};

/// Rebuild the experiment `experiment_name` from its decoded documents.
///
/// # Errors
///
/// Returns [`Error::Structural`] for missing fields, unknown kind tags or a
/// broken conditional/default ordering, [`Error::Unresolved`] for references
/// that do not resolve among already-built properties, and [`Error::Build`]
/// when a property violates a model invariant.
pub fn reconstruct(experiment_name: &str, documents: &DocumentSet) -> Result<Experiment> {
    Reconstructor::new(experiment_name, documents)?.run()
}

/// One property definition read from a wrapper.
#[derive(Debug, Clone, Copy)]
struct Definition<'a> {
    kind: PropertyKind,
    level: i64,
    name: &'a str,
    description: &'a str,
    distribution_id: &'a str,
    body: Fields<'a>,
}

/// Drives a [`BuildSession`] through one document set.
#[derive(Debug)]
pub struct Reconstructor<'a> {
    experiment_name: &'a str,
    documents: &'a DocumentSet,
    distributions: FxHashMap<&'a str, (&'a str, &'a Value)>,
    session: BuildSession,
}

impl<'a> Reconstructor<'a> {
    /// Index the distribution documents of the set.
    ///
    /// # Errors
    ///
    /// Returns error if a distribution document lacks its ID or two documents
    /// share one.
    pub fn new(experiment_name: &'a str, documents: &'a DocumentSet) -> Result<Self> {
        let mut distributions = FxHashMap::default();
        for (name, document) in documents.of_type(DocumentType::UnivariatDistribution) {
            let object = Fields::new(name, "Object", document.object())?;
            let id = object.str("UnivariatDistributionID")?;
            if let Some((previous, _)) = distributions.insert(id, (name, document.object())) {
                return Err(object.fail(
                    "UnivariatDistributionID",
                    format!("distribution ID `{id}` is also declared by document `{previous}`"),
                ));
            }
        }

        Ok(Self {
            experiment_name,
            documents,
            distributions,
            session: BuildSession::new(experiment_name),
        })
    }

    /// Build every property and layer, then hand out the experiment.
    ///
    /// # Errors
    ///
    /// See [`reconstruct`].
    pub fn run(mut self) -> Result<Experiment> {
        let settings = self.node_settings()?;

        let mut definitions = settings
            .array("PropertyDefinitionList")?
            .iter()
            .map(|wrapper| parse_definition(wrapper))
            .collect::<Result<Vec<_>>>()?;
        let layers = settings.array("LayerAttributesList")?;

        definitions.sort_by_key(|definition| definition.level);
        for definition in &definitions {
            self.build(definition, Scope::TopLevel)?;
        }

        for layer in layers {
            self.build_layer(layer)?;
        }

        let experiment = self.session.into_experiment()?;
        info!(
            experiment = %experiment.name(),
            properties = experiment.properties().len(),
            layers = experiment.layers().len(),
            "Experiment reconstructed"
        );
        Ok(experiment)
    }

    fn node_settings(&self) -> Result<Fields<'a>> {
        let document = self.documents.get(NODE_SETTINGS).ok_or_else(|| {
            Error::structural(
                NODE_SETTINGS,
                "<document>",
                "node settings document is missing",
                &Value::Null,
            )
        })?;
        if document.doc_type() != DocumentType::NodeSettings {
            return Err(Error::structural(
                NODE_SETTINGS,
                "Type",
                format!("expected `{NODE_SETTINGS}`, found `{}`", document.doc_type()),
                document.object(),
            ));
        }
        if document.experiment_name() != self.experiment_name {
            return Err(Error::structural(
                NODE_SETTINGS,
                "ExperimentName",
                format!(
                    "expected `{}`, found `{}`",
                    self.experiment_name,
                    document.experiment_name()
                ),
                &Value::String(document.experiment_name().to_string()),
            ));
        }
        Fields::new(NODE_SETTINGS, "Object", document.object())
    }

    fn build_layer(&mut self, layer: &'a Value) -> Result<()> {
        let fields = Fields::new(NODE_SETTINGS, "LayerAttributesList", layer)?;
        let raw_id = fields.i64("LayerID")?;
        let id = u32::try_from(raw_id)
            .map(LayerId::new)
            .map_err(|_| fields.fail("LayerID", format!("layer ID {raw_id} is out of range")))?;
        let name = match fields.optional("LayerName") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| fields.fail("LayerName", "expected a string"))?
                .to_string(),
            None => format!("layer{raw_id}"),
        };

        self.session.add_layer_with_id(id, name)?;
        for wrapper in fields.array("PropertyDefinitionList")? {
            let definition = parse_definition(wrapper)?;
            self.build(&definition, Scope::Layer(id))?;
        }
        Ok(())
    }

    fn build(&mut self, definition: &Definition<'a>, scope: Scope) -> Result<()> {
        let Definition {
            kind,
            level,
            name,
            description,
            distribution_id,
            body,
        } = *definition;

        match scope {
            Scope::TopLevel => self.session.new_property(name, kind, description)?,
            Scope::Layer(layer) => self
                .session
                .new_property_in_layer(layer, name, kind, description)?,
        }
        self.session.set_dependency_level(level)?;

        match kind {
            PropertyKind::Enumerator => {
                for label in body.array("EnumValues")? {
                    let label = label
                        .as_str()
                        .ok_or_else(|| body.fail("EnumValues", "expected a list of strings"))?;
                    self.session.add_range(label)?;
                }
            }
            PropertyKind::IntegerRange => {
                for entry in body.array("IntegerRangeList")? {
                    let entry = Fields::new(body.document(), "IntegerRangeList", entry)?;
                    let range = self.session.add_range(entry.str("RangeID")?)?;
                    self.session.set_range_min(range, entry.i64("Min")?)?;
                    self.session.set_range_max(range, entry.i64("Max")?)?;
                }
            }
            PropertyKind::Fraction => {
                if let Some(value) = body.optional("DisableRandom_UseInitValue") {
                    let value = value.as_f64().ok_or_else(|| {
                        body.fail("DisableRandom_UseInitValue", "expected a number")
                    })?;
                    self.session.set_fraction_init_value(value)?;
                }
            }
            PropertyKind::Boolean | PropertyKind::Attachment => {}
        }

        match distribution_id {
            UNIFORM_DISTRIBUTION => self.session.set_uniform_distribution()?,
            NULL_DISTRIBUTION if kind == PropertyKind::Fraction => {}
            NULL_DISTRIBUTION => {
                return Err(body.fail(
                    "DistributionID",
                    format!("`{NULL_DISTRIBUTION}` is only legal for Fraction properties, not {kind}"),
                ));
            }
            id => self.apply_distribution(id, scope, name)?,
        }

        let id = self.session.commit()?;
        debug!(property = %name, id = %id, %scope, level, "Property rebuilt");
        Ok(())
    }

    fn apply_distribution(&mut self, id: &str, scope: Scope, property: &str) -> Result<()> {
        let (document, object) = self.distributions.get(id).copied().ok_or_else(|| {
            Error::unresolved(
                ReferenceKind::DistributionId,
                id,
                format!("DistributionID of property `{property}`"),
            )
        })?;

        let fields = Fields::new(document, "Object", object)?;
        let bound = fields.str("BindToPropertyName")?;
        if bound != property {
            return Err(Error::unresolved(
                ReferenceKind::BoundProperty,
                bound,
                format!("distribution `{id}` in document `{document}` is referenced by property `{property}`"),
            ));
        }

        let entries = fields.array("DependencyDistributionList")?;
        if entries.is_empty() {
            return Err(fields.fail("DependencyDistributionList", "no default distribution found"));
        }

        let mut resolved: Vec<(Option<Condition>, ProbabilityMap)> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let entry = Fields::new(document, "DependencyDistributionList", entry)?;
            let conditions = entry
                .optional_array("PropertyDependencyList")?
                .filter(|conditions| !conditions.is_empty());
            let is_last = index + 1 == entries.len();

            match (&conditions, is_last) {
                (None, false) => {
                    return Err(entry.fail(
                        "PropertyDependencyList",
                        format!("default distribution found at position {index}, before the end of the list"),
                    ));
                }
                (Some(_), true) => {
                    return Err(entry.fail(
                        "PropertyDependencyList",
                        "no default distribution found: the last entry is conditional",
                    ));
                }
                _ => {}
            }

            let condition = conditions
                .map(|conditions| self.resolve_condition(document, conditions, scope))
                .transpose()?;
            let weights =
                self.resolve_samples(document, entry.array("DistributionSampleList")?, property)?;
            resolved.push((condition, weights));
        }

        for dependency in resolved
            .iter()
            .filter_map(|(condition, _)| condition.as_ref())
            .flat_map(Condition::keys)
        {
            self.session.add_dependency(*dependency)?;
        }
        for (condition, weights) in resolved {
            match condition {
                Some(condition) => self.session.add_conditional_distribution(condition, weights)?,
                None => self.session.set_default_distribution(weights)?,
            }
        }
        Ok(())
    }

    fn resolve_condition(&self, document: &str, entries: &[Value], scope: Scope) -> Result<Condition> {
        let mut condition = Condition::new();
        for entry in entries {
            let entry = Fields::new(document, "PropertyDependencyList", entry)?;
            let name = entry.str("Name")?;
            let label = entry.str("Value")?;

            let dependency = self.session.resolve_property(scope, name).ok_or_else(|| {
                Error::unresolved(
                    ReferenceKind::PropertyName,
                    name,
                    format!("condition in document `{document}` does not name an already-built property in the {scope}"),
                )
            })?;
            let range = self
                .session
                .resolve_range(scope, dependency, label)
                .ok_or_else(|| {
                    Error::unresolved(
                        ReferenceKind::RangeLabel,
                        label,
                        format!("condition on `{name}` in document `{document}`"),
                    )
                })?;

            if condition.insert(dependency, range).is_some() {
                return Err(entry.fail("Name", format!("property `{name}` is conditioned on twice")));
            }
        }
        Ok(condition)
    }

    fn resolve_samples(&self, document: &str, samples: &[Value], property: &str) -> Result<ProbabilityMap> {
        let mut weights = ProbabilityMap::new();
        for sample in samples {
            let sample = Fields::new(document, "DistributionSampleList", sample)?;
            let label = sample.str("Label")?;
            let value = sample.f64("Value")?;
            let range = self.session.resolve_scratch_range(label).ok_or_else(|| {
                Error::unresolved(
                    ReferenceKind::RangeLabel,
                    label,
                    format!("sample of property `{property}` in document `{document}`"),
                )
            })?;
            if weights.weight(range).is_some() {
                return Err(sample.fail("Label", format!("label `{label}` is weighted twice")));
            }
            weights.insert(range, value);
        }
        Ok(weights)
    }
}

fn parse_definition(wrapper: &Value) -> Result<Definition<'_>> {
    let fields = Fields::new(NODE_SETTINGS, "PropertyDefinitionList", wrapper)?;
    let mut tags = fields.object().iter();
    let (tag, body) = match (tags.next(), tags.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(fields.fail(
                "<wrapper>",
                format!(
                    "expected exactly one kind tag, found {}",
                    fields.object().len()
                ),
            ));
        }
    };
    let kind = PropertyKind::from_tag(tag)
        .ok_or_else(|| fields.fail(tag, format!("unknown property kind tag `{tag}`")))?;

    let body = Fields::new(NODE_SETTINGS, kind.tag(), body)?;
    Ok(Definition {
        kind,
        level: body.i64("Dependency Level")?,
        name: body.str("PropertyName")?,
        description: body.str("Description")?,
        distribution_id: body.str("DistributionID")?,
        body,
    })
}
