//! Experiment -> document set

use std::collections::HashSet;

use tracing::info;

use super::{NULL_DISTRIBUTION, UNIFORM_DISTRIBUTION};
use crate::codec::schema::{
    ConditionEntry, DependencyDistribution, DistributionBody, IntegerRangeEntry, LayerAttributes,
    NodeSettingsBody, PropertyBody, PropertyWrapper, Sample,
};
use crate::codec::{Document, DocumentSet, DocumentType, NODE_SETTINGS};
use crate::error::ReferenceKind;
use crate::model::{Distribution, Experiment, KindSpec, ProbabilityMap, Property};
use crate::{Error, Result};

/// Serialize an experiment into one node settings document plus one
/// distribution document per non-trivial distribution.
///
/// Properties are written in `(dependency level, id)` order within every
/// scope, which is also the order reconstruction commits them in.
///
/// # Errors
///
/// Returns error if a dependency or range referenced by a distribution is
/// missing from the experiment, or JSON encoding fails.
pub fn serialize(experiment: &Experiment) -> Result<DocumentSet> {
    let mut writer = Writer {
        experiment_name: experiment.name(),
        documents: DocumentSet::new(),
        used_ids: HashSet::new(),
    };

    let properties = writer.scope(experiment.properties(), "")?;
    let mut layers = Vec::with_capacity(experiment.layers().len());
    for layer in experiment.layers() {
        let prefix = format!("layer{}.", layer.id().get());
        layers.push(LayerAttributes {
            layer_id: layer.id().get(),
            layer_name: Some(layer.name().to_string()),
            properties: writer.scope(layer.properties(), &prefix)?,
        });
    }

    let body = NodeSettingsBody { properties, layers };
    let mut documents = writer.documents;
    documents.insert(
        NODE_SETTINGS,
        Document::wrap(experiment.name(), DocumentType::NodeSettings, &body)?,
    );

    info!(
        experiment = %experiment.name(),
        properties = experiment.property_count(),
        documents = documents.len(),
        "Experiment serialized"
    );
    Ok(documents)
}

struct Writer<'a> {
    experiment_name: &'a str,
    documents: DocumentSet,
    used_ids: HashSet<String>,
}

impl Writer<'_> {
    fn scope(&mut self, properties: &[Property], prefix: &str) -> Result<Vec<PropertyWrapper>> {
        let mut ordered: Vec<&Property> = properties.iter().collect();
        ordered.sort_by_key(|property| (property.dependency_level(), property.id()));
        ordered
            .into_iter()
            .map(|property| self.wrapper(property, properties, prefix))
            .collect()
    }

    fn wrapper(
        &mut self,
        property: &Property,
        scope: &[Property],
        prefix: &str,
    ) -> Result<PropertyWrapper> {
        let distribution_id = match property.distribution() {
            None => NULL_DISTRIBUTION.to_string(),
            Some(distribution)
                if distribution.is_unconditional()
                    && distribution
                        .default_weights()
                        .is_uniform_over(property.ranges()) =>
            {
                UNIFORM_DISTRIBUTION.to_string()
            }
            Some(distribution) => self.distribution(property, distribution, scope, prefix)?,
        };

        let mut body = PropertyBody {
            dependency_level: property.dependency_level(),
            name: property.name().to_string(),
            description: property.description().to_string(),
            distribution_id,
            enum_values: None,
            integer_ranges: None,
            init_value: None,
        };

        Ok(match property.spec() {
            KindSpec::Enumerator { ranges } => {
                body.enum_values = Some(ranges.iter().map(|r| r.label().to_string()).collect());
                PropertyWrapper::Enumerator(body)
            }
            KindSpec::IntegerRange { ranges } => {
                body.integer_ranges = Some(
                    ranges
                        .iter()
                        .filter_map(|range| {
                            range.bounds().map(|bounds| IntegerRangeEntry {
                                label: range.label().to_string(),
                                min: bounds.min,
                                max: bounds.max,
                            })
                        })
                        .collect(),
                );
                PropertyWrapper::IntegerRange(body)
            }
            KindSpec::Boolean { .. } => PropertyWrapper::Boolean(body),
            KindSpec::Fraction { init_value } => {
                body.init_value = Some(*init_value);
                PropertyWrapper::Fraction(body)
            }
            KindSpec::Attachment => PropertyWrapper::Attachment(body),
        })
    }

    fn distribution(
        &mut self,
        property: &Property,
        distribution: &Distribution,
        scope: &[Property],
        prefix: &str,
    ) -> Result<String> {
        let id = self.allocate_id(&format!("{prefix}{}_distribution", property.name()));

        let mut entries = Vec::with_capacity(distribution.conditionals().len() + 1);
        for conditional in distribution.conditionals() {
            let mut conditions = Vec::with_capacity(conditional.condition().len());
            for (dependency, range) in conditional.condition() {
                let target = scope
                    .iter()
                    .find(|candidate| candidate.id() == *dependency)
                    .ok_or_else(|| {
                        Error::unresolved(
                            ReferenceKind::PropertyName,
                            dependency.to_string(),
                            format!("condition of property `{}`", property.name()),
                        )
                    })?;
                let label = target.range(*range).ok_or_else(|| {
                    Error::unresolved(
                        ReferenceKind::RangeLabel,
                        range.to_string(),
                        format!("value of `{}` in a condition of `{}`", target.name(), property.name()),
                    )
                })?;
                conditions.push(ConditionEntry {
                    name: target.name().to_string(),
                    value: label.label().to_string(),
                });
            }
            entries.push(DependencyDistribution {
                conditions: Some(conditions),
                samples: samples(conditional.weights(), property)?,
            });
        }
        entries.push(DependencyDistribution {
            conditions: None,
            samples: samples(distribution.default_weights(), property)?,
        });

        let body = DistributionBody {
            id: id.clone(),
            bind_to: property.name().to_string(),
            entries,
        };
        self.documents.insert(
            id.clone(),
            Document::wrap(self.experiment_name, DocumentType::UnivariatDistribution, &body)?,
        );
        Ok(id)
    }

    /// Sanitized, unique document ID that cannot be mistaken for a keyword.
    fn allocate_id(&mut self, raw: &str) -> String {
        let base: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.used_ids.contains(&candidate)
            || candidate == NODE_SETTINGS
            || candidate == UNIFORM_DISTRIBUTION
            || candidate == NULL_DISTRIBUTION
        {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.used_ids.insert(candidate.clone());
        candidate
    }
}

fn samples(weights: &ProbabilityMap, property: &Property) -> Result<Vec<Sample>> {
    weights
        .iter()
        .map(|(range, weight)| {
            let label = property.range(range).ok_or_else(|| {
                Error::unresolved(
                    ReferenceKind::RangeLabel,
                    range.to_string(),
                    format!("weights of property `{}`", property.name()),
                )
            })?;
            Ok(Sample {
                label: label.label().to_string(),
                value: weight,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::schema::NodeSettingsBody;
    use crate::model::PropertyKind;
    use crate::session::BuildSession;

    #[test]
    fn test_uniform_and_null_shortcuts() {
        let mut session = BuildSession::new("exp");
        session
            .new_property("vaccinated", PropertyKind::Boolean, "")
            .unwrap();
        session.set_uniform_distribution().unwrap();
        session.commit().unwrap();
        session
            .new_property("compliance", PropertyKind::Fraction, "")
            .unwrap();
        session.set_fraction_init_value(0.75).unwrap();
        session.commit().unwrap();
        let experiment = session.into_experiment().unwrap();

        let documents = serialize(&experiment).unwrap();
        assert_eq!(documents.len(), 1);

        let settings = documents.get(NODE_SETTINGS).unwrap();
        let body: NodeSettingsBody = serde_json::from_value(settings.object().clone()).unwrap();
        let ids: Vec<&str> = body
            .properties
            .iter()
            .map(|w| w.body().distribution_id.as_str())
            .collect();
        assert_eq!(ids, vec!["uniform", "null"]);
    }

    #[test]
    fn test_properties_written_in_level_order() {
        let mut session = BuildSession::new("exp");
        session.new_property("late", PropertyKind::Boolean, "").unwrap();
        session.set_dependency_level(2).unwrap();
        session.set_uniform_distribution().unwrap();
        session.commit().unwrap();
        session.new_property("early", PropertyKind::Boolean, "").unwrap();
        session.set_uniform_distribution().unwrap();
        session.commit().unwrap();
        let experiment = session.into_experiment().unwrap();

        let documents = serialize(&experiment).unwrap();
        let body: NodeSettingsBody =
            serde_json::from_value(documents.get(NODE_SETTINGS).unwrap().object().clone()).unwrap();
        let names: Vec<&str> = body.properties.iter().map(|w| w.body().name.as_str()).collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[test]
    fn test_allocate_id_sanitizes_and_deduplicates() {
        let mut writer = Writer {
            experiment_name: "exp",
            documents: DocumentSet::new(),
            used_ids: HashSet::new(),
        };
        assert_eq!(writer.allocate_id("risk days/x"), "risk_days_x");
        assert_eq!(writer.allocate_id("risk days/x"), "risk_days_x_2");
        assert_eq!(writer.allocate_id("uniform"), "uniform_2");
    }
}
