//! Node Property Model
//!
//! Typed node attributes used to parameterize a network simulation,
//! organized by dependency level and optionally partitioned into layers.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Property (N) [top-level scope]
//!      │                 ├──< Range (N)
//!      │                 └── Distribution ──< ConditionalDistribution (N)
//!      │                                  └── default ProbabilityMap
//!      └──< Layer (N) ──< Property (N) [layer scope]
//! ```
//!
//! Values of these types are produced only by
//! [`BuildSession`](crate::session::BuildSession) or by reconstruction, which
//! drives the same session.

mod distribution;
mod experiment;
mod ids;
mod layer;
mod property;
mod snapshot;

pub use distribution::{Condition, ConditionalDistribution, Distribution, ProbabilityMap};
pub use experiment::{Experiment, Scope};
pub use ids::{LayerId, PropertyId, RangeId};
pub use layer::Layer;
pub use property::{Bounds, KindSpec, Property, PropertyKind, Range, BOOLEAN_LABELS};
pub use snapshot::{
    DistributionSnapshot, ExperimentSnapshot, LabelCondition, LabelWeights, LayerSnapshot,
    PropertySnapshot,
};
