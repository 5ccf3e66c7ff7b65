//! Serialization and reconstruction engine
//!
//! [`serialize`] flattens an [`Experiment`](crate::model::Experiment) into a
//! [`DocumentSet`](crate::codec::DocumentSet): one node settings document
//! plus one distribution document for every distribution that is neither
//! uniform nor absent. [`reconstruct`] reverses it by replaying the documents
//! through a [`BuildSession`](crate::session::BuildSession), so every model
//! invariant is checked exactly as it is for hand-built experiments.

mod reconstruct;
mod serialize;

pub use reconstruct::{reconstruct, Reconstructor};
pub use serialize::serialize;

/// `DistributionID` for an unconditional distribution with weight 1 on every range.
pub const UNIFORM_DISTRIBUTION: &str = "uniform";

/// `DistributionID` for a Fraction property without distribution.
pub const NULL_DISTRIBUTION: &str = "null";
