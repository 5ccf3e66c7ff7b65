//! Round trip: build an experiment, save it, load it back
//!
//! Builds a small SEIR-style property model with one contact layer, stores
//! it through a `Repository`, prints the stored documents, and rebuilds it.
//!
//! Run with: RUST_LOG=debug cargo run --example round_trip

use anyhow::Result;
use netprop_db::model::{ProbabilityMap, PropertyKind, Scope};
use netprop_db::session::BuildSession;
use netprop_db::store::{DocumentStore, MemoryDocumentStore};
use netprop_db::Repository;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== netprop-db Round Trip ===\n");

    let mut session = BuildSession::new("seir");

    session.new_property("gender", PropertyKind::Enumerator, "Biological sex")?;
    let male = session.add_range("male")?;
    let female = session.add_range("female")?;
    session.set_default_distribution(ProbabilityMap::new().with(male, 6.0).with(female, 4.0))?;
    let gender = session.commit()?;

    session.new_property("risk_days", PropertyKind::IntegerRange, "Days at elevated risk")?;
    session.set_dependency_level(1)?;
    let transient = session.add_range("transient")?;
    session.set_range_min(transient, 1)?;
    session.set_range_max(transient, 14)?;
    let steady = session.add_range("steady")?;
    session.set_range_min(steady, 365)?;
    session.set_range_max(steady, 3650)?;
    session.add_dependency(gender)?;
    session.add_conditional_distribution(
        [(gender, male)].into_iter().collect(),
        ProbabilityMap::new().with(transient, 10.0).with(steady, 90.0),
    )?;
    session.set_default_distribution(ProbabilityMap::new().with(transient, 25.0).with(steady, 75.0))?;
    session.commit()?;

    session.new_property("compliance", PropertyKind::Fraction, "Share of guidance followed")?;
    session.set_fraction_init_value(0.8)?;
    session.commit()?;

    let layer = session.add_layer("drug_co_use")?;
    session.new_property_in_layer(layer, "averagedegree", PropertyKind::Enumerator, "")?;
    session.add_range("low")?;
    session.add_range("high")?;
    session.set_uniform_distribution()?;
    session.commit()?;

    let experiment = session.into_experiment()?;
    println!(
        "Built `{}`: {} properties, {} layers",
        experiment.name(),
        experiment.property_count(),
        experiment.layers().len()
    );

    let repository = Repository::builder(MemoryDocumentStore::new())
        .pretty(true)
        .build();
    repository.save(&experiment)?;

    println!("\n=== Stored Documents ===");
    for (name, text) in repository.store().load("seir")? {
        println!("--- {name} ---\n{text}\n");
    }

    let restored = repository.load("seir")?;
    let risk_days = restored
        .property_by_name(Scope::TopLevel, "risk_days")
        .ok_or_else(|| anyhow::anyhow!("risk_days missing after reload"))?;
    println!("=== Restored ===");
    println!("  risk_days level: {}", risk_days.dependency_level());
    println!("  risk_days dependencies: {:?}", risk_days.dependencies());
    println!("  same model: {}", restored.snapshot() == experiment.snapshot());

    Ok(())
}
