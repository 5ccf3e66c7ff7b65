//! Tests for error types

use std::path::PathBuf;

use netprop_db::model::{PropertyId, Scope};
use netprop_db::session::BuildError;
use netprop_db::{Error, ErrorKind, ReferenceKind};

#[test]
fn test_store_unavailable_error() {
    let error = Error::StoreUnavailable("/srv/experiments: No such file".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Document store unavailable"));
    assert!(error_str.contains("/srv/experiments"));
    assert_eq!(error.kind(), ErrorKind::Environment);
}

#[test]
fn test_experiment_not_found_error() {
    let error = Error::ExperimentNotFound("seir".to_string());
    assert_eq!(format!("{error}"), "Experiment not found: seir");
    assert_eq!(error.kind(), ErrorKind::Environment);
}

#[test]
fn test_not_a_directory_error() {
    let error = Error::NotADirectory(PathBuf::from("/tmp/store.txt"));
    let error_str = format!("{error}");
    assert!(error_str.contains("Not a directory"));
    assert!(error_str.contains("/tmp/store.txt"));
}

#[test]
fn test_structural_error() {
    let error = Error::Structural {
        document: "risk_days_distribution".to_string(),
        field: "DependencyDistributionList".to_string(),
        reason: "no default distribution found".to_string(),
        fragment: "[]".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Malformed document `risk_days_distribution`"));
    assert!(error_str.contains("no default distribution found"));
    assert!(error_str.contains("Fragment: []"));
    assert_eq!(error.kind(), ErrorKind::Structural);
}

#[test]
fn test_unresolved_error() {
    let error = Error::Unresolved {
        kind: ReferenceKind::RangeLabel,
        reference: "chronic".to_string(),
        context: "sample of property `risk_days`".to_string(),
    };
    assert_eq!(
        format!("{error}"),
        "Unresolved range label `chronic`: sample of property `risk_days`"
    );
    assert_eq!(error.kind(), ErrorKind::Referential);
}

#[test]
fn test_build_error_classification() {
    let structural: Error = BuildError::MissingInitValue("compliance".to_string()).into();
    assert_eq!(structural.kind(), ErrorKind::Structural);
    assert!(format!("{structural}").contains("Invalid property definition"));

    let referential: Error = BuildError::UnknownProperty {
        scope: Scope::TopLevel,
        id: PropertyId::new(4),
    }
    .into();
    assert_eq!(referential.kind(), ErrorKind::Referential);
    assert!(format!("{referential}").contains("property#4"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: Error = io.into();
    assert!(format!("{error}").starts_with("IO error"));
    assert_eq!(error.kind(), ErrorKind::Environment);
}

#[test]
fn test_json_error_conversion() {
    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json.into();
    assert!(format!("{error}").starts_with("JSON error"));
    assert_eq!(error.kind(), ErrorKind::Structural);
}
