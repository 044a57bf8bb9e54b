//! Normalizer integration tests: boolean parsing across ingestion
//! paths, header mapping, and malformed-row handling.

use frauddesk_core::{
    engine::FraudDesk,
    error::FraudDbError,
    normalize::{self, is_true_value, ColumnMapping},
};
use std::collections::HashMap;

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The boolean rule is uniform: trimmed, case-insensitive membership in
/// the truthy set; everything else (including absence) is false.
#[test]
fn boolean_parsing_is_uniform() {
    assert_eq!(is_true_value("TRUE"), is_true_value("true"));
    assert!(is_true_value("Yes"));
    assert!(is_true_value(" 1 "));
    assert!(is_true_value("T"));
    assert!(is_true_value("y"));
    assert!(!is_true_value(""));
    assert!(!is_true_value("false"));
    assert!(!is_true_value("0"));
    assert!(!is_true_value("on"));
}

/// Blank lines and context-free rows are dropped; the rest survive.
#[test]
fn malformed_rows_are_dropped_not_fatal() {
    let mapping = ColumnMapping::detect(&["Business Name", "Routing Number", "Account Number"]);
    let rows = vec![
        row(&[
            ("Business Name", "Acme"),
            ("Routing Number", "111000025"),
            ("Account Number", "12345678"),
        ]),
        row(&[
            ("Business Name", ""),
            ("Routing Number", ""),
            ("Account Number", ""),
        ]),
        row(&[
            ("Business Name", "Orbit Services"),
            ("Routing Number", "061000104"),
            ("Account Number", "44556001"),
        ]),
    ];
    let normalized = normalize::normalize_batch(&mapping, &rows).unwrap();
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].business_name, "Acme");
    assert_eq!(normalized[1].bank_account_routing, "061000104");
}

/// A batch with zero valid rows fails as a whole.
#[test]
fn all_blank_batch_is_an_error() {
    let mapping = ColumnMapping::detect(&["Routing Number", "Account Number"]);
    let rows = vec![
        row(&[("Routing Number", ""), ("Account Number", "")]),
        row(&[("Routing Number", " "), ("Account Number", "")]),
    ];
    let err = normalize::normalize_batch(&mapping, &rows).unwrap_err();
    assert!(matches!(err, FraudDbError::EmptyBatch));
}

/// Uploads with unmappable required columns are rejected before any
/// store mutation.
#[test]
fn unmappable_upload_is_rejected_up_front() {
    let desk = FraudDesk::build_test(42).unwrap();
    let rows = vec![row(&[("Business Name", "Acme"), ("Owner Name", "Pat Vance")])];
    let err = desk
        .upload_batch("Acme Capital", "acme.csv", None, &rows)
        .unwrap_err();
    assert!(matches!(err, FraudDbError::MissingColumn { .. }));
    assert!(desk.uploads().unwrap().is_empty());
    assert_eq!(desk.store.account_count().unwrap(), 0);
}

/// An explicit user mapping overrides header detection entirely.
#[test]
fn explicit_mapping_overrides_detection() {
    let mapping = ColumnMapping {
        business_name: Some("col_a".into()),
        owner_name: Some("col_b".into()),
        routing: Some("col_c".into()),
        account_number: Some("col_d".into()),
        is_default: Some("col_e".into()),
        ..Default::default()
    };
    let rows = vec![row(&[
        ("col_a", "Acme"),
        ("col_b", "Pat Vance"),
        ("col_c", "111000025"),
        ("col_d", "998877661234"),
        ("col_e", "y"),
    ])];
    let normalized = normalize::normalize_batch(&mapping, &rows).unwrap();
    assert_eq!(normalized[0].business_name, "Acme");
    assert_eq!(normalized[0].owner_name, "Pat Vance");
    assert_eq!(normalized[0].bank_account_routing, "111000025");
    assert!(normalized[0].is_default_account);
    assert!(!normalized[0].is_main_account);
}

/// Detection tolerates casing and decoration in headers.
#[test]
fn detection_is_case_insensitive() {
    let mapping = ColumnMapping::detect(&["BUSINESS NAME", "routing #", "bank account number"]);
    assert_eq!(mapping.business_name.as_deref(), Some("BUSINESS NAME"));
    assert_eq!(mapping.routing.as_deref(), Some("routing #"));
    assert_eq!(mapping.account_number.as_deref(), Some("bank account number"));
    assert!(mapping.is_usable());
}
