//! Association pipeline tests: CSV batches through the queue and
//! resolver, anchor/satellite linking, and standalone imports.

use frauddesk_core::{
    engine::{FraudDesk, FraudReport},
    evaluator::FraudStatus,
    record::ReportTag,
    types::AccountKey,
};
use std::collections::HashMap;

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn acme_batch() -> Vec<HashMap<String, String>> {
    vec![
        row(&[
            ("Business Name", "Acme"),
            ("Owner Name", "Pat Vance"),
            ("Routing Number", "111000025"),
            ("Account Number", "998877661234"),
            ("Default Account", "true"),
        ]),
        row(&[
            ("Business Name", "Acme"),
            ("Owner Name", "Pat Vance"),
            ("Routing Number", "222000037"),
            ("Account Number", "556677889999"),
            ("Default Account", "false"),
        ]),
    ]
}

/// An approved batch links the satellite to the anchor's account.
#[test]
fn satellite_links_to_first_anchor() {
    let mut desk = FraudDesk::build_test(42).unwrap();
    let upload = desk
        .upload_batch("Acme Capital", "acme.csv", None, &acme_batch())
        .unwrap();
    let summary = desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.associated, 1);
    assert_eq!(summary.skipped, 0);

    let check = desk.check_account("222000037", "9999").unwrap();
    assert_eq!(check.status, FraudStatus::Associated);
    assert_eq!(check.tags, vec![ReportTag::AssociatedAccount]);
    let parent = check.associated_account.expect("parent summary");
    assert_eq!(parent.routing_number, "111000025");
    assert_eq!(parent.account_number_last4, "1234");
    assert_eq!(parent.flagged_by, vec!["Acme Capital".to_string()]);
}

/// The flagged parent of an associated account is itself Flagged.
#[test]
fn association_link_resolves_to_flagged_record() {
    let mut desk = FraudDesk::build_test(42).unwrap();
    let upload = desk
        .upload_batch("Acme Capital", "acme.csv", None, &acme_batch())
        .unwrap();
    desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();

    let satellite = desk
        .store
        .get_account(&AccountKey::new("222000037", "9999"))
        .unwrap()
        .unwrap();
    assert!(satellite.is_associated);
    let parent_key = satellite.associated_with.clone().expect("link");
    assert_ne!(parent_key, satellite.key());

    let parent_check = desk
        .check_account(&parent_key.routing_number, &parent_key.account_number_last4)
        .unwrap();
    assert_eq!(parent_check.status, FraudStatus::Flagged);
}

/// A group with no default rows imports satellites as standalone
/// records: tagged associated_account but never linked.
#[test]
fn anchorless_group_imports_standalone() {
    let mut desk = FraudDesk::build_test(42).unwrap();
    let rows = vec![
        row(&[
            ("Business Name", "Orbit Services"),
            ("Owner Name", "Dana Cole"),
            ("Routing Number", "061000104"),
            ("Account Number", "44556001"),
            ("Default Account", "no"),
        ]),
        row(&[
            ("Business Name", "Orbit Services"),
            ("Owner Name", "Dana Cole"),
            ("Routing Number", "061000104"),
            ("Account Number", "44556002"),
            ("Default Account", ""),
        ]),
    ];
    let upload = desk
        .upload_batch("Orbit Watch", "orbit.csv", None, &rows)
        .unwrap();
    let summary = desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.associated, 0);

    for last4 in ["6001", "6002"] {
        let record = desk
            .store
            .get_account(&AccountKey::new("061000104", last4))
            .unwrap()
            .unwrap();
        assert!(record.associated_with.is_none());
        assert_eq!(record.submissions.len(), 1);
        assert_eq!(record.submissions[0].tags, vec![ReportTag::AssociatedAccount]);

        let check = desk.check_account("061000104", last4).unwrap();
        assert_eq!(check.status, FraudStatus::NotReported);
        assert!(check.tags.is_empty());
    }
}

/// Rows without a usable routing number are skipped, not fatal.
#[test]
fn placeholder_routing_rows_are_skipped() {
    let mut desk = FraudDesk::build_test(42).unwrap();
    let rows = vec![
        row(&[
            ("Business Name", "Keystone Construction"),
            ("Owner Name", "Sam Reed"),
            ("Routing Number", "-"),
            ("Account Number", "12345678"),
            ("Default Account", "true"),
        ]),
        row(&[
            ("Business Name", "Keystone Construction"),
            ("Owner Name", "Sam Reed"),
            ("Routing Number", "121000248"),
            ("Account Number", "87654321"),
            ("Default Account", "true"),
        ]),
    ];
    let upload = desk
        .upload_batch("Keystone Watch", "keystone.csv", None, &rows)
        .unwrap();
    let summary = desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(desk.store.account_count().unwrap(), 1);
}

/// Short account numbers fall back to the "0000" last-4 sentinel.
#[test]
fn short_account_number_gets_sentinel_last4() {
    let mut desk = FraudDesk::build_test(42).unwrap();
    let rows = vec![row(&[
        ("Business Name", "Bluewave Digital"),
        ("Owner Name", "Ira Lane"),
        ("Routing Number", "071000013"),
        ("Account Number", "12"),
        ("Default Account", "yes"),
    ])];
    let upload = desk
        .upload_batch("Bluewave Watch", "bluewave.csv", None, &rows)
        .unwrap();
    desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();

    let record = desk
        .store
        .get_account(&AccountKey::new("071000013", "0000"))
        .unwrap()
        .expect("record keyed by sentinel last4");
    assert_eq!(record.submissions[0].tags, vec![ReportTag::BankDisconnected]);
}

/// Tag inference follows the business-name rules, and Default anchors
/// get a synthesized balance.
#[test]
fn inferred_tags_follow_business_name() {
    let mut desk = FraudDesk::build_test(42).unwrap();
    let cases = [
        ("Apex Transport LLC", "9100001", ReportTag::Stacking),
        ("Sunrise Health Partners", "9100002", ReportTag::FakeDeposits),
        ("Keystone Construction", "9100003", ReportTag::Default),
        ("Summit Holding Group", "9100004", ReportTag::ExcessiveNsfs),
        ("Metro Auto Sales", "9100005", ReportTag::BlockedPayments),
    ];
    let rows: Vec<_> = cases
        .iter()
        .map(|&(business, account, _)| {
            row(&[
                ("Business Name", business),
                ("Owner Name", "Various Owners"),
                ("Routing Number", "121000248"),
                ("Account Number", account),
                ("Default Account", "1"),
            ])
        })
        .collect();
    let upload = desk
        .upload_batch("Seed Desk", "seed.csv", None, &rows)
        .unwrap();
    let summary = desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();
    assert_eq!(summary.imported, cases.len());

    for (business, account, expected) in cases {
        let last4 = &account[account.len() - 4..];
        let record = desk
            .store
            .get_account(&AccountKey::new("121000248", last4))
            .unwrap()
            .unwrap_or_else(|| panic!("record for {business}"));
        let submission = &record.submissions[0];
        assert_eq!(submission.tags, vec![expected], "{business}");
        assert_eq!(
            submission.default_balance.is_some(),
            expected == ReportTag::Default,
            "balance only with the default tag ({business})"
        );
        let notes = submission.notes.as_deref().unwrap_or_default();
        assert!(notes.contains(business), "note mentions {business}");
    }
}

/// The same seed and the same batch reproduce every seeded decision:
/// fallback tags, synthesized balances, and check-count bumps.
#[test]
fn seeded_imports_are_reproducible() {
    let batch = vec![
        row(&[
            ("Business Name", "Zebra Ventures"),
            ("Owner Name", "Kim Ota"),
            ("Routing Number", "091000019"),
            ("Account Number", "70001234"),
            ("Default Account", "true"),
        ]),
        row(&[
            ("Business Name", "Quartz Partners"),
            ("Owner Name", "Lee Shaw"),
            ("Routing Number", "091000019"),
            ("Account Number", "70009999"),
            ("Default Account", "true"),
        ]),
    ];

    let run = |seed: u64| {
        let mut desk = FraudDesk::build_test(seed).unwrap();
        let upload = desk
            .upload_batch("Seed Desk", "seed.csv", None, &batch)
            .unwrap();
        desk.approve_upload(&upload.upload_id, "admin@desk.test").unwrap();
        desk.store
            .all_accounts()
            .unwrap()
            .into_iter()
            .map(|(key, record)| {
                let s = &record.submissions[0];
                (key, s.tags.clone(), s.default_balance.clone(), record.times_checked)
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(1234), run(1234));
}

/// Interactive reports can link satellite accounts directly.
#[test]
fn interactive_report_links_satellites() {
    let desk = FraudDesk::build_test(42).unwrap();
    let report = FraudReport {
        routing_number: "021000021".into(),
        account_number_last4: "5678".into(),
        submitted_by: "ops@lender.test".into(),
        company_name: "Loot".into(),
        disclose_company: true,
        account_holder_name: "Jordan Blake".into(),
        tags: vec![ReportTag::Fraud],
        notes: None,
        default_balance: None,
        associated_accounts: vec![AccountKey::new("026009593", "1199")],
    };
    desk.submit_report(report).unwrap();

    let check = desk.check_account("026009593", "1199").unwrap();
    assert_eq!(check.status, FraudStatus::Associated);
    let parent = check.associated_account.expect("parent summary");
    assert_eq!(parent.routing_number, "021000021");
    assert_eq!(parent.flagged_by, vec!["Loot".to_string()]);
}
