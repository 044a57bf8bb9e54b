//! Fraud status evaluation — answers "what is the risk status of this
//! account?" from its accumulated submissions.
//!
//! Lookups are deliberately not idempotent: every evaluation bumps the
//! record's check counter, creating the record on first sight. Callers
//! must not assume a read leaves the store untouched.

use crate::{
    bank_directory,
    config::DeskConfig,
    error::FraudDbResult,
    record::{AccountRecord, ReportTag, Submission},
    store::Store,
    types::AccountKey,
};
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudStatus {
    Flagged,
    Associated,
    NotReported,
}

impl FraudStatus {
    /// The status string of the external wire contract.
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::Flagged => "Fraudulent",
            Self::Associated => "Associated",
            Self::NotReported => "Not Reported",
        }
    }
}

/// Context about the flagged parent of an associated account.
#[derive(Debug, Clone, Serialize)]
pub struct AssociatedAccountSummary {
    pub routing_number: String,
    pub account_number_last4: String,
    pub bank_name: String,
    /// Companies that reported the parent, de-duplicated in
    /// first-occurrence order.
    pub flagged_by: Vec<String>,
}

/// The aggregated answer for one account lookup.
#[derive(Debug, Clone, Serialize)]
pub struct FraudCheck {
    pub status: FraudStatus,
    pub routing_number: String,
    pub account_number_last4: String,
    pub bank_name: String,
    pub times_checked: i64,
    pub flagged_count: i64,
    pub flagged_by: Vec<String>,
    pub last_flagged_date: Option<String>,
    pub tags: Vec<ReportTag>,
    pub notes: Option<String>,
    pub default_balance: Option<String>,
    pub associated_account: Option<AssociatedAccountSummary>,
}

impl FraudCheck {
    /// Advisory line carried on the wire contract.
    pub fn recommendation(&self) -> &'static str {
        match self.status {
            FraudStatus::Flagged => "Do not proceed. This account has active fraud reports.",
            FraudStatus::Associated => {
                "Manual review recommended. This account is linked to a flagged account."
            }
            FraudStatus::NotReported => "No adverse reports on file for this account.",
        }
    }
}

/// Evaluate one account key. Creates the record on first lookup and
/// bumps times_checked on every lookup.
pub fn evaluate(store: &Store, config: &DeskConfig, key: &AccountKey) -> FraudDbResult<FraudCheck> {
    let record = touch(store, config, key)?;

    if record.is_associated {
        if let Some(parent_key) = record.associated_with.clone() {
            if let Some(parent) = store.get_account(&parent_key)? {
                return Ok(associated_check(&record, &parent));
            }
        }
    }
    if record.non_associated().next().is_some() {
        return Ok(flagged_check(&record));
    }
    Ok(not_reported_check(&record))
}

/// Scan all records for a submission whose account holder name contains
/// the query, case-insensitively. First match only; reports the flagged
/// view or Not Reported, never Associated.
pub fn search_by_holder_name(
    store: &Store,
    config: &DeskConfig,
    query: &str,
) -> FraudDbResult<Option<FraudCheck>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(None);
    }
    for (_, record) in store.all_accounts()? {
        let hit = record
            .submissions
            .iter()
            .any(|s| s.account_holder_name.to_lowercase().contains(&needle));
        if hit {
            let touched = touch(store, config, &record.key())?;
            if touched.non_associated().next().is_some() {
                return Ok(Some(flagged_check(&touched)));
            }
            return Ok(Some(not_reported_check(&touched)));
        }
    }
    Ok(None)
}

/// Load-or-create the record and bump its check counter by exactly one.
fn touch(store: &Store, config: &DeskConfig, key: &AccountKey) -> FraudDbResult<AccountRecord> {
    let mut record = match store.get_account(key)? {
        Some(existing) => existing,
        None => AccountRecord::new(
            key,
            bank_directory::infer_bank_name(config, &key.routing_number),
        ),
    };
    record.times_checked += 1;
    store.put_account(&record)?;
    log::debug!("Checked {key}: times_checked={}", record.times_checked);
    Ok(record)
}

fn flagged_check(record: &AccountRecord) -> FraudCheck {
    let reports: Vec<&Submission> = record.non_associated().collect();
    let flagged_by = dedup_in_order(reports.iter().map(|s| s.company_name.clone()));
    let tags = dedup_in_order(reports.iter().flat_map(|s| s.tags.iter().copied()));
    let notes: Vec<&str> = reports
        .iter()
        .filter_map(|s| s.notes.as_deref())
        .filter(|n| !n.is_empty())
        .collect();
    // First submission carrying a balance wins; never summed.
    let default_balance = reports.iter().find_map(|s| s.default_balance.clone());

    FraudCheck {
        status: FraudStatus::Flagged,
        routing_number: record.routing_number.clone(),
        account_number_last4: record.account_number_last4.clone(),
        bank_name: record.bank_name.clone(),
        times_checked: record.times_checked,
        flagged_count: reports.len() as i64,
        flagged_by,
        last_flagged_date: reports.last().map(|s| s.submitted_date.clone()),
        tags,
        notes: Some(notes.join(" | ")).filter(|joined| !joined.is_empty()),
        default_balance,
        associated_account: None,
    }
}

fn associated_check(record: &AccountRecord, parent: &AccountRecord) -> FraudCheck {
    FraudCheck {
        status: FraudStatus::Associated,
        routing_number: record.routing_number.clone(),
        account_number_last4: record.account_number_last4.clone(),
        bank_name: record.bank_name.clone(),
        times_checked: record.times_checked,
        flagged_count: 0,
        flagged_by: Vec::new(),
        last_flagged_date: None,
        tags: vec![ReportTag::AssociatedAccount],
        notes: record
            .association_submission()
            .and_then(|s| s.notes.clone()),
        default_balance: None,
        associated_account: Some(AssociatedAccountSummary {
            routing_number: parent.routing_number.clone(),
            account_number_last4: parent.account_number_last4.clone(),
            bank_name: parent.bank_name.clone(),
            flagged_by: dedup_in_order(parent.non_associated().map(|s| s.company_name.clone())),
        }),
    }
}

fn not_reported_check(record: &AccountRecord) -> FraudCheck {
    FraudCheck {
        status: FraudStatus::NotReported,
        routing_number: record.routing_number.clone(),
        account_number_last4: record.account_number_last4.clone(),
        bank_name: record.bank_name.clone(),
        times_checked: record.times_checked,
        flagged_count: 0,
        flagged_by: Vec::new(),
        last_flagged_date: None,
        tags: Vec::new(),
        notes: None,
        default_balance: None,
        associated_account: None,
    }
}

fn dedup_in_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}
