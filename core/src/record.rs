//! The persisted fraud-report model: account records and submissions.
//!
//! An AccountRecord is a write-once audit log per account: its check
//! counter only grows and its submission list is only appended to.

use crate::types::AccountKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The reportable conditions a submission can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTag {
    Fraud,
    Default,
    Stacking,
    FakeDeposits,
    BankDisconnected,
    BlockedPayments,
    ExcessiveNsfs,
    AssociatedAccount,
}

impl ReportTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fraud => "fraud",
            Self::Default => "default",
            Self::Stacking => "stacking",
            Self::FakeDeposits => "fake_deposits",
            Self::BankDisconnected => "bank_disconnected",
            Self::BlockedPayments => "blocked_payments",
            Self::ExcessiveNsfs => "excessive_nsfs",
            Self::AssociatedAccount => "associated_account",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "fraud" => Some(Self::Fraud),
            "default" => Some(Self::Default),
            "stacking" => Some(Self::Stacking),
            "fake_deposits" => Some(Self::FakeDeposits),
            "bank_disconnected" => Some(Self::BankDisconnected),
            "blocked_payments" => Some(Self::BlockedPayments),
            "excessive_nsfs" => Some(Self::ExcessiveNsfs),
            "associated_account" => Some(Self::AssociatedAccount),
            _ => None,
        }
    }
}

impl fmt::Display for ReportTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fraud report (or association link), immutable once appended.
///
/// Invariant: is_associated == true implies tags is exactly
/// [AssociatedAccount]; associated_with names the flagged parent when
/// the importing group had one (standalone satellites carry no link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: String,
    pub submitted_by: String,
    /// RFC 3339 UTC timestamp.
    pub submitted_date: String,
    pub company_name: String,
    pub account_holder_name: String,
    pub tags: Vec<ReportTag>,
    pub notes: Option<String>,
    /// Only present alongside the Default tag.
    pub default_balance: Option<String>,
    pub is_associated: bool,
    pub associated_with: Option<AccountKey>,
}

/// One record per account key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub routing_number: String,
    pub account_number_last4: String,
    pub bank_name: String,
    /// Bumped on every lookup; never decreases.
    pub times_checked: i64,
    /// Append-only.
    pub submissions: Vec<Submission>,
    pub is_associated: bool,
    pub associated_with: Option<AccountKey>,
}

impl AccountRecord {
    pub fn new(key: &AccountKey, bank_name: impl Into<String>) -> Self {
        Self {
            routing_number: key.routing_number.clone(),
            account_number_last4: key.account_number_last4.clone(),
            bank_name: bank_name.into(),
            times_checked: 0,
            submissions: Vec::new(),
            is_associated: false,
            associated_with: None,
        }
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(&*self.routing_number, &*self.account_number_last4)
    }

    /// Submissions that are actual fraud reports, not association links.
    pub fn non_associated(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.iter().filter(|s| !s.is_associated)
    }

    /// The association link submission, if this record carries one.
    pub fn association_submission(&self) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.is_associated)
    }
}
