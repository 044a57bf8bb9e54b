//! Wire contract for third-party integrators.
//!
//! Maps the desk's operations onto the documented fraud-check and
//! submit-fraud payloads. The transport (the runner's IPC loop today)
//! lives elsewhere; these types define the shapes it must serve.

use crate::{
    engine::FraudReport,
    error::{FraudDbError, FraudDbResult},
    evaluator::FraudCheck,
    record::ReportTag,
    types::AccountKey,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct FraudCheckRequest {
    pub routing_number: String,
    pub account_number_last4: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudCheckResponse {
    /// "Fraudulent" | "Associated" | "Not Reported"
    pub fraud_status: String,
    pub flagged_count: i64,
    pub flagged_by: Vec<String>,
    pub tags: Vec<String>,
    pub times_checked: i64,
    pub recommendation: String,
}

impl From<&FraudCheck> for FraudCheckResponse {
    fn from(check: &FraudCheck) -> Self {
        Self {
            fraud_status: check.status.wire_label().to_string(),
            flagged_count: check.flagged_count,
            flagged_by: check.flagged_by.clone(),
            tags: check.tags.iter().map(|t| t.as_str().to_string()).collect(),
            times_checked: check.times_checked,
            recommendation: check.recommendation().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociatedAccountRef {
    pub routing_number: String,
    pub account_number_last4: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitFraudRequest {
    pub routing_number: String,
    pub account_number_last4: String,
    pub submitted_by: String,
    pub company_name: String,
    #[serde(default = "default_disclose")]
    pub disclose_company: bool,
    #[serde(default)]
    pub account_holder_name: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub default_balance: Option<String>,
    #[serde(default)]
    pub associated_accounts: Vec<AssociatedAccountRef>,
}

fn default_disclose() -> bool {
    true
}

impl SubmitFraudRequest {
    /// Validate the wire tags and build the desk's report input.
    pub fn into_report(self) -> FraudDbResult<FraudReport> {
        let mut tags = Vec::with_capacity(self.tags.len());
        for raw in &self.tags {
            let tag = ReportTag::parse(raw)
                .ok_or_else(|| FraudDbError::InvalidTag { tag: raw.clone() })?;
            tags.push(tag);
        }
        Ok(FraudReport {
            routing_number: self.routing_number,
            account_number_last4: self.account_number_last4,
            submitted_by: self.submitted_by,
            company_name: self.company_name,
            disclose_company: self.disclose_company,
            account_holder_name: self.account_holder_name,
            tags,
            notes: self.notes,
            default_balance: self.default_balance,
            associated_accounts: self
                .associated_accounts
                .into_iter()
                .map(|a| AccountKey::new(a.routing_number, a.account_number_last4))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitFraudResponse {
    pub submission_id: String,
    pub status: String,
}

impl SubmitFraudResponse {
    pub fn accepted(submission_id: String) -> Self {
        Self {
            submission_id,
            status: "accepted".to_string(),
        }
    }
}
