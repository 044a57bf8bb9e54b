//! The desk facade — wires the store, configuration, and import RNG
//! into the operation surface that runners, UIs, and tests drive.
//!
//! RULES:
//!   - All store access goes through this facade or the components it
//!     delegates to; callers never touch SQL.
//!   - The import RNG lives here so every approval draws from one
//!     seeded stream.

use crate::{
    bank_directory,
    config::DeskConfig,
    error::{FraudDbError, FraudDbResult},
    evaluator::{self, FraudCheck},
    normalize::{self, ColumnMapping},
    queue::{self, PendingUpload},
    record::{AccountRecord, ReportTag, Submission},
    resolver::{AssociationResolver, ImportSummary},
    rng::ImportRng,
    store::Store,
    types::AccountKey,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Company name substituted when a reporter opts out of disclosure.
pub const UNDISCLOSED: &str = "Undisclosed";

/// One interactive fraud report, as entered on the submission form or
/// received through the submit-fraud wire operation.
#[derive(Debug, Clone)]
pub struct FraudReport {
    pub routing_number: String,
    pub account_number_last4: String,
    pub submitted_by: String,
    pub company_name: String,
    /// Privacy toggle; false substitutes [`UNDISCLOSED`].
    pub disclose_company: bool,
    pub account_holder_name: String,
    pub tags: Vec<ReportTag>,
    pub notes: Option<String>,
    /// Required when tags include Default.
    pub default_balance: Option<String>,
    /// Satellite accounts to link back to this one.
    pub associated_accounts: Vec<AccountKey>,
}

pub struct FraudDesk {
    pub store: Store,
    config: DeskConfig,
    rng: ImportRng,
    resolver: AssociationResolver,
}

impl FraudDesk {
    pub fn new(store: Store, config: DeskConfig, seed: u64) -> Self {
        Self {
            store,
            config,
            rng: ImportRng::seeded(seed),
            resolver: AssociationResolver::new(),
        }
    }

    /// In-memory desk with test config; the integration tests' entry
    /// point.
    pub fn build_test(seed: u64) -> FraudDbResult<Self> {
        let store = Store::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, DeskConfig::default_test(), seed))
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    // ── Checks ────────────────────────────────────────────────────

    pub fn check_account(&self, routing_number: &str, last4: &str) -> FraudDbResult<FraudCheck> {
        let key = AccountKey::new(routing_number.trim(), last4.trim());
        evaluator::evaluate(&self.store, &self.config, &key)
    }

    pub fn search_holder(&self, query: &str) -> FraudDbResult<Option<FraudCheck>> {
        evaluator::search_by_holder_name(&self.store, &self.config, query)
    }

    // ── Interactive submission ────────────────────────────────────

    /// Record one fraud report and link any reported satellite
    /// accounts back to it. Returns the submission id.
    pub fn submit_report(&self, report: FraudReport) -> FraudDbResult<String> {
        let needs_balance = report.tags.contains(&ReportTag::Default);
        let has_balance = report
            .default_balance
            .as_deref()
            .is_some_and(|b| !b.trim().is_empty());
        if needs_balance && !has_balance {
            return Err(FraudDbError::MissingDefaultBalance);
        }

        let key = AccountKey::new(
            report.routing_number.trim(),
            report.account_number_last4.trim(),
        );
        let company = if report.disclose_company {
            report.company_name.clone()
        } else {
            UNDISCLOSED.to_string()
        };

        let submission_id = Uuid::new_v4().to_string();
        let submission = Submission {
            submission_id: submission_id.clone(),
            submitted_by: report.submitted_by.clone(),
            submitted_date: Utc::now().to_rfc3339(),
            company_name: company.clone(),
            account_holder_name: report.account_holder_name.clone(),
            tags: report.tags.clone(),
            notes: report.notes.clone().filter(|n| !n.trim().is_empty()),
            default_balance: report.default_balance.clone(),
            is_associated: false,
            associated_with: None,
        };
        let mut record = self.load_or_new(&key)?;
        record.submissions.push(submission);
        self.store.put_account(&record)?;

        for satellite_key in &report.associated_accounts {
            if *satellite_key == key {
                continue;
            }
            let link = Submission {
                submission_id: Uuid::new_v4().to_string(),
                submitted_by: report.submitted_by.clone(),
                submitted_date: Utc::now().to_rfc3339(),
                company_name: company.clone(),
                account_holder_name: report.account_holder_name.clone(),
                tags: vec![ReportTag::AssociatedAccount],
                notes: self
                    .config
                    .note_templates
                    .get(&ReportTag::AssociatedAccount)
                    .cloned(),
                default_balance: None,
                is_associated: true,
                associated_with: Some(key.clone()),
            };
            let mut satellite = self.load_or_new(satellite_key)?;
            satellite.is_associated = true;
            satellite.associated_with = Some(key.clone());
            satellite.submissions.push(link);
            self.store.put_account(&satellite)?;
        }

        log::info!(
            "Report {submission_id} recorded for {key} with {} linked account(s)",
            report.associated_accounts.len()
        );
        Ok(submission_id)
    }

    // ── CSV batches ───────────────────────────────────────────────

    /// Normalize raw rows and queue them for admin review. With no
    /// explicit mapping, columns are auto-detected from the first
    /// row's headers.
    pub fn upload_batch(
        &self,
        company_name: &str,
        file_name: &str,
        mapping: Option<ColumnMapping>,
        raw_rows: &[HashMap<String, String>],
    ) -> FraudDbResult<PendingUpload> {
        let mapping = match mapping {
            Some(m) => m,
            None => {
                // Map iteration order is unspecified; sort so detection
                // is stable for a given header set. Callers that know
                // the original column order pass a mapping instead.
                let mut headers: Vec<String> = raw_rows
                    .first()
                    .map(|row| row.keys().cloned().collect())
                    .unwrap_or_default();
                headers.sort();
                ColumnMapping::detect(&headers)
            }
        };
        let rows = normalize::normalize_batch(&mapping, raw_rows)?;
        queue::submit(&self.store, company_name, file_name, rows)
    }

    pub fn approve_upload(
        &mut self,
        upload_id: &str,
        approved_by: &str,
    ) -> FraudDbResult<ImportSummary> {
        queue::approve(
            &self.store,
            &self.config,
            &mut self.rng,
            &self.resolver,
            upload_id,
            approved_by,
        )
    }

    pub fn reject_upload(&self, upload_id: &str) -> FraudDbResult<()> {
        queue::reject(&self.store, upload_id)
    }

    /// All uploads, every status, in submission order.
    pub fn uploads(&self) -> FraudDbResult<Vec<PendingUpload>> {
        self.store.list_uploads()
    }

    fn load_or_new(&self, key: &AccountKey) -> FraudDbResult<AccountRecord> {
        Ok(match self.store.get_account(key)? {
            Some(existing) => existing,
            None => AccountRecord::new(
                key,
                bank_directory::infer_bank_name(&self.config, &key.routing_number),
            ),
        })
    }
}
