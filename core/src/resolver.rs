//! Association resolution — the business rules of the CSV import
//! pipeline.
//!
//! Rows in an approved batch are grouped by (business, owner). Rows
//! flagged is_default_account are anchors and become fraud reports;
//! the remaining rows are satellites linked to the first anchor's
//! account. A group with no usable anchor imports its satellites as
//! standalone records with no link.

use crate::{
    bank_directory,
    config::DeskConfig,
    error::FraudDbResult,
    normalize::NormalizedRow,
    record::{AccountRecord, ReportTag, Submission},
    rng::ImportRng,
    store::Store,
    types::AccountKey,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Spreadsheet placeholder meaning "no routing number".
const ROUTING_PLACEHOLDER: &str = "-";

/// Bounds for the synthetic check-count bump credited to a
/// pre-existing account touched by a batch.
const TOUCH_BUMP_MIN: u64 = 1;
const TOUCH_BUMP_MAX: u64 = 3;

/// Decides which rows describe the same business/owner.
pub trait GroupingStrategy: Send {
    fn group_key(&self, row: &NormalizedRow) -> String;
}

/// Exact string match on (business, owner). Typos and case differences
/// split groups; deployments that need stronger entity resolution swap
/// in another strategy via [`AssociationResolver::with_strategy`].
pub struct ExactMatch;

impl GroupingStrategy for ExactMatch {
    fn group_key(&self, row: &NormalizedRow) -> String {
        format!("{}::{}", row.business_name, row.owner_name)
    }
}

/// Outcome counts for one applied batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    /// Anchors and standalone satellites written to the store.
    pub imported: usize,
    /// Satellites linked to an anchor.
    pub associated: usize,
    /// Rows without a usable routing number.
    pub skipped: usize,
}

pub struct AssociationResolver {
    grouping: Box<dyn GroupingStrategy>,
}

impl Default for AssociationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationResolver {
    pub fn new() -> Self {
        Self {
            grouping: Box::new(ExactMatch),
        }
    }

    pub fn with_strategy(grouping: Box<dyn GroupingStrategy>) -> Self {
        Self { grouping }
    }

    /// Apply one approved batch to the account store.
    pub fn apply_batch(
        &self,
        store: &Store,
        config: &DeskConfig,
        rng: &mut ImportRng,
        company_name: &str,
        submitted_by: &str,
        rows: &[NormalizedRow],
    ) -> FraudDbResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        // Group rows preserving first-seen order so RNG draws replay
        // identically for the same batch.
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&NormalizedRow>> = HashMap::new();
        for row in rows {
            let key = self.grouping.group_key(row);
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(row);
        }

        for group_key in &order {
            let group = &groups[group_key];
            let (anchors, satellites): (Vec<&NormalizedRow>, Vec<&NormalizedRow>) =
                group.iter().copied().partition(|r| r.is_default_account);

            let mut first_anchor_key: Option<AccountKey> = None;
            for anchor in &anchors {
                let Some(key) = usable_key(anchor) else {
                    summary.skipped += 1;
                    continue;
                };
                let tag = infer_tag(config, &anchor.business_name, rng);
                let submission = Submission {
                    submission_id: Uuid::new_v4().to_string(),
                    submitted_by: submitted_by.to_string(),
                    submitted_date: Utc::now().to_rfc3339(),
                    company_name: company_name.to_string(),
                    account_holder_name: holder_name(anchor),
                    tags: vec![tag],
                    notes: Some(render_note(config, tag, &anchor.business_name)),
                    default_balance: (tag == ReportTag::Default).then(|| {
                        rng.in_range(config.seed_balance_min, config.seed_balance_max)
                            .to_string()
                    }),
                    is_associated: false,
                    associated_with: None,
                };
                upsert_submission(
                    store,
                    rng,
                    &key,
                    row_bank_name(config, anchor, &key),
                    submission,
                    Satellite::No,
                )?;
                if first_anchor_key.is_none() {
                    first_anchor_key = Some(key);
                }
                summary.imported += 1;
            }

            for satellite in &satellites {
                let Some(key) = usable_key(satellite) else {
                    summary.skipped += 1;
                    continue;
                };
                let link = first_anchor_key.clone();
                let submission = Submission {
                    submission_id: Uuid::new_v4().to_string(),
                    submitted_by: submitted_by.to_string(),
                    submitted_date: Utc::now().to_rfc3339(),
                    company_name: company_name.to_string(),
                    account_holder_name: holder_name(satellite),
                    tags: vec![ReportTag::AssociatedAccount],
                    notes: Some(render_note(
                        config,
                        ReportTag::AssociatedAccount,
                        &satellite.business_name,
                    )),
                    default_balance: None,
                    is_associated: true,
                    associated_with: link.clone(),
                };
                upsert_submission(
                    store,
                    rng,
                    &key,
                    row_bank_name(config, satellite, &key),
                    submission,
                    Satellite::Yes { link: link.clone() },
                )?;
                if link.is_some() {
                    summary.associated += 1;
                } else {
                    summary.imported += 1;
                }
            }
        }

        log::info!(
            "Batch from '{company_name}': {} imported, {} associated, {} skipped",
            summary.imported,
            summary.associated,
            summary.skipped
        );
        Ok(summary)
    }
}

/// Whether the row being written is a satellite, and if so which
/// anchor (if any) it links to. Standalone satellites keep the
/// associated marking without a link.
enum Satellite {
    No,
    Yes { link: Option<AccountKey> },
}

/// Append a submission to the key's record, creating it if absent.
/// Pre-existing records get the synthetic check-count bump.
fn upsert_submission(
    store: &Store,
    rng: &mut ImportRng,
    key: &AccountKey,
    bank_name: String,
    submission: Submission,
    satellite: Satellite,
) -> FraudDbResult<()> {
    let mut record = match store.get_account(key)? {
        Some(mut existing) => {
            existing.times_checked += rng.in_range(TOUCH_BUMP_MIN, TOUCH_BUMP_MAX) as i64;
            existing
        }
        None => AccountRecord::new(key, bank_name),
    };
    if let Satellite::Yes { link } = satellite {
        record.is_associated = true;
        if link.is_some() {
            record.associated_with = link;
        }
    }
    record.submissions.push(submission);
    store.put_account(&record)?;
    Ok(())
}

/// Rows need a real routing number; "-" means none. Last-4 falls back
/// to "0000" when the account number is missing or shorter than four
/// characters.
fn usable_key(row: &NormalizedRow) -> Option<AccountKey> {
    let routing = row.bank_account_routing.trim();
    if routing.is_empty() || routing == ROUTING_PLACEHOLDER {
        return None;
    }
    Some(AccountKey::new(routing, derive_last4(&row.bank_account_number)))
}

fn derive_last4(account_number: &str) -> String {
    let chars: Vec<char> = account_number.trim().chars().collect();
    if chars.len() >= 4 {
        chars[chars.len() - 4..].iter().collect()
    } else {
        "0000".to_string()
    }
}

fn row_bank_name(config: &DeskConfig, row: &NormalizedRow, key: &AccountKey) -> String {
    if row.bank_name.is_empty() {
        bank_directory::infer_bank_name(config, &key.routing_number)
    } else {
        row.bank_name.clone()
    }
}

fn holder_name(row: &NormalizedRow) -> String {
    if row.bank_account_name.is_empty() {
        row.owner_name.clone()
    } else {
        row.bank_account_name.clone()
    }
}

fn infer_tag(config: &DeskConfig, business_name: &str, rng: &mut ImportRng) -> ReportTag {
    let name = business_name.to_lowercase();
    for rule in &config.tag_rules {
        if rule.needles.iter().any(|needle| name.contains(needle.as_str())) {
            return rule.tag;
        }
    }
    // No rule matched: seeded coin flip between the two commonest tags.
    if rng.chance(0.5) {
        ReportTag::Stacking
    } else {
        ReportTag::Default
    }
}

fn render_note(config: &DeskConfig, tag: ReportTag, business_name: &str) -> String {
    match config.note_templates.get(&tag) {
        Some(template) => template.replace("{business}", business_name),
        None => format!("Reported with tag {tag}"),
    }
}
