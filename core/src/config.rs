//! Desk configuration: bank directory, tag-inference rules, and note
//! templates for the CSV import pipeline.

use crate::record::ReportTag;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One tag-inference rule: the first rule whose needle appears in the
/// business name (case-insensitive) decides the tag. Rule order matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRule {
    pub needles: Vec<String>,
    pub tag: ReportTag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Routing number → institution name.
    pub known_banks: HashMap<String, String>,
    /// Display names for routing numbers the directory does not know.
    pub fallback_bank_names: Vec<String>,
    pub tag_rules: Vec<TagRule>,
    /// Note template per tag; `{business}` is replaced with the
    /// business name at render time.
    pub note_templates: HashMap<ReportTag, String>,
    /// Bounds for synthesized default balances on the seed-data path.
    pub seed_balance_min: u64,
    pub seed_balance_max: u64,
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/desk_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let known_banks = [
            ("021000021".into(), "JPMorgan Chase".into()),
            ("026009593".into(), "Bank of America".into()),
            ("111000025".into(), "Bank of America".into()),
            ("121000248".into(), "Wells Fargo".into()),
            ("061000104".into(), "Truist Bank".into()),
        ]
        .into();

        let fallback_bank_names = vec![
            "First National Bank".into(),
            "Community Trust Bank".into(),
            "Pacific Union Bank".into(),
            "Heritage State Bank".into(),
            "Lakeside Savings Bank".into(),
            "Pioneer Valley Bank".into(),
            "Summit Ridge Bank".into(),
            "Cornerstone Federal".into(),
        ];

        let tag_rules = vec![
            TagRule {
                needles: vec!["transport".into(), "logistics".into(), "trucking".into()],
                tag: ReportTag::Stacking,
            },
            TagRule {
                needles: vec!["care".into(), "health".into()],
                tag: ReportTag::FakeDeposits,
            },
            TagRule {
                needles: vec!["construction".into(), "remodel".into(), "contractor".into()],
                tag: ReportTag::Default,
            },
            TagRule {
                needles: vec!["digital".into(), "tech".into()],
                tag: ReportTag::BankDisconnected,
            },
            TagRule {
                needles: vec!["management".into(), "holding".into(), "enterprise".into()],
                tag: ReportTag::ExcessiveNsfs,
            },
            TagRule {
                needles: vec!["auto".into(), "car".into()],
                tag: ReportTag::BlockedPayments,
            },
        ];

        let note_templates = [
            (
                ReportTag::Fraud,
                "Confirmed fraudulent activity reported for {business}.".into(),
            ),
            (
                ReportTag::Default,
                "{business} defaulted on an outstanding balance.".into(),
            ),
            (
                ReportTag::Stacking,
                "Multiple concurrent funding advances detected for {business}.".into(),
            ),
            (
                ReportTag::FakeDeposits,
                "Artificial deposit inflation observed on statements for {business}.".into(),
            ),
            (
                ReportTag::BankDisconnected,
                "Bank feed disconnected shortly after funding for {business}.".into(),
            ),
            (
                ReportTag::BlockedPayments,
                "Payments blocked shortly after origination for {business}.".into(),
            ),
            (
                ReportTag::ExcessiveNsfs,
                "Excessive NSF activity across recent statements for {business}.".into(),
            ),
            (
                ReportTag::AssociatedAccount,
                "Account associated with a flagged default account.".into(),
            ),
        ]
        .into();

        Self {
            known_banks,
            fallback_bank_names,
            tag_rules,
            note_templates,
            seed_balance_min: 2_500,
            seed_balance_max: 45_000,
        }
    }
}
