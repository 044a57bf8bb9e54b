//! Submission normalization — canonical business records from raw
//! spreadsheet rows.
//!
//! Uploaded CSVs arrive with arbitrary column names and casings. A
//! ColumnMapping (auto-detected from headers or supplied by the user)
//! picks the columns; normalize_row turns one raw row into a
//! NormalizedRow. Malformed rows are dropped, never fatal to the batch.

use crate::error::{FraudDbError, FraudDbResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accepted truthy spellings, checked case-insensitively after trimming.
const TRUE_VALUES: [&str; 5] = ["true", "yes", "1", "t", "y"];

/// The one boolean-parsing rule for every ingestion path. Anything not
/// in the truthy set, including the empty string, is false.
pub fn is_true_value(raw: &str) -> bool {
    let v = raw.trim().to_lowercase();
    TRUE_VALUES.contains(&v.as_str())
}

/// A canonical business record, one per usable CSV row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub business_name: String,
    pub owner_name: String,
    pub bank_name: String,
    pub bank_account_name: String,
    pub bank_account_routing: String,
    pub bank_account_number: String,
    pub bank_account_type: String,
    pub is_main_account: bool,
    pub is_default_account: bool,
}

/// Which raw column feeds which canonical field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub business_name: Option<String>,
    pub owner_name: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
    pub routing: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub is_main: Option<String>,
    pub is_default: Option<String>,
}

impl ColumnMapping {
    /// Best-effort header detection by substring match, case-insensitive.
    /// The first header matching a field wins; later headers never
    /// overwrite an earlier match.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut mapping = Self::default();
        for header in headers {
            let h = header.as_ref().trim().to_lowercase();
            let slot = if h.contains("routing") {
                &mut mapping.routing
            } else if h.contains("business") || h.contains("company") {
                &mut mapping.business_name
            } else if h.contains("owner") {
                &mut mapping.owner_name
            } else if h.contains("bank") && h.contains("name") && !h.contains("account") {
                &mut mapping.bank_name
            } else if h.contains("holder") || (h.contains("account") && h.contains("name")) {
                &mut mapping.account_holder
            } else if h.contains("type") {
                &mut mapping.account_type
            } else if h.contains("main") {
                &mut mapping.is_main
            } else if h.contains("default") {
                &mut mapping.is_default
            } else if h.contains("account") || h.contains("last4") {
                &mut mapping.account_number
            } else if h.contains("name") {
                &mut mapping.account_holder
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(header.as_ref().to_string());
            }
        }
        mapping
    }

    /// A mapping is usable once a routing-like and an account-like
    /// column are both resolved.
    pub fn is_usable(&self) -> bool {
        self.routing.is_some() && self.account_number.is_some()
    }

    pub fn require_usable(&self) -> FraudDbResult<()> {
        if self.routing.is_none() {
            return Err(FraudDbError::MissingColumn { field: "routing" });
        }
        if self.account_number.is_none() {
            return Err(FraudDbError::MissingColumn {
                field: "account_number",
            });
        }
        Ok(())
    }
}

fn value(row: &HashMap<String, String>, column: &Option<String>) -> String {
    column
        .as_deref()
        .and_then(|c| row.get(c))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Normalize one raw row. Returns None for blank or unmappable rows.
pub fn normalize_row(
    mapping: &ColumnMapping,
    row: &HashMap<String, String>,
) -> Option<NormalizedRow> {
    if row.values().all(|v| v.trim().is_empty()) {
        return None;
    }
    let normalized = NormalizedRow {
        business_name: value(row, &mapping.business_name),
        owner_name: value(row, &mapping.owner_name),
        bank_name: value(row, &mapping.bank_name),
        bank_account_name: value(row, &mapping.account_holder),
        bank_account_routing: value(row, &mapping.routing),
        bank_account_number: value(row, &mapping.account_number),
        bank_account_type: value(row, &mapping.account_type),
        is_main_account: is_true_value(&value(row, &mapping.is_main)),
        is_default_account: is_true_value(&value(row, &mapping.is_default)),
    };
    // A row with no account coordinates and no business context cannot
    // feed the resolver in any way.
    if normalized.bank_account_routing.is_empty()
        && normalized.bank_account_number.is_empty()
        && normalized.business_name.is_empty()
    {
        return None;
    }
    Some(normalized)
}

/// Normalize a whole batch, dropping malformed rows. Errors only when
/// the mapping is unusable or no valid rows remain.
pub fn normalize_batch(
    mapping: &ColumnMapping,
    rows: &[HashMap<String, String>],
) -> FraudDbResult<Vec<NormalizedRow>> {
    mapping.require_usable()?;
    let mut out = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match normalize_row(mapping, row) {
            Some(normalized) => out.push(normalized),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("Dropped {dropped} malformed row(s) during normalization");
    }
    if out.is_empty() {
        return Err(FraudDbError::EmptyBatch);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_spellings() {
        for raw in ["true", "TRUE", "True", "yes", "YES", "1", "t", "y", " y "] {
            assert!(is_true_value(raw), "{raw:?} should parse as true");
        }
        for raw in ["", "no", "false", "0", "n", "maybe", "2"] {
            assert!(!is_true_value(raw), "{raw:?} should parse as false");
        }
    }

    #[test]
    fn detects_common_headers() {
        let headers = [
            "Business Name",
            "Owner Name",
            "Bank Name",
            "Bank Account Name",
            "Routing Number",
            "Account Number",
            "Account Type",
            "Main Account",
            "Default Account",
        ];
        let mapping = ColumnMapping::detect(&headers);
        assert_eq!(mapping.business_name.as_deref(), Some("Business Name"));
        assert_eq!(mapping.owner_name.as_deref(), Some("Owner Name"));
        assert_eq!(mapping.bank_name.as_deref(), Some("Bank Name"));
        assert_eq!(mapping.account_holder.as_deref(), Some("Bank Account Name"));
        assert_eq!(mapping.routing.as_deref(), Some("Routing Number"));
        assert_eq!(mapping.account_number.as_deref(), Some("Account Number"));
        assert_eq!(mapping.account_type.as_deref(), Some("Account Type"));
        assert_eq!(mapping.is_main.as_deref(), Some("Main Account"));
        assert_eq!(mapping.is_default.as_deref(), Some("Default Account"));
        assert!(mapping.is_usable());
    }

    #[test]
    fn mapping_without_routing_is_unusable() {
        let mapping = ColumnMapping::detect(&["Business Name", "Account Number"]);
        assert!(!mapping.is_usable());
        assert!(matches!(
            mapping.require_usable(),
            Err(FraudDbError::MissingColumn { field: "routing" })
        ));
    }
}
