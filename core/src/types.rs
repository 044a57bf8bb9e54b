//! Shared primitive types used across the fraud database.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between routing number and last-4 in storage keys.
pub const KEY_SEPARATOR: char = '|';

/// Identifies one bank account: routing number plus the last four
/// digits of the account number. Routing numbers are expected to be
/// nine digits but are not strictly validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub routing_number: String,
    pub account_number_last4: String,
}

impl AccountKey {
    pub fn new(routing_number: impl Into<String>, last4: impl Into<String>) -> Self {
        Self {
            routing_number: routing_number.into(),
            account_number_last4: last4.into(),
        }
    }

    /// The store lookup key: `routing|last4`.
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}{}",
            self.routing_number, KEY_SEPARATOR, self.account_number_last4
        )
    }

    pub fn parse(key: &str) -> Option<Self> {
        let (routing, last4) = key.split_once(KEY_SEPARATOR)?;
        Some(Self::new(routing, last4))
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.routing_number, KEY_SEPARATOR, self.account_number_last4
        )
    }
}
