//! Account-related value types
//!
//! This module defines the account identity used for lock ordering and the
//! read-only summary handed out to callers. The live, lockable account lives
//! in [`crate::core::account`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Account identifier
///
/// Formatted as `ACC` followed by an 8-digit, zero-padded sequence number.
/// Sequences past eight digits widen the number rather than wrap.
///
/// Numbers order by length first, then lexicographically, so numbers built by
/// [`AccountNumber::from_sequence`] follow numeric order at any width. This
/// ordering is the total order used to acquire two account locks during a
/// transfer, so it must never depend on where an account lives in memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Build the account number for a registry sequence value
    pub fn from_sequence(sequence: u64) -> Self {
        AccountNumber(format!("ACC{:08}", sequence))
    }

    /// The account number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for AccountNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for AccountNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountNumber {
    fn from(value: &str) -> Self {
        AccountNumber(value.to_string())
    }
}

impl From<String> for AccountNumber {
    fn from(value: String) -> Self {
        AccountNumber(value)
    }
}

/// Point-in-time view of an account
///
/// Taken under a single acquisition of the account's lock, so balance and
/// transaction count are mutually consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    /// Account identifier
    pub number: AccountNumber,

    /// Name of the account holder
    pub holder: String,

    /// Balance at the time of the snapshot
    pub balance: Decimal,

    /// Number of transaction records in the history
    pub transaction_count: usize,

    /// When the account was opened
    pub created_at: DateTime<Utc>,

    /// False once the account has been closed
    pub active: bool,
}
