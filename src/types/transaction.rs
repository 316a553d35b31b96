//! Transaction-related types for the concurrent ledger
//!
//! This module defines transaction identifiers, the immutable history
//! records appended to accounts, and the operation requests routed through
//! the registry.

use super::account::AccountNumber;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of transaction ids
static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction identifier
///
/// Unique across the process lifetime. Ids are handed out by an atomic
/// counter, so they increase monotonically but say nothing about the order in
/// which the corresponding records were committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Wrap a raw id value
    pub fn new(value: u64) -> Self {
        TransactionId(value)
    }

    /// Generate the next process-wide unique id
    pub fn next() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TXN{:010}", self.0)
    }
}

/// Balance-affecting operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Credit funds to a single account
    Deposit,

    /// Debit funds from a single account
    Withdraw,

    /// Move funds from one account to another
    Transfer,
}

impl TransactionType {
    /// Upper-case label used in logs and CSV output
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a recorded transaction
///
/// There is no pending state: a record is only constructed once its outcome
/// is known, so readers never observe an undecided record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Operation committed
    Success,

    /// Operation rejected for a reason other than funds
    Failed,

    /// Operation rejected because the source balance was too low
    InsufficientFunds,
}

impl TransactionStatus {
    /// Upper-case label used in logs and CSV output
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::InsufficientFunds => "INSUFFICIENT_FUNDS",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable entry in an account's history
///
/// A transfer produces one record on each side carrying the same id; both
/// records name the source in `from` and the destination in `to`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Transaction id (shared by both legs of a transfer)
    pub id: TransactionId,

    /// Operation kind
    pub tx_type: TransactionType,

    /// Debited account, absent for deposits
    pub from: Option<AccountNumber>,

    /// Credited account, absent for withdrawals
    pub to: Option<AccountNumber>,

    /// Amount moved (or attempted)
    pub amount: Decimal,

    /// Free-form caller description
    pub description: String,

    /// When the record was created
    pub timestamp: DateTime<Utc>,

    /// Outcome of the operation
    pub status: TransactionStatus,
}

impl TransactionRecord {
    /// Create a record with its final status
    pub fn new(
        id: TransactionId,
        tx_type: TransactionType,
        from: Option<AccountNumber>,
        to: Option<AccountNumber>,
        amount: Decimal,
        description: &str,
        status: TransactionStatus,
    ) -> Self {
        TransactionRecord {
            id,
            tx_type,
            from,
            to,
            amount,
            description: description.to_string(),
            timestamp: Utc::now(),
            status,
        }
    }

    /// Whether the record describes a committed operation
    pub fn is_successful(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// Ledger operation request
///
/// The unit of work routed through the registry, either directly or via the
/// dispatcher's work queue and worker pool.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOperation {
    /// Credit `amount` to `account`
    Deposit {
        account: AccountNumber,
        amount: Decimal,
        description: String,
    },

    /// Debit `amount` from `account`
    Withdraw {
        account: AccountNumber,
        amount: Decimal,
        description: String,
    },

    /// Move `amount` from `from` to `to`
    Transfer {
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
        description: String,
    },
}

impl LedgerOperation {
    /// Build a deposit request
    pub fn deposit(account: AccountNumber, amount: Decimal, description: &str) -> Self {
        LedgerOperation::Deposit {
            account,
            amount,
            description: description.to_string(),
        }
    }

    /// Build a withdrawal request
    pub fn withdraw(account: AccountNumber, amount: Decimal, description: &str) -> Self {
        LedgerOperation::Withdraw {
            account,
            amount,
            description: description.to_string(),
        }
    }

    /// Build a transfer request
    pub fn transfer(
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
        description: &str,
    ) -> Self {
        LedgerOperation::Transfer {
            from,
            to,
            amount,
            description: description.to_string(),
        }
    }

    /// Operation kind
    pub fn tx_type(&self) -> TransactionType {
        match self {
            LedgerOperation::Deposit { .. } => TransactionType::Deposit,
            LedgerOperation::Withdraw { .. } => TransactionType::Withdraw,
            LedgerOperation::Transfer { .. } => TransactionType::Transfer,
        }
    }

    /// Requested amount
    pub fn amount(&self) -> Decimal {
        match self {
            LedgerOperation::Deposit { amount, .. }
            | LedgerOperation::Withdraw { amount, .. }
            | LedgerOperation::Transfer { amount, .. } => *amount,
        }
    }

    /// Caller-supplied description
    pub fn description(&self) -> &str {
        match self {
            LedgerOperation::Deposit { description, .. }
            | LedgerOperation::Withdraw { description, .. }
            | LedgerOperation::Transfer { description, .. } => description,
        }
    }

    /// Debited account, if the operation has one
    pub fn source(&self) -> Option<&AccountNumber> {
        match self {
            LedgerOperation::Deposit { .. } => None,
            LedgerOperation::Withdraw { account, .. } => Some(account),
            LedgerOperation::Transfer { from, .. } => Some(from),
        }
    }

    /// Credited account, if the operation has one
    pub fn destination(&self) -> Option<&AccountNumber> {
        match self {
            LedgerOperation::Deposit { account, .. } => Some(account),
            LedgerOperation::Withdraw { .. } => None,
            LedgerOperation::Transfer { to, .. } => Some(to),
        }
    }
}

impl fmt::Display for LedgerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerOperation::Deposit {
                account, amount, ..
            } => write!(f, "deposit {} to {}", amount, account),
            LedgerOperation::Withdraw {
                account, amount, ..
            } => write!(f, "withdraw {} from {}", amount, account),
            LedgerOperation::Transfer {
                from, to, amount, ..
            } => write!(f, "transfer {} from {} to {}", amount, from, to),
        }
    }
}

/// Result of a committed operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Receipt {
    /// Id of the SUCCESS record(s) appended
    pub transaction_id: TransactionId,

    /// Balance after the operation (the source account's, for transfers)
    pub balance: Decimal,
}
