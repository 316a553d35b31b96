//! Types module
//!
//! Contains core data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `account`: Account identity and summary types
//! - `transaction`: Transaction ids, records and operation requests
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{AccountNumber, AccountSummary};
pub use error::LedgerError;
pub use transaction::{
    LedgerOperation, Receipt, TransactionId, TransactionRecord, TransactionStatus,
    TransactionType,
};
