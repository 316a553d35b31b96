//! Core ledger module
//!
//! This module contains the components that own balances:
//! - `account` - A single account with its own exclusion lock
//! - `transfer` - Ordered two-lock protocol for moving funds
//! - `registry` - Account map with a coarse lock, counters and audit hook
//! - `traits` - Trait seams for pluggable collaborators

pub mod account;
pub mod registry;
pub mod traits;
pub mod transfer;

pub use account::Account;
pub use registry::{LedgerRegistry, LedgerStatistics, MAX_HOLDER_NAME_LEN};
pub use traits::AuditSink;
pub use transfer::transfer;
