//! Concurrent Ledger Library
//! # Overview
//!
//! This library provides an in-memory, thread-safe ledger: accounts with
//! per-account locking, a deadlock-free transfer protocol, a registry guarding
//! the account map, and a worker pool fed by a bounded work queue.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (AccountNumber, TransactionRecord, LedgerError, etc.)
//! - [`core`] - Components that own balances:
//!   - [`core::account`] - Account with its own exclusion lock
//!   - [`core::transfer`] - Ordered two-lock transfer protocol
//!   - [`core::registry`] - Account map, operation counters and audit hook
//! - [`dispatch`] - Work queue, worker pool and the dispatcher built on them
//! - [`audit`] - Audit events and built-in sinks
//! - [`config`] - Ledger configuration
//! - [`strategy`] - Direct and pooled execution strategies
//! - [`io`] - CSV output
//! - [`cli`] - CLI arguments parsing
//!
//! # Locking
//!
//! - The registry's coarse lock guards only the map structure.
//! - Each account's lock guards its balance and history together.
//! - Transfers take both account locks in account-number order.
//!
//! No lock is ever held while waiting on another, except for the two ordered
//! account locks of a transfer and the registry-then-account order used when
//! closing an account.
//!
//! # Example
//!
//! ```
//! use concurrent_ledger::{LedgerConfig, LedgerRegistry};
//! use rust_decimal::Decimal;
//!
//! let registry = LedgerRegistry::new(LedgerConfig::default());
//! let alice = registry.create_account("Alice", Decimal::from(100)).unwrap();
//! let bob = registry.create_account("Bob", Decimal::ZERO).unwrap();
//!
//! registry.transfer(&alice, &bob, Decimal::from(40), "lunch").unwrap();
//! assert_eq!(registry.balance(&bob).unwrap(), Decimal::from(40));
//! ```

// Module declarations
pub mod audit;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use audit::{AuditEvent, MemoryAuditSink, TracingAuditSink};
pub use config::LedgerConfig;
pub use crate::core::{Account, AuditSink, LedgerRegistry, LedgerStatistics};
pub use dispatch::{LedgerDispatcher, OperationHandle, PoolLifecycle, WorkQueue, WorkerPool};
pub use io::{write_accounts_csv, write_history_csv};
pub use types::{
    AccountNumber, AccountSummary, LedgerError, LedgerOperation, Receipt, TransactionId,
    TransactionRecord, TransactionStatus, TransactionType,
};
