//! Error types for the concurrent ledger
//!
//! This module defines every error a ledger operation can report. Errors are
//! returned synchronously to the caller as the `Err` side of a `Result`; they
//! never cross a thread boundary as a panic.
//!
//! # Error Categories
//!
//! - **Validation Errors**: invalid amounts, invalid holder names, self-transfers
//! - **Account Errors**: missing, closed or non-empty accounts, account limit
//! - **Balance Errors**: insufficient funds, arithmetic overflow
//! - **Execution Errors**: pool not running, abandoned work
//! - **Setup Errors**: configuration and I/O failures

use super::account::AccountNumber;
use super::transaction::TransactionId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger
///
/// Each variant carries enough context to explain the failure without
/// consulting any other state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is not positive or exceeds the configured per-operation ceiling
    ///
    /// No balance is mutated and no transaction record is appended.
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
        /// Operation that rejected it
        operation: String,
    },

    /// Withdrawal or transfer would drive the balance negative
    ///
    /// The attempt is recorded on the source account as an
    /// INSUFFICIENT_FUNDS record carrying `transaction_id`.
    #[error(
        "Insufficient funds in account {account}: available {available}, requested {requested}"
    )]
    InsufficientFunds {
        /// Account that lacked funds
        account: AccountNumber,
        /// Balance at the time of the attempt
        available: Decimal,
        /// Requested amount
        requested: Decimal,
        /// Id of the recorded failed attempt
        transaction_id: TransactionId,
    },

    /// No account with this number is registered
    #[error("Account {account} not found")]
    AccountNotFound {
        /// The number that was looked up
        account: AccountNumber,
    },

    /// Close attempted on an account whose balance is not exactly zero
    #[error("Account {account} cannot be closed with balance {balance}")]
    AccountNotEmpty {
        /// Account that was not closed
        account: AccountNumber,
        /// Its balance at the time of the attempt
        balance: Decimal,
    },

    /// Create attempted while the registry is at capacity
    #[error("Account limit of {limit} reached")]
    AccountLimitReached {
        /// Configured maximum number of accounts
        limit: usize,
    },

    /// Holder name is empty or too long
    #[error("Invalid account holder name '{name}'")]
    InvalidHolderName {
        /// The rejected name
        name: String,
    },

    /// Operation attempted on a handle to an account that has been closed
    #[error("Account {account} is closed")]
    AccountClosed {
        /// The closed account
        account: AccountNumber,
    },

    /// Transfer whose source and destination are the same account
    #[error("Cannot transfer from account {account} to itself")]
    SameAccountTransfer {
        /// The account named on both sides
        account: AccountNumber,
    },

    /// Checked arithmetic failed while applying an operation
    ///
    /// The account is left unchanged.
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account being mutated
        account: AccountNumber,
    },

    /// Work was submitted while the worker pool is not running
    #[error("Worker pool is not running")]
    PoolNotRunning,

    /// Queued work was dropped because the pool was stopped before running it
    #[error("Operation abandoned before execution")]
    OperationAbandoned,

    /// A thread executing operations panicked before finishing its share
    #[error("Execution thread panicked: {message}")]
    ExecutionPanicked {
        /// Panic payload, if it was a string
        message: String,
    },

    /// Configuration values are out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration
        message: String,
    },

    /// I/O error while writing output
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, operation: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(
        account: &AccountNumber,
        available: Decimal,
        requested: Decimal,
        transaction_id: TransactionId,
    ) -> Self {
        LedgerError::InsufficientFunds {
            account: account.clone(),
            available,
            requested,
            transaction_id,
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: &AccountNumber) -> Self {
        LedgerError::AccountNotFound {
            account: account.clone(),
        }
    }

    /// Create an AccountNotEmpty error
    pub fn account_not_empty(account: &AccountNumber, balance: Decimal) -> Self {
        LedgerError::AccountNotEmpty {
            account: account.clone(),
            balance,
        }
    }

    /// Create an AccountClosed error
    pub fn account_closed(account: &AccountNumber) -> Self {
        LedgerError::AccountClosed {
            account: account.clone(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &AccountNumber) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.clone(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        LedgerError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Id of the transaction record appended for this failure, if any
    ///
    /// Only insufficient-funds failures leave a record behind.
    pub fn recorded_transaction(&self) -> Option<TransactionId> {
        match self {
            LedgerError::InsufficientFunds { transaction_id, .. } => Some(*transaction_id),
            _ => None,
        }
    }
}
