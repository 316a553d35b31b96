//! Account registry
//!
//! This module provides `LedgerRegistry`, which owns the mapping from account
//! number to account and routes every balance-affecting operation.
//!
//! # Design
//!
//! Two levels of locking are used:
//! - A coarse `parking_lot::Mutex` guards the map structure. It is held only
//!   for lookups, inserts and removals, never across a balance mutation.
//! - Each [`Account`] guards its own balance and history.
//!
//! Operation wrappers clone the `Arc<Account>` handles they need under the
//! coarse lock, release it, and only then run the account-level operation, so
//! unrelated accounts proceed in parallel. Closing an account is the one path
//! that takes an account lock while the coarse lock is held; no path ever
//! takes the coarse lock while holding an account lock.
//!
//! Aggregate counters are lock-free atomics updated after each operation.

use super::account::Account;
use super::traits::AuditSink;
use crate::audit::{AuditEvent, TracingAuditSink};
use crate::config::LedgerConfig;
use crate::types::{
    AccountNumber, AccountSummary, LedgerError, LedgerOperation, Receipt, TransactionRecord,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Longest accepted holder name, in characters
pub const MAX_HOLDER_NAME_LEN: usize = 100;

/// Snapshot of the registry's aggregate counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerStatistics {
    pub accounts: usize,
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
}

impl LedgerStatistics {
    /// Fraction of operations that committed, 0.0 when nothing has run
    pub fn success_rate(&self) -> f64 {
        if self.total_operations == 0 {
            return 0.0;
        }
        self.successful_operations as f64 / self.total_operations as f64
    }
}

#[derive(Debug, Default)]
struct OperationCounters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
}

/// Registry of accounts with a coarse map lock
pub struct LedgerRegistry {
    config: LedgerConfig,
    accounts: Mutex<BTreeMap<AccountNumber, Arc<Account>>>,
    next_account: AtomicU64,
    counters: OperationCounters,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for LedgerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerRegistry")
            .field("config", &self.config)
            .field("accounts", &self.accounts.lock().len())
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl LedgerRegistry {
    /// Create a registry that audits through `tracing`
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_audit_sink(config, Arc::new(TracingAuditSink))
    }

    /// Create a registry reporting operations to `audit`
    pub fn with_audit_sink(config: LedgerConfig, audit: Arc<dyn AuditSink>) -> Self {
        LedgerRegistry {
            config,
            accounts: Mutex::new(BTreeMap::new()),
            next_account: AtomicU64::new(1),
            counters: OperationCounters::default(),
            audit,
        }
    }

    /// Configuration the registry was built with
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open a new account
    ///
    /// The holder name is trimmed before validation and storage.
    ///
    /// # Arguments
    ///
    /// * `holder` - Name of the account holder (1 to 100 characters after trimming)
    /// * `initial_balance` - Opening balance, between zero and the configured
    ///   `max_initial_balance` inclusive
    ///
    /// # Returns
    ///
    /// The number of the new account, unique for the registry's lifetime
    ///
    /// # Errors
    ///
    /// - `InvalidHolderName` if the name is empty or too long
    /// - `InvalidAmount` if the initial balance is out of bounds
    /// - `AccountLimitReached` if the registry already holds `max_accounts`
    pub fn create_account(
        &self,
        holder: &str,
        initial_balance: Decimal,
    ) -> Result<AccountNumber, LedgerError> {
        let holder = holder.trim();
        if holder.is_empty() || holder.chars().count() > MAX_HOLDER_NAME_LEN {
            return Err(LedgerError::InvalidHolderName {
                name: holder.to_string(),
            });
        }

        if initial_balance < Decimal::ZERO || initial_balance > self.config.max_initial_balance {
            return Err(LedgerError::invalid_amount(initial_balance, "create account"));
        }

        let mut accounts = self.accounts.lock();
        if accounts.len() >= self.config.max_accounts {
            return Err(LedgerError::AccountLimitReached {
                limit: self.config.max_accounts,
            });
        }

        let number =
            AccountNumber::from_sequence(self.next_account.fetch_add(1, Ordering::Relaxed));
        let account = Account::open(number.clone(), holder, initial_balance)?;
        accounts.insert(number.clone(), Arc::new(account));
        drop(accounts);

        info!(account = %number, holder, balance = %initial_balance, "Account created");
        Ok(number)
    }

    /// Close an account whose balance is exactly zero
    ///
    /// The account is removed from the map and marked closed. Handles held
    /// elsewhere stay readable, but every further mutation through them fails
    /// with `AccountClosed`.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if no such account is registered
    /// - `AccountNotEmpty` if the balance is not zero
    pub fn close_account(&self, number: &AccountNumber) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.lock();
        let account = accounts
            .get(number)
            .ok_or_else(|| LedgerError::account_not_found(number))?;

        account.close_if_empty()?;
        accounts.remove(number);
        drop(accounts);

        info!(account = %number, "Account closed");
        Ok(())
    }

    /// Handle to a registered account
    pub fn get_account(&self, number: &AccountNumber) -> Option<Arc<Account>> {
        self.accounts.lock().get(number).cloned()
    }

    /// Summaries of every registered account, ordered by number
    ///
    /// Handles are collected under the coarse lock; each summary is taken
    /// after it has been released.
    pub fn list_accounts(&self) -> Vec<AccountSummary> {
        self.handles().iter().map(|account| account.snapshot()).collect()
    }

    /// Credit `amount` to `account`
    pub fn deposit(
        &self,
        account: &AccountNumber,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(&LedgerOperation::deposit(account.clone(), amount, description))
    }

    /// Debit `amount` from `account`
    pub fn withdraw(
        &self,
        account: &AccountNumber,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(&LedgerOperation::withdraw(account.clone(), amount, description))
    }

    /// Move `amount` from `from` to `to`
    pub fn transfer(
        &self,
        from: &AccountNumber,
        to: &AccountNumber,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(&LedgerOperation::transfer(
            from.clone(),
            to.clone(),
            amount,
            description,
        ))
    }

    /// Run a single operation
    ///
    /// Every registry mutation of a balance goes through here: the operation
    /// runs, the counters are updated and the audit hook (if enabled) fires
    /// exactly once, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not positive or above the ceiling
    /// - `AccountNotFound` if a named account is not registered
    /// - Any error raised by the account or transfer protocol
    pub fn execute(&self, operation: &LedgerOperation) -> Result<Receipt, LedgerError> {
        let outcome = self.apply(operation);

        self.counters.total.fetch_add(1, Ordering::Relaxed);
        match &outcome {
            Ok(_) => self.counters.successful.fetch_add(1, Ordering::Relaxed),
            Err(error) => {
                debug!(operation = %operation, error = %error, "Ledger operation failed");
                self.counters.failed.fetch_add(1, Ordering::Relaxed)
            }
        };

        if self.config.audit_enabled {
            self.audit.record(&AuditEvent::from_outcome(operation, &outcome));
        }

        outcome
    }

    fn apply(&self, operation: &LedgerOperation) -> Result<Receipt, LedgerError> {
        let amount = operation.amount();
        if amount > self.config.max_operation_amount {
            return Err(LedgerError::invalid_amount(
                amount,
                operation.tx_type().as_str(),
            ));
        }

        match operation {
            LedgerOperation::Deposit {
                account,
                amount,
                description,
            } => self.lookup(account)?.deposit(*amount, description),
            LedgerOperation::Withdraw {
                account,
                amount,
                description,
            } => self.lookup(account)?.withdraw(*amount, description),
            LedgerOperation::Transfer {
                from,
                to,
                amount,
                description,
            } => {
                let (source, destination) = {
                    let accounts = self.accounts.lock();
                    let source = Self::lookup_in(&accounts, from)?;
                    let destination = Self::lookup_in(&accounts, to)?;
                    (source, destination)
                };
                source.transfer_out(&destination, *amount, description)
            }
        }
    }

    fn lookup(&self, number: &AccountNumber) -> Result<Arc<Account>, LedgerError> {
        Self::lookup_in(&self.accounts.lock(), number)
    }

    fn lookup_in(
        accounts: &BTreeMap<AccountNumber, Arc<Account>>,
        number: &AccountNumber,
    ) -> Result<Arc<Account>, LedgerError> {
        accounts
            .get(number)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    fn handles(&self) -> Vec<Arc<Account>> {
        self.accounts.lock().values().cloned().collect()
    }

    /// Current balance of `number`
    pub fn balance(&self, number: &AccountNumber) -> Result<Decimal, LedgerError> {
        Ok(self.lookup(number)?.balance())
    }

    /// Copy of the history of `number`, oldest first
    pub fn history(&self, number: &AccountNumber) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.lookup(number)?.history())
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.accounts.lock().len()
    }

    /// Number of registered accounts still accepting operations
    pub fn active_account_count(&self) -> usize {
        self.handles().iter().filter(|a| a.is_active()).count()
    }

    /// Sum of every registered balance
    ///
    /// Balances are read one account at a time, so the sum is only exact
    /// when no transfer is in flight.
    pub fn total_balance(&self) -> Decimal {
        self.handles().iter().map(|a| a.balance()).sum()
    }

    /// Aggregate counters
    pub fn statistics(&self) -> LedgerStatistics {
        LedgerStatistics {
            accounts: self.account_count(),
            total_operations: self.counters.total.load(Ordering::Relaxed),
            successful_operations: self.counters.successful.load(Ordering::Relaxed),
            failed_operations: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}
