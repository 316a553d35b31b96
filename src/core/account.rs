//! Lockable ledger account
//!
//! This module provides the `Account` struct, the only owner of a balance and
//! its append-only transaction history.
//!
//! # Thread Safety
//!
//! Balance and history sit together behind one private `parking_lot::Mutex`.
//! Every mutation changes the balance and appends the matching record inside
//! the same lock acquisition, so no reader can ever observe one without the
//! other. Getters take the same lock briefly and return owned copies; no
//! reference into live state escapes.
//!
//! Two-account transfers go through [`super::transfer`], which acquires both
//! account locks in account-number order.

use super::transfer;
use crate::types::{
    AccountNumber, AccountSummary, LedgerError, Receipt, TransactionId, TransactionRecord,
    TransactionStatus, TransactionType,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;

/// Mutable part of an account, guarded by the account lock
#[derive(Debug)]
pub(super) struct AccountState {
    pub(super) balance: Decimal,
    pub(super) history: Vec<TransactionRecord>,
    pub(super) closed: bool,
}

impl AccountState {
    pub(super) fn ensure_open(&self, number: &AccountNumber) -> Result<(), LedgerError> {
        if self.closed {
            return Err(LedgerError::account_closed(number));
        }
        Ok(())
    }
}

/// A balance-holding account with its own exclusion lock
///
/// Identity (number, holder, creation time) is immutable and readable without
/// locking. Accounts are shared as `Arc<Account>` between the registry and any
/// caller holding a handle.
#[derive(Debug)]
pub struct Account {
    number: AccountNumber,
    holder: String,
    created_at: DateTime<Utc>,
    state: Mutex<AccountState>,
}

impl Account {
    /// Open a new account
    ///
    /// If `initial_balance` is positive, an initial DEPOSIT record is appended
    /// so that the opening balance is backed by history like every other
    /// balance change.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `initial_balance` is negative.
    pub fn open(
        number: AccountNumber,
        holder: impl Into<String>,
        initial_balance: Decimal,
    ) -> Result<Self, LedgerError> {
        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(initial_balance, "open"));
        }

        let mut history = Vec::new();
        if initial_balance > Decimal::ZERO {
            history.push(TransactionRecord::new(
                TransactionId::next(),
                TransactionType::Deposit,
                None,
                Some(number.clone()),
                initial_balance,
                "Initial deposit",
                TransactionStatus::Success,
            ));
        }

        Ok(Account {
            number,
            holder: holder.into(),
            created_at: Utc::now(),
            state: Mutex::new(AccountState {
                balance: initial_balance,
                history,
                closed: false,
            }),
        })
    }

    /// Account identifier
    pub fn number(&self) -> &AccountNumber {
        &self.number
    }

    /// Name of the account holder
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// When the account was opened
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Credit funds to the account
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not positive (no record is appended)
    /// - `AccountClosed` if the account has been closed
    /// - `ArithmeticOverflow` if the balance cannot represent the result
    pub fn deposit(&self, amount: Decimal, description: &str) -> Result<Receipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount, "deposit"));
        }

        let mut state = self.state.lock();
        state.ensure_open(&self.number)?;

        let balance = state
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", &self.number))?;

        let transaction_id = TransactionId::next();
        state.balance = balance;
        state.history.push(TransactionRecord::new(
            transaction_id,
            TransactionType::Deposit,
            None,
            Some(self.number.clone()),
            amount,
            description,
            TransactionStatus::Success,
        ));

        Ok(Receipt {
            transaction_id,
            balance,
        })
    }

    /// Debit funds from the account
    ///
    /// A withdrawal larger than the balance fails without touching the
    /// balance, but the attempt is kept: exactly one INSUFFICIENT_FUNDS record
    /// is appended.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not positive (no record is appended)
    /// - `AccountClosed` if the account has been closed
    /// - `InsufficientFunds` if the balance is lower than `amount`
    pub fn withdraw(&self, amount: Decimal, description: &str) -> Result<Receipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount, "withdraw"));
        }

        let mut state = self.state.lock();
        state.ensure_open(&self.number)?;

        let transaction_id = TransactionId::next();
        if state.balance < amount {
            let available = state.balance;
            state.history.push(TransactionRecord::new(
                transaction_id,
                TransactionType::Withdraw,
                Some(self.number.clone()),
                None,
                amount,
                description,
                TransactionStatus::InsufficientFunds,
            ));
            return Err(LedgerError::insufficient_funds(
                &self.number,
                available,
                amount,
                transaction_id,
            ));
        }

        let balance = state
            .balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("withdraw", &self.number))?;
        state.balance = balance;
        state.history.push(TransactionRecord::new(
            transaction_id,
            TransactionType::Withdraw,
            Some(self.number.clone()),
            None,
            amount,
            description,
            TransactionStatus::Success,
        ));

        Ok(Receipt {
            transaction_id,
            balance,
        })
    }

    /// Move funds from this account to `to`
    ///
    /// Delegates to the ordered two-lock protocol in [`super::transfer`].
    pub fn transfer_out(
        &self,
        to: &Account,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt, LedgerError> {
        transfer::transfer(self, to, amount, description)
    }

    /// Current balance
    pub fn balance(&self) -> Decimal {
        self.state.lock().balance
    }

    /// Copy of the transaction history, oldest first
    pub fn history(&self) -> Vec<TransactionRecord> {
        self.state.lock().history.clone()
    }

    /// Number of records in the history
    pub fn transaction_count(&self) -> usize {
        self.state.lock().history.len()
    }

    /// False once the account has been closed
    pub fn is_active(&self) -> bool {
        !self.state.lock().closed
    }

    /// Consistent view of the account
    pub fn snapshot(&self) -> AccountSummary {
        let state = self.state.lock();
        AccountSummary {
            number: self.number.clone(),
            holder: self.holder.clone(),
            balance: state.balance,
            transaction_count: state.history.len(),
            created_at: self.created_at,
            active: !state.closed,
        }
    }

    /// Mark the account closed if its balance is exactly zero
    ///
    /// Once closed, every mutating operation on any outstanding handle fails
    /// with `AccountClosed`.
    pub(crate) fn close_if_empty(&self) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.ensure_open(&self.number)?;
        if !state.balance.is_zero() {
            return Err(LedgerError::account_not_empty(&self.number, state.balance));
        }
        state.closed = true;
        Ok(())
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, AccountState> {
        self.state.lock()
    }
}
