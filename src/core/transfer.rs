//! Two-account transfer protocol
//!
//! Moving money between two accounts needs both account locks at once. To
//! rule out circular waits, every transfer acquires the locks in ascending
//! [`AccountNumber`] order regardless of which side is the source. Any set of
//! concurrent transfers therefore acquires locks along one global order and
//! cannot deadlock, including pairs running A→B and B→A at the same time.
//!
//! Both guards are dropped on every exit path by scope.

use super::account::{Account, AccountState};
use crate::types::{
    LedgerError, Receipt, TransactionId, TransactionRecord, TransactionStatus, TransactionType,
};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Move `amount` from `from` to `to`
///
/// On success both accounts get one SUCCESS TRANSFER record sharing the same
/// transaction id. On insufficient funds only the source gets an
/// INSUFFICIENT_FUNDS record. Every other failure leaves both histories
/// untouched.
///
/// # Errors
///
/// - `InvalidAmount` if `amount` is not positive
/// - `SameAccountTransfer` if both sides are the same account
/// - `AccountClosed` if either account has been closed
/// - `InsufficientFunds` if the source balance is lower than `amount`
/// - `ArithmeticOverflow` if the destination cannot hold the result
pub fn transfer(
    from: &Account,
    to: &Account,
    amount: Decimal,
    description: &str,
) -> Result<Receipt, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount, "transfer"));
    }

    let (mut source, mut destination) = match from.number().cmp(to.number()) {
        Ordering::Equal => {
            return Err(LedgerError::SameAccountTransfer {
                account: from.number().clone(),
            })
        }
        Ordering::Less => {
            let source = from.lock_state();
            let destination = to.lock_state();
            (source, destination)
        }
        Ordering::Greater => {
            let destination = to.lock_state();
            let source = from.lock_state();
            (source, destination)
        }
    };

    apply(from, to, &mut source, &mut destination, amount, description)
}

/// Body of the transfer, run with both locks held
fn apply(
    from: &Account,
    to: &Account,
    source: &mut AccountState,
    destination: &mut AccountState,
    amount: Decimal,
    description: &str,
) -> Result<Receipt, LedgerError> {
    source.ensure_open(from.number())?;
    destination.ensure_open(to.number())?;

    let transaction_id = TransactionId::next();
    let record = |status| {
        TransactionRecord::new(
            transaction_id,
            TransactionType::Transfer,
            Some(from.number().clone()),
            Some(to.number().clone()),
            amount,
            description,
            status,
        )
    };

    if source.balance < amount {
        let available = source.balance;
        source
            .history
            .push(record(TransactionStatus::InsufficientFunds));
        return Err(LedgerError::insufficient_funds(
            from.number(),
            available,
            amount,
            transaction_id,
        ));
    }

    // Compute both sides before mutating either.
    let debited = source
        .balance
        .checked_sub(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", from.number()))?;
    let credited = destination
        .balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", to.number()))?;

    source.balance = debited;
    destination.balance = credited;
    source.history.push(record(TransactionStatus::Success));
    destination.history.push(record(TransactionStatus::Success));

    Ok(Receipt {
        transaction_id,
        balance: debited,
    })
}
