//! Deterministic workload generation

use crate::types::{AccountNumber, LedgerOperation};
use rust_decimal::Decimal;

/// Build `count` transfers around a ring of accounts
///
/// Even-numbered operations move `amount` from account `i` to its successor;
/// odd-numbered ones move it back from the successor, so neighbouring pairs
/// are hit from both directions. With a single account the workload falls
/// back to deposits; with none it is empty.
pub fn ring_transfers(
    accounts: &[AccountNumber],
    count: usize,
    amount: Decimal,
) -> Vec<LedgerOperation> {
    match accounts.len() {
        0 => Vec::new(),
        1 => (0..count)
            .map(|_| LedgerOperation::deposit(accounts[0].clone(), amount, "ring deposit"))
            .collect(),
        n => (0..count)
            .map(|i| {
                let here = &accounts[(i / 2) % n];
                let next = &accounts[(i / 2 + 1) % n];
                if i % 2 == 0 {
                    LedgerOperation::transfer(here.clone(), next.clone(), amount, "ring forward")
                } else {
                    LedgerOperation::transfer(next.clone(), here.clone(), amount, "ring back")
                }
            })
            .collect(),
    }
}
