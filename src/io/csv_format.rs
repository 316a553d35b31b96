//! CSV output for account summaries and transaction history
//!
//! Balances and amounts are written with two decimal places. Rows come out
//! in a deterministic order so runs can be diffed.

use crate::types::{AccountNumber, AccountSummary, LedgerError, TransactionRecord};
use csv::Writer;
use std::io::Write;

/// Write account summaries
///
/// Columns: number, holder, balance, transactions, active. Rows are sorted by
/// account number.
///
/// # Errors
///
/// Returns `IoError` if the output cannot be written.
pub fn write_accounts_csv(
    accounts: &[AccountSummary],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);

    writer.write_record(["number", "holder", "balance", "transactions", "active"])?;

    let mut sorted: Vec<&AccountSummary> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.number.cmp(&b.number));

    for account in sorted {
        writer.write_record(&[
            account.number.to_string(),
            account.holder.clone(),
            format!("{:.2}", account.balance),
            account.transaction_count.to_string(),
            account.active.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write transaction history records in the order given
///
/// Columns: id, type, from, to, amount, status, description, timestamp.
/// Missing sides are left empty; timestamps are RFC 3339.
///
/// # Errors
///
/// Returns `IoError` if the output cannot be written.
pub fn write_history_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);

    writer.write_record([
        "id",
        "type",
        "from",
        "to",
        "amount",
        "status",
        "description",
        "timestamp",
    ])?;

    let side = |number: &Option<AccountNumber>| {
        number.as_ref().map(ToString::to_string).unwrap_or_default()
    };

    for record in records {
        writer.write_record(&[
            record.id.to_string(),
            record.tx_type.as_str().to_string(),
            side(&record.from),
            side(&record.to),
            format!("{:.2}", record.amount),
            record.status.as_str().to_string(),
            record.description.clone(),
            record.timestamp.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
