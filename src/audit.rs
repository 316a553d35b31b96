//! Audit events and the built-in sinks
//!
//! An [`AuditEvent`] is built by the registry from an operation and its
//! outcome. Two sinks ship with the crate: [`TracingAuditSink`] logs each
//! event under the `ledger::audit` target, and [`MemoryAuditSink`] keeps
//! events in memory for inspection.

use crate::core::AuditSink;
use crate::types::{
    AccountNumber, LedgerError, LedgerOperation, Receipt, TransactionId, TransactionStatus,
    TransactionType,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// One completed ledger operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    /// Id of the record appended, absent when the operation left no record
    pub transaction_id: Option<TransactionId>,
    pub operation: TransactionType,
    pub from: Option<AccountNumber>,
    pub to: Option<AccountNumber>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Failure message, absent on success
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Describe `operation` and the result it produced
    pub fn from_outcome(
        operation: &LedgerOperation,
        outcome: &Result<Receipt, LedgerError>,
    ) -> Self {
        let (transaction_id, status, error) = match outcome {
            Ok(receipt) => (Some(receipt.transaction_id), TransactionStatus::Success, None),
            Err(error @ LedgerError::InsufficientFunds { .. }) => (
                error.recorded_transaction(),
                TransactionStatus::InsufficientFunds,
                Some(error.to_string()),
            ),
            Err(error) => (None, TransactionStatus::Failed, Some(error.to_string())),
        };

        AuditEvent {
            transaction_id,
            operation: operation.tx_type(),
            from: operation.source().cloned(),
            to: operation.destination().cloned(),
            amount: operation.amount(),
            status,
            error,
            timestamp: Utc::now(),
        }
    }

    /// Whether the operation committed
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// Sink that emits one `info!` event per operation
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        info!(
            target: "ledger::audit",
            transaction_id = event.transaction_id.map(|id| id.value()),
            operation = event.operation.as_str(),
            from = account_or_dash(&event.from),
            to = account_or_dash(&event.to),
            amount = %event.amount,
            status = event.status.as_str(),
            error = event.error.as_deref(),
            "ledger operation completed"
        );
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events, in arrival order
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().push(event.clone());
    }
}

fn account_or_dash(number: &Option<AccountNumber>) -> &str {
    number.as_ref().map_or("-", AccountNumber::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn acc(n: u64) -> AccountNumber {
        AccountNumber::from_sequence(n)
    }

    #[test]
    fn test_event_from_success() {
        let op = LedgerOperation::transfer(acc(1), acc(2), Decimal::TEN, "rent");
        let receipt = Receipt {
            transaction_id: TransactionId::new(5),
            balance: Decimal::ZERO,
        };

        let event = AuditEvent::from_outcome(&op, &Ok(receipt));

        assert!(event.is_success());
        assert_eq!(event.transaction_id, Some(TransactionId::new(5)));
        assert_eq!(event.operation, TransactionType::Transfer);
        assert_eq!(event.from, Some(acc(1)));
        assert_eq!(event.to, Some(acc(2)));
        assert_eq!(event.amount, Decimal::TEN);
        assert_eq!(event.error, None);
    }

    #[rstest]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(&acc(1), Decimal::ONE, Decimal::TEN, TransactionId::new(9)),
        TransactionStatus::InsufficientFunds,
        Some(TransactionId::new(9))
    )]
    #[case::not_found(
        LedgerError::account_not_found(&acc(1)),
        TransactionStatus::Failed,
        None
    )]
    #[case::invalid_amount(
        LedgerError::invalid_amount(Decimal::ZERO, "withdraw"),
        TransactionStatus::Failed,
        None
    )]
    fn test_event_from_failure(
        #[case] error: LedgerError,
        #[case] status: TransactionStatus,
        #[case] transaction_id: Option<TransactionId>,
    ) {
        let op = LedgerOperation::withdraw(acc(1), Decimal::TEN, "");
        let message = error.to_string();

        let event = AuditEvent::from_outcome(&op, &Err(error));

        assert_eq!(event.status, status);
        assert_eq!(event.transaction_id, transaction_id);
        assert_eq!(event.error, Some(message));
        assert_eq!(event.to, None);
    }

    #[test]
    fn test_memory_sink_collects_events() {
        let sink = MemoryAuditSink::new();
        assert!(sink.is_empty());

        let op = LedgerOperation::deposit(acc(3), Decimal::ONE, "");
        let event = AuditEvent::from_outcome(&op, &Err(LedgerError::account_not_found(&acc(3))));
        sink.record(&event);
        sink.record(&event);

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[0], event);
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        let op = LedgerOperation::deposit(acc(3), Decimal::ONE, "");
        let event = AuditEvent::from_outcome(&op, &Err(LedgerError::PoolNotRunning));
        TracingAuditSink.record(&event);
    }
}
