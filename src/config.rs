//! Ledger configuration
//!
//! Everything the core reads at construction time: capacity limits, pool and
//! queue sizing, amount ceilings, and whether audit hooks fire.

use crate::types::LedgerError;
use rust_decimal::Decimal;
use tracing::warn;

/// Configuration consumed by the registry and dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Maximum number of accounts the registry will hold
    pub max_accounts: usize,
    /// Number of worker threads in the dispatcher's pool
    pub worker_count: usize,
    /// Capacity of the dispatcher's work queue
    pub queue_capacity: usize,
    /// Whether the audit sink is invoked for completed operations
    pub audit_enabled: bool,
    /// Largest amount accepted by a single deposit, withdrawal or transfer
    pub max_operation_amount: Decimal,
    /// Largest opening balance accepted by `create_account` (inclusive)
    pub max_initial_balance: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_accounts: 1000,
            worker_count: num_cpus::get(),
            queue_capacity: 1000,
            audit_enabled: true,
            max_operation_amount: Decimal::from(1_000_000_000u64),
            max_initial_balance: Decimal::from(1_000_000u64),
        }
    }
}

impl LedgerConfig {
    /// Create a configuration with custom sizes
    ///
    /// Zero sizes are replaced with their defaults and a warning is logged.
    pub fn new(max_accounts: usize, worker_count: usize, queue_capacity: usize) -> Self {
        let default = Self::default();

        let max_accounts = or_default("max_accounts", max_accounts, default.max_accounts);
        let worker_count = or_default("worker_count", worker_count, default.worker_count);
        let queue_capacity = or_default("queue_capacity", queue_capacity, default.queue_capacity);

        Self {
            max_accounts,
            worker_count,
            queue_capacity,
            ..default
        }
    }

    /// Set whether audit hooks fire
    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Reads `LEDGER_MAX_ACCOUNTS`, `LEDGER_WORKERS`, `LEDGER_QUEUE_CAPACITY`
    /// and `LEDGER_AUDIT` over the defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_parse("LEDGER_MAX_ACCOUNTS") {
            config.max_accounts = value;
        }

        if let Some(value) = env_parse("LEDGER_WORKERS") {
            config.worker_count = value;
        }

        if let Some(value) = env_parse("LEDGER_QUEUE_CAPACITY") {
            config.queue_capacity = value;
        }

        if let Some(value) = env_parse("LEDGER_AUDIT") {
            config.audit_enabled = value;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_accounts == 0 {
            return Err(LedgerError::invalid_config("max_accounts must be positive"));
        }

        if self.worker_count == 0 {
            return Err(LedgerError::invalid_config("worker_count must be positive"));
        }

        if self.queue_capacity == 0 {
            return Err(LedgerError::invalid_config("queue_capacity must be positive"));
        }

        if self.max_operation_amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_config(
                "max_operation_amount must be positive",
            ));
        }

        if self.max_initial_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_config(
                "max_initial_balance cannot be negative",
            ));
        }

        Ok(())
    }
}

fn or_default(name: &str, value: usize, default: usize) -> usize {
    if value == 0 {
        warn!(
            setting = name,
            value,
            default,
            "Invalid configuration value, using default"
        );
        default
    } else {
        value
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_count, num_cpus::get());
        assert!(config.audit_enabled);
    }

    #[rstest]
    #[case::custom(10, 4, 64, (10, 4, 64))]
    #[case::zero_accounts(0, 4, 64, (1000, 4, 64))]
    #[case::zero_workers(10, 0, 64, (10, num_cpus::get(), 64))]
    #[case::zero_capacity(10, 4, 0, (10, 4, 1000))]
    fn test_new_falls_back_to_defaults(
        #[case] max_accounts: usize,
        #[case] workers: usize,
        #[case] capacity: usize,
        #[case] expected: (usize, usize, usize),
    ) {
        let config = LedgerConfig::new(max_accounts, workers, capacity);
        assert_eq!(
            (config.max_accounts, config.worker_count, config.queue_capacity),
            expected
        );
    }

    #[rstest]
    #[case::zero_workers(LedgerConfig { worker_count: 0, ..LedgerConfig::default() })]
    #[case::zero_capacity(LedgerConfig { queue_capacity: 0, ..LedgerConfig::default() })]
    #[case::zero_accounts(LedgerConfig { max_accounts: 0, ..LedgerConfig::default() })]
    #[case::zero_ceiling(LedgerConfig { max_operation_amount: Decimal::ZERO, ..LedgerConfig::default() })]
    fn test_invalid_config(#[case] config: LedgerConfig) {
        assert!(matches!(
            config.validate(),
            Err(LedgerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_with_audit_toggles_hook() {
        let config = LedgerConfig::default().with_audit(false);
        assert!(!config.audit_enabled);
    }
}
