//! I/O module
//!
//! Handles CSV output.
//!
//! # Components
//!
//! - `csv_format` - Account summary and transaction history serialization

pub mod csv_format;

pub use csv_format::{write_accounts_csv, write_history_csv};
