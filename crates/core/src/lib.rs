//! `realty-core` — domain building blocks for the estate registry client.
//!
//! This crate contains **pure domain** types (no I/O): identifiers, record
//! snapshots, filters, validated command inputs and the shared error model.

pub mod amount;
pub mod command;
pub mod entity;
pub mod error;
pub mod filter;
pub mod id;
pub mod record;

pub use amount::{FeeRate, parse_index, parse_quantity};
pub use command::{CancelKind, EstateDraft};
pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use filter::RecordFilter;
pub use id::{Address, TxHash, keccak256};
pub use record::{Estate, LedgerRecord, Present, RecordKind};
