//! Ledger node boundary.
//!
//! This module defines the transport-facing abstraction the client talks to,
//! plus a JSON-RPC adapter for real nodes and an in-memory ledger for
//! tests/dev.

pub mod in_memory;
pub mod json_rpc;
pub mod r#trait;

pub use in_memory::{IN_MEMORY_CHAIN_ID, InMemoryLedger};
pub use json_rpc::JsonRpcConnection;
pub use r#trait::{CallRequest, LedgerConnection, RpcError};
