//! Client for the estate registry contract on an Ethereum-compatible ledger.
//!
//! - `connection`: node boundary (JSON-RPC adapter, in-memory ledger)
//! - `abi`, `rlp`, `transaction`: wire encoding and signing
//! - `contract`: typed reads and writes
//! - `authorization`: per-write nonce/fee contexts, serialized per identity
//! - `enumerator`: lazy filtered listings
//! - `registry`: the facade front-ends use

pub mod abi;
pub mod authorization;
pub mod config;
pub mod connection;
pub mod contract;
pub mod enumerator;
pub mod registry;
pub mod rlp;
pub mod transaction;

pub use authorization::{AuthorizationBuilder, AuthorizationContext, DEFAULT_GAS_LIMIT};
pub use config::{ConfigError, LedgerConfig};
pub use connection::{CallRequest, InMemoryLedger, JsonRpcConnection, LedgerConnection, RpcError};
pub use contract::ContractProxy;
pub use enumerator::{Enumerable, EntityEnumerator, Enumeration};
pub use registry::EstateRegistry;
pub use transaction::{SignedTransaction, TransactionRequest, TxHandle};
