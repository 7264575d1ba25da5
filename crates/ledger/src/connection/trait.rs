use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use realty_core::{Address, FeeRate, LedgerError, TxHash};

use crate::abi::{Revert, decode_revert};
use crate::transaction::SignedTransaction;

/// Failure of a single round trip to the node.
///
/// Transport failures and remote rejections are kept apart so the layers above
/// can decide whether the ledger spoke at all. Remote messages are never
/// rewritten.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{message}")]
    Remote {
        code: i64,
        message: String,
        /// Revert payload, when the node returned one.
        data: Option<Vec<u8>>,
    },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RpcError {
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Decoded revert payload carried by a remote error.
    pub fn revert(&self) -> Option<Revert> {
        match self {
            RpcError::Remote { data: Some(data), .. } => decode_revert(data),
            _ => None,
        }
    }

    /// Map a failed read (call/query).
    pub fn into_read_error(self) -> LedgerError {
        match self {
            RpcError::Transport(msg) => LedgerError::connection(msg),
            RpcError::Remote { message, .. } => LedgerError::read(message),
            RpcError::Malformed(msg) => LedgerError::read(format!("malformed response: {msg}")),
        }
    }

    /// Map a failed submission (including its pre-flight call).
    pub fn into_submit_error(self) -> LedgerError {
        match self {
            RpcError::Transport(msg) => LedgerError::connection(msg),
            RpcError::Remote { message, .. } => LedgerError::submit(message),
            RpcError::Malformed(msg) => LedgerError::read(format!("malformed response: {msg}")),
        }
    }
}

/// A read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Long-lived handle to a ledger node.
///
/// Every method is one point-in-time round trip: nothing is cached and nothing
/// is retried. Implementations must be safe to share across tasks.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// Next nonce for `address`, counting transactions still pending.
    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError>;

    async fn suggest_fee_rate(&self) -> Result<FeeRate, RpcError>;

    async fn balance_of(&self, address: Address) -> Result<u128, RpcError>;

    /// Deployed bytecode at `address` (empty for plain accounts).
    async fn code_at(&self, address: Address) -> Result<Vec<u8>, RpcError>;

    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, RpcError>;

    /// Hand a signed transaction to the node. Returns once it is accepted for
    /// inclusion, not once it is final.
    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, RpcError>;
}

#[async_trait]
impl<C> LedgerConnection for Arc<C>
where
    C: LedgerConnection + ?Sized,
{
    async fn chain_id(&self) -> Result<u64, RpcError> {
        (**self).chain_id().await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        (**self).pending_nonce(address).await
    }

    async fn suggest_fee_rate(&self) -> Result<FeeRate, RpcError> {
        (**self).suggest_fee_rate().await
    }

    async fn balance_of(&self, address: Address) -> Result<u128, RpcError> {
        (**self).balance_of(address).await
    }

    async fn code_at(&self, address: Address) -> Result<Vec<u8>, RpcError> {
        (**self).code_at(address).await
    }

    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, RpcError> {
        (**self).call(request).await
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, RpcError> {
        (**self).submit(tx).await
    }
}
