//! Per-transaction authorization contexts.
//!
//! A context is built fresh for every write and consumed by it. Building one
//! takes the identity's submission lock, so at most one write per identity is
//! between "nonce read" and "submitted" at any time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use realty_core::{Address, FeeRate, LedgerResult};
use realty_identity::Identity;

use crate::connection::{LedgerConnection, RpcError};

/// Gas ceiling sized for the most expensive registry call.
pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

/// Held by a live context; carries no state of its own.
#[derive(Debug, Default)]
struct SubmissionSlot;

/// Single-use signing context: signer, nonce, fee rate, value and gas limit.
///
/// Not `Clone`. Holding it holds the signer's submission lock.
#[derive(Debug)]
pub struct AuthorizationContext {
    identity: Arc<Identity>,
    nonce: u64,
    fee_rate: FeeRate,
    value: u128,
    gas_limit: u64,
    _slot: OwnedMutexGuard<SubmissionSlot>,
}

impl AuthorizationContext {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn fee_rate(&self) -> FeeRate {
        self.fee_rate
    }

    /// Always zero: registry calls carry no currency.
    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Release the submission lock once the ledger has accepted the write.
    pub(crate) fn release(self) {
        tracing::trace!(address = %self.identity.address(), nonce = self.nonce, "submission lock released");
    }
}

/// Builds [`AuthorizationContext`]s against a ledger connection.
pub struct AuthorizationBuilder {
    connection: Arc<dyn LedgerConnection>,
    gas_limit: u64,
    slots: Mutex<HashMap<Address, Arc<AsyncMutex<SubmissionSlot>>>>,
}

impl AuthorizationBuilder {
    pub fn new(connection: Arc<dyn LedgerConnection>, gas_limit: u64) -> Self {
        Self {
            connection,
            gas_limit,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, address: Address) -> Arc<AsyncMutex<SubmissionSlot>> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Slots nobody is waiting on or holding can go.
        slots.retain(|owner, slot| *owner == address || Arc::strong_count(slot) > 1);
        slots.entry(address).or_default().clone()
    }

    /// Read the pending nonce and the fee rate, then bind them to `identity`.
    ///
    /// The node's pending count is used as-is; nothing is remembered between
    /// builds. Waits while another context for the same identity is alive.
    /// Either read failing fails the build; nothing is retried.
    pub async fn build(&self, identity: Arc<Identity>) -> LedgerResult<AuthorizationContext> {
        let address = identity.address();
        let slot = self.slot(address).lock_owned().await;

        let nonce = self
            .connection
            .pending_nonce(address)
            .await
            .map_err(RpcError::into_read_error)?;
        let fee_rate = self
            .connection
            .suggest_fee_rate()
            .await
            .map_err(RpcError::into_read_error)?;

        tracing::debug!(%address, nonce, %fee_rate, "authorization built");

        Ok(AuthorizationContext {
            identity,
            nonce,
            fee_rate,
            value: 0,
            gas_limit: self.gas_limit,
            _slot: slot,
        })
    }
}

impl core::fmt::Debug for AuthorizationBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorizationBuilder")
            .field("gas_limit", &self.gas_limit)
            .finish_non_exhaustive()
    }
}

impl AuthorizationBuilder {
    #[cfg(test)]
    fn tracked_slots(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
