//! Typed call/transact surface over the estate registry contract.
//!
//! Reads are plain `eth_call`s. Writes follow one pipeline:
//!
//! ```text
//! AuthorizationContext (fresh, owns the signer's submission lock)
//!   ↓
//! 1. Encode call data
//!   ↓
//! 2. Pre-flight the call from the signer (reverts surface here)
//!   ↓
//! 3. Build and sign the transaction with the context's nonce and fee rate
//!   ↓
//! 4. Submit (accepted for inclusion, not final)
//!   ↓
//! 5. Record the nonce as used, release the lock, return the handle
//! ```
//!
//! Remote messages are never interpreted. The one exception is the compiler's
//! array-bounds panic on a getter, which is how the contract reports a missing
//! index; it becomes [`LedgerError::NotFound`].

use std::sync::Arc;

use chrono::Utc;

use realty_core::{
    Address, CancelKind, Estate, EstateDraft, LedgerError, LedgerResult, Present, RecordKind,
};

use crate::abi::{self, PANIC_ARRAY_OUT_OF_BOUNDS, Revert, Token, Words};
use crate::authorization::AuthorizationContext;
use crate::connection::{CallRequest, LedgerConnection, RpcError};
use crate::transaction::{TransactionRequest, TxHandle};

/// Canonical signatures of the contract entry points.
pub mod functions {
    pub const ESTATE_COUNT: &str = "getEstatesNumber()";
    pub const PRESENT_COUNT: &str = "getPresentsNumber()";
    pub const IS_ADMIN: &str = "iamAdmin()";
    pub const GET_ESTATE: &str = "getEstates(uint256)";
    pub const GET_ESTATE_STATUSES: &str = "getEstatesStatuses(uint256)";
    pub const GET_PRESENT: &str = "getPresents(uint256)";

    pub const CREATE_ESTATE: &str = "createEstate(address,string,uint256,uint256)";
    pub const CREATE_PRESENT: &str = "createPresent(uint256,address)";
    pub const CANCEL_PRESENT: &str = "cancelPresent(uint256)";
    pub const CANCEL_SALE: &str = "cancelSale(uint256)";
    pub const CANCEL_RENT: &str = "cancelRent(uint256)";
    pub const CONFIRM_PRESENT: &str = "confirmPresent(uint256)";
}

fn cancel_function(kind: CancelKind) -> &'static str {
    match kind {
        CancelKind::Present => functions::CANCEL_PRESENT,
        CancelKind::Sale => functions::CANCEL_SALE,
        CancelKind::Rent => functions::CANCEL_RENT,
    }
}

fn to_u64(value: u128, what: &str) -> LedgerResult<u64> {
    u64::try_from(value).map_err(|_| LedgerError::read(format!("{what} {value} exceeds 64 bits")))
}

/// Proxy for one deployed registry contract.
#[derive(Clone)]
pub struct ContractProxy {
    connection: Arc<dyn LedgerConnection>,
    address: Address,
    chain_id: u64,
}

impl ContractProxy {
    pub fn new(connection: Arc<dyn LedgerConnection>, address: Address, chain_id: u64) -> Self {
        Self {
            connection,
            address,
            chain_id,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, caller: Option<Address>, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let request = CallRequest {
            from: caller,
            to: self.address,
            data,
        };
        self.connection.call(&request).await
    }

    async fn read(&self, caller: Option<Address>, function: &str, args: &[Token]) -> LedgerResult<Vec<u8>> {
        self.call(caller, abi::encode_call(function, args))
            .await
            .map_err(RpcError::into_read_error)
    }

    /// Getter for one record index; the bounds panic maps to `NotFound`.
    async fn read_record(
        &self,
        caller: Option<Address>,
        function: &str,
        kind: RecordKind,
        index: u64,
    ) -> LedgerResult<Vec<u8>> {
        let data = abi::encode_call(function, &[Token::Uint(u128::from(index))]);
        self.call(caller, data).await.map_err(|err| match err.revert() {
            Some(Revert::Panic(PANIC_ARRAY_OUT_OF_BOUNDS)) => LedgerError::NotFound { kind, index },
            _ => err.into_read_error(),
        })
    }

    pub async fn estate_count(&self, caller: Option<Address>) -> LedgerResult<u64> {
        let out = self.read(caller, functions::ESTATE_COUNT, &[]).await?;
        to_u64(Words::new(&out).uint()?, "estate count")
    }

    pub async fn present_count(&self, caller: Option<Address>) -> LedgerResult<u64> {
        let out = self.read(caller, functions::PRESENT_COUNT, &[]).await?;
        to_u64(Words::new(&out).uint()?, "present count")
    }

    /// Whether the contract lists `caller` as an administrator.
    pub async fn is_admin(&self, caller: Address) -> LedgerResult<bool> {
        let out = self.read(Some(caller), functions::IS_ADMIN, &[]).await?;
        Ok(Words::new(&out).boolean()?)
    }

    /// Estate at `index`, assembled from its data and status getters.
    pub async fn get_estate(&self, caller: Option<Address>, index: u64) -> LedgerResult<Estate> {
        let data = self
            .read_record(caller, functions::GET_ESTATE, RecordKind::Estate, index)
            .await?;
        let statuses = self
            .read_record(caller, functions::GET_ESTATE_STATUSES, RecordKind::Estate, index)
            .await?;

        let mut words = Words::new(&data);
        let id = to_u64(words.uint()?, "estate id")?;
        let owner = words.address()?;
        let info = words.string()?;
        let area = words.uint()?;
        let usable_area = words.uint()?;
        let renter = Some(words.address()?).filter(|a| !a.is_zero());

        let mut flags = Words::new(&statuses);
        Ok(Estate {
            id,
            owner,
            info,
            area,
            usable_area,
            renter,
            presented: flags.boolean()?,
            for_sale: flags.boolean()?,
            for_rent: flags.boolean()?,
        })
    }

    pub async fn get_present(&self, caller: Option<Address>, index: u64) -> LedgerResult<Present> {
        let data = self
            .read_record(caller, functions::GET_PRESENT, RecordKind::Present, index)
            .await?;
        let mut words = Words::new(&data);
        Ok(Present {
            id: index,
            estate_id: to_u64(words.uint()?, "estate id")?,
            from: words.address()?,
            to: words.address()?,
            finished: words.boolean()?,
        })
    }

    pub async fn create_estate(&self, ctx: AuthorizationContext, draft: &EstateDraft) -> LedgerResult<TxHandle> {
        let data = abi::encode_call(
            functions::CREATE_ESTATE,
            &[
                Token::Address(draft.owner),
                Token::String(draft.info.clone()),
                Token::Uint(draft.area),
                Token::Uint(draft.usable_area),
            ],
        );
        self.transact(ctx, functions::CREATE_ESTATE, data).await
    }

    /// Offer estate `estate_id` to `recipient`.
    pub async fn create_present(
        &self,
        ctx: AuthorizationContext,
        estate_id: u64,
        recipient: Address,
    ) -> LedgerResult<TxHandle> {
        let data = abi::encode_call(
            functions::CREATE_PRESENT,
            &[Token::Uint(u128::from(estate_id)), Token::Address(recipient)],
        );
        self.transact(ctx, functions::CREATE_PRESENT, data).await
    }

    /// Cancel an in-flight offer of the given kind.
    pub async fn cancel(&self, ctx: AuthorizationContext, kind: CancelKind, id: u64) -> LedgerResult<TxHandle> {
        let function = cancel_function(kind);
        let data = abi::encode_call(function, &[Token::Uint(u128::from(id))]);
        self.transact(ctx, function, data).await
    }

    pub async fn cancel_present(&self, ctx: AuthorizationContext, present_id: u64) -> LedgerResult<TxHandle> {
        self.cancel(ctx, CancelKind::Present, present_id).await
    }

    pub async fn cancel_sale(&self, ctx: AuthorizationContext, sale_id: u64) -> LedgerResult<TxHandle> {
        self.cancel(ctx, CancelKind::Sale, sale_id).await
    }

    pub async fn cancel_rent(&self, ctx: AuthorizationContext, rent_id: u64) -> LedgerResult<TxHandle> {
        self.cancel(ctx, CancelKind::Rent, rent_id).await
    }

    /// Accept a transfer; the ledger reassigns ownership and finishes the present.
    pub async fn confirm_present(&self, ctx: AuthorizationContext, present_id: u64) -> LedgerResult<TxHandle> {
        let data = abi::encode_call(functions::CONFIRM_PRESENT, &[Token::Uint(u128::from(present_id))]);
        self.transact(ctx, functions::CONFIRM_PRESENT, data).await
    }

    async fn transact(&self, ctx: AuthorizationContext, function: &str, data: Vec<u8>) -> LedgerResult<TxHandle> {
        let signer = ctx.identity().address();
        let nonce = ctx.nonce();

        if let Err(err) = self.call(Some(signer), data.clone()).await {
            tracing::warn!(%signer, function, error = %err, "transaction rejected in pre-flight");
            return Err(err.into_submit_error());
        }

        let signed = TransactionRequest {
            nonce,
            fee_rate: ctx.fee_rate(),
            gas_limit: ctx.gas_limit(),
            to: self.address,
            value: ctx.value(),
            data,
            chain_id: self.chain_id,
        }
        .sign(ctx.identity())?;

        match self.connection.submit(&signed).await {
            Ok(hash) => {
                ctx.release();
                tracing::info!(%signer, function, nonce, tx = %hash, "transaction submitted");
                Ok(TxHandle {
                    hash,
                    nonce,
                    submitted_at: Utc::now(),
                })
            }
            Err(err) => {
                tracing::warn!(%signer, function, nonce, error = %err, "transaction rejected");
                Err(err.into_submit_error())
            }
        }
    }
}

impl core::fmt::Debug for ContractProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContractProxy")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_kinds_dispatch_to_distinct_entry_points() {
        assert_eq!(cancel_function(CancelKind::Present), "cancelPresent(uint256)");
        assert_eq!(cancel_function(CancelKind::Sale), "cancelSale(uint256)");
        assert_eq!(cancel_function(CancelKind::Rent), "cancelRent(uint256)");
    }

    #[test]
    fn oversized_counts_are_read_errors() {
        assert!(matches!(to_u64(u128::from(u64::MAX) + 1, "count"), Err(LedgerError::Read(_))));
        assert_eq!(to_u64(7, "count").unwrap(), 7);
    }
}
