//! The boundary front-ends call into.
//!
//! `EstateRegistry` wires one connection to the proxy, the authorization
//! builder and the enumerator. It holds no session state: every call names
//! the identity it acts for, and writes get a fresh authorization context.

use std::sync::Arc;

use realty_core::{
    Address, CancelKind, Estate, EstateDraft, LedgerError, LedgerResult, Present, RecordFilter,
};
use realty_identity::Identity;

use crate::authorization::{AuthorizationBuilder, AuthorizationContext};
use crate::config::LedgerConfig;
use crate::connection::{InMemoryLedger, JsonRpcConnection, LedgerConnection, RpcError};
use crate::contract::ContractProxy;
use crate::enumerator::{EntityEnumerator, Enumeration};
use crate::transaction::TxHandle;

fn bootstrap_error(what: &str, err: RpcError) -> LedgerError {
    LedgerError::connection(format!("{what}: {err}"))
}

pub struct EstateRegistry {
    connection: Arc<dyn LedgerConnection>,
    proxy: ContractProxy,
    authorization: AuthorizationBuilder,
    enumerator: EntityEnumerator,
}

impl EstateRegistry {
    /// Connect to the ledger named by `config`.
    ///
    /// Fails with `Connection` when the node is unreachable or nothing is
    /// deployed at the contract address. Callers treat this as fatal.
    pub async fn connect(config: &LedgerConfig) -> LedgerResult<Self> {
        let connection: Arc<dyn LedgerConnection> = if config.is_in_memory() {
            tracing::warn!("using the in-memory ledger; state is lost on exit");
            Arc::new(InMemoryLedger::new(config.contract))
        } else {
            Arc::new(
                JsonRpcConnection::new(config.endpoint.clone(), config.timeout)
                    .map_err(|e| bootstrap_error(&config.endpoint, e))?,
            )
        };
        Self::open(connection, config.contract, config.gas_limit, config.chain_id).await
    }

    /// Bind to `contract` over an existing connection.
    pub async fn open(
        connection: Arc<dyn LedgerConnection>,
        contract: Address,
        gas_limit: u64,
        chain_id: Option<u64>,
    ) -> LedgerResult<Self> {
        let chain_id = match chain_id {
            Some(id) => id,
            None => connection
                .chain_id()
                .await
                .map_err(|e| bootstrap_error("reading chain id", e))?,
        };

        let code = connection
            .code_at(contract)
            .await
            .map_err(|e| bootstrap_error("reading contract code", e))?;
        if code.is_empty() {
            return Err(LedgerError::connection(format!("no contract deployed at {contract}")));
        }

        tracing::info!(%contract, chain_id, gas_limit, "estate registry connected");

        let proxy = ContractProxy::new(connection.clone(), contract, chain_id);
        Ok(Self {
            authorization: AuthorizationBuilder::new(connection.clone(), gas_limit),
            enumerator: EntityEnumerator::new(proxy.clone()),
            connection,
            proxy,
        })
    }

    pub fn proxy(&self) -> &ContractProxy {
        &self.proxy
    }

    pub fn enumerator(&self) -> &EntityEnumerator {
        &self.enumerator
    }

    /// Fresh authorization context for one write by `identity`.
    pub async fn authorize(&self, identity: Arc<Identity>) -> LedgerResult<AuthorizationContext> {
        self.authorization.build(identity).await
    }

    pub async fn current_balance(&self, identity: &Identity) -> LedgerResult<u128> {
        self.connection
            .balance_of(identity.address())
            .await
            .map_err(RpcError::into_read_error)
    }

    pub async fn is_admin(&self, identity: &Identity) -> LedgerResult<bool> {
        self.proxy.is_admin(identity.address()).await
    }

    pub async fn create_estate(&self, identity: Arc<Identity>, draft: &EstateDraft) -> LedgerResult<TxHandle> {
        let ctx = self.authorize(identity).await?;
        self.proxy.create_estate(ctx, draft).await
    }

    pub async fn create_present(
        &self,
        identity: Arc<Identity>,
        estate_id: u64,
        recipient: Address,
    ) -> LedgerResult<TxHandle> {
        let ctx = self.authorize(identity).await?;
        self.proxy.create_present(ctx, estate_id, recipient).await
    }

    pub async fn cancel(&self, identity: Arc<Identity>, kind: CancelKind, id: u64) -> LedgerResult<TxHandle> {
        let ctx = self.authorize(identity).await?;
        self.proxy.cancel(ctx, kind, id).await
    }

    pub async fn confirm_present(&self, identity: Arc<Identity>, present_id: u64) -> LedgerResult<TxHandle> {
        let ctx = self.authorize(identity).await?;
        self.proxy.confirm_present(ctx, present_id).await
    }

    pub fn list_estates(&self, identity: &Identity, filter: RecordFilter) -> Enumeration<Estate> {
        self.enumerator.list_estates(identity.address(), filter)
    }

    pub fn list_presents(&self, identity: &Identity, filter: RecordFilter) -> Enumeration<Present> {
        self.enumerator.list_presents(identity.address(), filter)
    }

    pub async fn estate(&self, identity: &Identity, id: u64) -> LedgerResult<Estate> {
        self.proxy.get_estate(Some(identity.address()), id).await
    }

    pub async fn present(&self, identity: &Identity, id: u64) -> LedgerResult<Present> {
        self.proxy.get_present(Some(identity.address()), id).await
    }
}

impl core::fmt::Debug for EstateRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EstateRegistry")
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}
