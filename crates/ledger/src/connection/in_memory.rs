use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use realty_core::{Address, Estate, FeeRate, Present, RecordKind, TxHash};

use super::r#trait::{CallRequest, LedgerConnection, RpcError};
use crate::abi::{
    self, AbiError, PANIC_ARRAY_OUT_OF_BOUNDS, Revert, Token, Words, encode_revert, split_call,
};
use crate::contract::functions;
use crate::transaction::SignedTransaction;

/// JSON-RPC code geth uses for reverted execution.
const EXECUTION_REVERTED: i64 = 3;
/// JSON-RPC code for generic server-side rejections.
const SERVER_ERROR: i64 = -32000;

/// Chain id reported by the in-memory ledger (the usual local dev-chain id).
pub const IN_MEMORY_CHAIN_ID: u64 = 1337;

#[derive(Debug, Default)]
struct Faults {
    reads: HashSet<(RecordKind, u64)>,
    nonce: bool,
    fee: bool,
}

#[derive(Debug, Clone, Default)]
struct Registry {
    estates: Vec<Estate>,
    presents: Vec<Present>,
}

#[derive(Debug, Default)]
struct State {
    registry: Registry,
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, u128>,
    admins: HashSet<Address>,
    submitted: Vec<TxHash>,
    faults: Faults,
}

/// In-memory ledger running the estate registry contract.
///
/// Intended for tests/dev. It trusts `SignedTransaction::from` rather than
/// recovering the signer from the envelope.
#[derive(Debug)]
pub struct InMemoryLedger {
    contract: Address,
    chain_id: u64,
    fee_rate: FeeRate,
    state: Mutex<State>,
}

fn lock_poisoned() -> RpcError {
    RpcError::Transport("in-memory ledger lock poisoned".to_string())
}

fn revert(reason: &str) -> RpcError {
    RpcError::Remote {
        code: EXECUTION_REVERTED,
        message: format!("execution reverted: {reason}"),
        data: Some(encode_revert(&Revert::Reason(reason.to_string()))),
    }
}

fn out_of_bounds() -> RpcError {
    RpcError::Remote {
        code: EXECUTION_REVERTED,
        message: "execution reverted".to_string(),
        data: Some(encode_revert(&Revert::Panic(PANIC_ARRAY_OUT_OF_BOUNDS))),
    }
}

fn bad_input(err: AbiError) -> RpcError {
    revert(&err.to_string())
}

fn ensure(cond: bool, reason: &str) -> Result<(), RpcError> {
    if cond { Ok(()) } else { Err(revert(reason)) }
}

impl InMemoryLedger {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            chain_id: IN_MEMORY_CHAIN_ID,
            fee_rate: FeeRate::new(20_000_000_000),
            state: Mutex::new(State::default()),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> Result<T, RpcError> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        Ok(f(&mut state))
    }

    /// Lock for the fixture setters. A poisoned lock is recovered so a setter
    /// never silently skips its change.
    fn fixture(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Restrict `createEstate` to admins. With no admin registered anyone may
    /// create estates.
    pub fn add_admin(&self, address: Address) {
        self.fixture().admins.insert(address);
    }

    /// Credit `amount`, saturating at `u128::MAX`.
    pub fn fund(&self, address: Address, amount: u128) {
        let mut state = self.fixture();
        let balance = state.balances.entry(address).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn set_for_sale(&self, estate_id: u64, for_sale: bool) {
        if let Some(e) = self.fixture().registry.estates.get_mut(estate_id as usize) {
            e.for_sale = for_sale;
        }
    }

    pub fn set_for_rent(&self, estate_id: u64, for_rent: bool) {
        if let Some(e) = self.fixture().registry.estates.get_mut(estate_id as usize) {
            e.for_rent = for_rent;
        }
    }

    /// Make every read of record `index` of `kind` fail.
    pub fn fail_reads_at(&self, kind: RecordKind, index: u64) {
        self.fixture().faults.reads.insert((kind, index));
    }

    pub fn fail_nonce_reads(&self, fail: bool) {
        self.fixture().faults.nonce = fail;
    }

    pub fn fail_fee_reads(&self, fail: bool) {
        self.fixture().faults.fee = fail;
    }

    /// Hashes of accepted transactions, in submission order.
    pub fn submitted(&self) -> Vec<TxHash> {
        self.fixture().submitted.clone()
    }

    /// Answer a getter; `Ok(None)` when `selector` is not one.
    fn read(
        state: &State,
        from: Address,
        selector: [u8; 4],
        mut args: Words<'_>,
    ) -> Result<Option<Vec<u8>>, RpcError> {
        let registry = &state.registry;
        let check_fault = |kind: RecordKind, index: u64| {
            if state.faults.reads.contains(&(kind, index)) {
                Err(RpcError::remote(SERVER_ERROR, format!("injected read failure at {kind} {index}")))
            } else {
                Ok(())
            }
        };

        if selector == abi::selector(functions::ESTATE_COUNT) {
            return Ok(Some(abi::encode(&[Token::Uint(registry.estates.len() as u128)])));
        }
        if selector == abi::selector(functions::PRESENT_COUNT) {
            return Ok(Some(abi::encode(&[Token::Uint(registry.presents.len() as u128)])));
        }
        if selector == abi::selector(functions::IS_ADMIN) {
            return Ok(Some(abi::encode(&[Token::Bool(state.admins.contains(&from))])));
        }
        if selector == abi::selector(functions::GET_ESTATE) {
            let index = args.uint64().map_err(bad_input)?;
            check_fault(RecordKind::Estate, index)?;
            let e = registry.estates.get(index as usize).ok_or_else(out_of_bounds)?;
            return Ok(Some(abi::encode(&[
                Token::Uint(u128::from(e.id)),
                Token::Address(e.owner),
                Token::String(e.info.clone()),
                Token::Uint(e.area),
                Token::Uint(e.usable_area),
                Token::Address(e.renter.unwrap_or(Address::ZERO)),
            ])));
        }
        if selector == abi::selector(functions::GET_ESTATE_STATUSES) {
            let index = args.uint64().map_err(bad_input)?;
            check_fault(RecordKind::Estate, index)?;
            let e = registry.estates.get(index as usize).ok_or_else(out_of_bounds)?;
            return Ok(Some(abi::encode(&[
                Token::Bool(e.presented),
                Token::Bool(e.for_sale),
                Token::Bool(e.for_rent),
            ])));
        }
        if selector == abi::selector(functions::GET_PRESENT) {
            let index = args.uint64().map_err(bad_input)?;
            check_fault(RecordKind::Present, index)?;
            let p = registry.presents.get(index as usize).ok_or_else(out_of_bounds)?;
            return Ok(Some(abi::encode(&[
                Token::Uint(u128::from(p.estate_id)),
                Token::Address(p.from),
                Token::Address(p.to),
                Token::Bool(p.finished),
            ])));
        }
        Ok(None)
    }

    fn execute(
        registry: &mut Registry,
        admins: &HashSet<Address>,
        from: Address,
        selector: [u8; 4],
        mut args: Words<'_>,
    ) -> Result<(), RpcError> {
        if selector == abi::selector(functions::CREATE_ESTATE) {
            let owner = args.address().map_err(bad_input)?;
            let info = args.string().map_err(bad_input)?;
            let area = args.uint().map_err(bad_input)?;
            let usable_area = args.uint().map_err(bad_input)?;
            ensure(admins.is_empty() || admins.contains(&from), "only admin")?;
            ensure(usable_area <= area, "usable area exceeds area")?;
            let id = registry.estates.len() as u64;
            registry.estates.push(Estate {
                id,
                owner,
                info,
                area,
                usable_area,
                renter: None,
                presented: false,
                for_sale: false,
                for_rent: false,
            });
            return Ok(());
        }

        if selector == abi::selector(functions::CREATE_PRESENT) {
            let estate_id = args.uint64().map_err(bad_input)?;
            let to = args.address().map_err(bad_input)?;
            let estate = registry
                .estates
                .get_mut(estate_id as usize)
                .ok_or_else(|| revert("estate does not exist"))?;
            ensure(estate.owner == from, "not the owner")?;
            ensure(!estate.presented, "estate already presented")?;
            ensure(!to.is_zero(), "invalid recipient")?;
            estate.presented = true;
            let id = registry.presents.len() as u64;
            registry.presents.push(Present {
                id,
                estate_id,
                from,
                to,
                finished: false,
            });
            return Ok(());
        }

        if selector == abi::selector(functions::CANCEL_PRESENT)
            || selector == abi::selector(functions::CONFIRM_PRESENT)
        {
            let confirm = selector == abi::selector(functions::CONFIRM_PRESENT);
            let id = args.uint64().map_err(bad_input)?;
            let present = registry
                .presents
                .get_mut(id as usize)
                .ok_or_else(|| revert("present does not exist"))?;
            ensure(!present.finished, "present already finished")?;
            if confirm {
                ensure(present.to == from, "not the recipient")?;
            } else {
                ensure(present.from == from, "not the sender")?;
            }
            present.finished = true;
            let (estate_id, to) = (present.estate_id, present.to);
            if let Some(estate) = registry.estates.get_mut(estate_id as usize) {
                estate.presented = false;
                if confirm {
                    estate.owner = to;
                }
            }
            return Ok(());
        }

        if selector == abi::selector(functions::CANCEL_SALE)
            || selector == abi::selector(functions::CANCEL_RENT)
        {
            let sale = selector == abi::selector(functions::CANCEL_SALE);
            let estate_id = args.uint64().map_err(bad_input)?;
            let estate = registry
                .estates
                .get_mut(estate_id as usize)
                .ok_or_else(|| revert("estate does not exist"))?;
            ensure(estate.owner == from, "not the owner")?;
            if sale {
                ensure(estate.for_sale, "estate is not for sale")?;
                estate.for_sale = false;
            } else {
                ensure(estate.for_rent, "estate is not for rent")?;
                estate.for_rent = false;
                estate.renter = None;
            }
            return Ok(());
        }

        Err(revert("unknown function selector"))
    }
}

#[async_trait]
impl LedgerConnection for InMemoryLedger {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.chain_id)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        self.with_state(|s| {
            if s.faults.nonce {
                return Err(RpcError::remote(SERVER_ERROR, "injected nonce read failure"));
            }
            Ok(s.nonces.get(&address).copied().unwrap_or(0))
        })?
    }

    async fn suggest_fee_rate(&self) -> Result<FeeRate, RpcError> {
        self.with_state(|s| {
            if s.faults.fee {
                return Err(RpcError::remote(SERVER_ERROR, "injected fee read failure"));
            }
            Ok(self.fee_rate)
        })?
    }

    async fn balance_of(&self, address: Address) -> Result<u128, RpcError> {
        self.with_state(|s| s.balances.get(&address).copied().unwrap_or(0))
    }

    async fn code_at(&self, address: Address) -> Result<Vec<u8>, RpcError> {
        if address == self.contract {
            // Any non-empty bytecode marks a deployed contract.
            Ok(vec![0x60, 0x80, 0x60, 0x40])
        } else {
            Ok(Vec::new())
        }
    }

    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, RpcError> {
        if request.to != self.contract {
            return Ok(Vec::new());
        }
        let (selector, args) = split_call(&request.data).map_err(bad_input)?;
        let from = request.from.unwrap_or(Address::ZERO);

        self.with_state(|s| match Self::read(s, from, selector, args.clone())? {
            Some(output) => Ok(output),
            None => {
                // Not a getter: simulate the write on a scratch copy.
                let mut scratch = s.registry.clone();
                Self::execute(&mut scratch, &s.admins, from, selector, args).map(|()| Vec::new())
            }
        })?
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, RpcError> {
        let request = &tx.request;
        if request.chain_id != self.chain_id {
            return Err(RpcError::remote(SERVER_ERROR, "invalid chain id for signer"));
        }
        if request.to != self.contract {
            return Err(RpcError::remote(SERVER_ERROR, "no contract code at target address"));
        }
        let (selector, args) = split_call(&request.data).map_err(bad_input)?;

        self.with_state(|s| {
            let expected = s.nonces.get(&tx.from).copied().unwrap_or(0);
            if request.nonce < expected {
                return Err(RpcError::remote(SERVER_ERROR, "nonce too low"));
            }
            if request.nonce > expected {
                return Err(RpcError::remote(SERVER_ERROR, "nonce too high"));
            }

            // All-or-nothing: run against a copy, then commit.
            let mut next = s.registry.clone();
            Self::execute(&mut next, &s.admins, tx.from, selector, args)?;
            s.registry = next;
            s.nonces.insert(tx.from, expected + 1);
            s.submitted.push(tx.hash);
            Ok(tx.hash)
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionRequest;
    use realty_identity::load_identity;

    fn contract() -> Address {
        Address::from_bytes([0xc0; 20])
    }

    fn create_estate_tx(nonce: u64, chain_id: u64) -> SignedTransaction {
        let identity = load_identity(&"46".repeat(32)).unwrap();
        TransactionRequest {
            nonce,
            fee_rate: FeeRate::new(1),
            gas_limit: 100_000,
            to: contract(),
            value: 0,
            data: abi::encode_call(
                functions::CREATE_ESTATE,
                &[
                    Token::Address(identity.address()),
                    Token::String("flat".into()),
                    Token::Uint(10),
                    Token::Uint(5),
                ],
            ),
            chain_id,
        }
        .sign(&identity)
        .unwrap()
    }

    #[tokio::test]
    async fn submissions_must_carry_the_next_nonce() {
        let ledger = InMemoryLedger::new(contract());

        let early = ledger.submit(&create_estate_tx(1, IN_MEMORY_CHAIN_ID)).await;
        assert_eq!(early, Err(RpcError::remote(SERVER_ERROR, "nonce too high")));

        let tx = create_estate_tx(0, IN_MEMORY_CHAIN_ID);
        assert_eq!(ledger.submit(&tx).await, Ok(tx.hash));

        let replay = ledger.submit(&tx).await;
        assert_eq!(replay, Err(RpcError::remote(SERVER_ERROR, "nonce too low")));
        assert_eq!(ledger.pending_nonce(tx.from).await, Ok(1));
        assert_eq!(ledger.submitted(), vec![tx.hash]);
    }

    #[tokio::test]
    async fn foreign_chain_ids_are_rejected() {
        let ledger = InMemoryLedger::new(contract());
        let err = ledger.submit(&create_estate_tx(0, 1)).await.unwrap_err();
        assert_eq!(err, RpcError::remote(SERVER_ERROR, "invalid chain id for signer"));
    }

    #[tokio::test]
    async fn out_of_range_getters_panic_like_the_contract() {
        let ledger = InMemoryLedger::new(contract());
        let err = ledger
            .call(&CallRequest {
                from: None,
                to: contract(),
                data: abi::encode_call(functions::GET_PRESENT, &[Token::Uint(0)]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.revert(), Some(Revert::Panic(PANIC_ARRAY_OUT_OF_BOUNDS)));
    }

    #[tokio::test]
    async fn calls_simulate_writes_without_committing() {
        let ledger = InMemoryLedger::new(contract());
        let tx = create_estate_tx(0, IN_MEMORY_CHAIN_ID);
        let simulated = ledger
            .call(&CallRequest {
                from: Some(tx.from),
                to: contract(),
                data: tx.request.data.clone(),
            })
            .await;
        assert_eq!(simulated, Ok(Vec::new()));

        let count = ledger
            .call(&CallRequest {
                from: None,
                to: contract(),
                data: abi::encode_call(functions::ESTATE_COUNT, &[]),
            })
            .await
            .unwrap();
        assert_eq!(Words::new(&count).uint(), Ok(0));
    }

    #[tokio::test]
    async fn funding_saturates_instead_of_overflowing() {
        let ledger = InMemoryLedger::new(contract());
        let who = Address::from_bytes([0x11; 20]);
        ledger.fund(who, u128::MAX - 1);
        ledger.fund(who, 10);
        assert_eq!(ledger.balance_of(who).await, Ok(u128::MAX));
    }

    #[tokio::test]
    async fn fault_setters_apply_after_a_poisoned_lock() {
        let ledger = std::sync::Arc::new(InMemoryLedger::new(contract()));
        let poisoner = ledger.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.lock().unwrap();
            panic!("poison the ledger lock");
        })
        .join();
        assert!(ledger.state.is_poisoned());

        ledger.fail_nonce_reads(true);
        assert!(ledger.fixture().faults.nonce);
    }
}
