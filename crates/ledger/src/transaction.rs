//! Legacy transaction envelope with EIP-155 replay protection.

use serde::Serialize;

use realty_core::{Address, FeeRate, LedgerResult, TxHash, keccak256};
use realty_identity::{Identity, RecoverableSignature};

use crate::rlp::RlpList;

/// An unsigned contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub nonce: u64,
    pub fee_rate: FeeRate,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// A transaction signed by `from`, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub request: TransactionRequest,
    pub from: Address,
    pub signature: RecoverableSignature,
    /// RLP envelope as broadcast to the node.
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

/// What the caller gets back once the ledger accepted a transaction.
///
/// Acceptance is not finality; nothing here tracks confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHandle {
    pub hash: TxHash,
    pub nonce: u64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRequest {
    fn fields(&self, list: &mut RlpList) {
        list.uint(u128::from(self.nonce))
            .uint(self.fee_rate.per_gas())
            .uint(u128::from(self.gas_limit))
            .bytes(self.to.as_bytes())
            .uint(self.value)
            .bytes(&self.data);
    }

    /// RLP of `[nonce, gasPrice, gas, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut list = RlpList::new();
        self.fields(&mut list);
        list.uint(u128::from(self.chain_id)).uint(0).uint(0);
        list.finish()
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    pub fn sign(self, identity: &Identity) -> LedgerResult<SignedTransaction> {
        let signature = identity.sign_prehash(&self.signing_hash())?;
        let v = u128::from(signature.recovery_id) + 35 + 2 * u128::from(self.chain_id);

        let mut list = RlpList::new();
        self.fields(&mut list);
        list.uint(v).scalar(&signature.r).scalar(&signature.s);
        let raw = list.finish();
        let hash = TxHash::from_bytes(keccak256(&raw));

        Ok(SignedTransaction {
            request: self,
            from: identity.address(),
            signature,
            raw,
            hash,
        })
    }
}
