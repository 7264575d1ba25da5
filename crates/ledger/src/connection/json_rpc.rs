use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use realty_core::{Address, FeeRate, TxHash};

use super::r#trait::{CallRequest, LedgerConnection, RpcError};
use crate::transaction::SignedTransaction;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// JSON-RPC 2.0 client for an Ethereum-compatible node over HTTP.
#[derive(Debug)]
pub struct JsonRpcConnection {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcConnection {
    /// Build a client; `timeout` bounds every round trip.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("http client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "rpc request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Transport(format!("{method}: timed out"))
                } else {
                    RpcError::Transport(format!("{method}: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RpcError::Transport(format!("{method}: HTTP {status} {text}")));
        }

        let envelope: RpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| RpcError::Malformed(format!("{method}: {e}")))?;

        if let Some(err) = envelope.error {
            let data = match err.data {
                Some(Value::String(s)) => parse_data(&s).ok(),
                _ => None,
            };
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
                data,
            });
        }

        envelope
            .result
            .ok_or_else(|| RpcError::Malformed(format!("{method}: missing result")))
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub(crate) fn parse_quantity(s: &str) -> Result<u128, RpcError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Malformed(format!("quantity without 0x prefix: {s}")))?;
    if digits.is_empty() {
        return Err(RpcError::Malformed("empty quantity".into()));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Malformed(format!("quantity {s}: {e}")))
}

/// Parse `0x`-prefixed hex data.
pub(crate) fn parse_data(s: &str) -> Result<Vec<u8>, RpcError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| RpcError::Malformed(format!("data: {e}")))
}

fn to_u64(v: u128, what: &str) -> Result<u64, RpcError> {
    u64::try_from(v).map_err(|_| RpcError::Malformed(format!("{what} {v} exceeds 64 bits")))
}

fn data_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[async_trait]
impl LedgerConnection for JsonRpcConnection {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        to_u64(parse_quantity(&raw)?, "chain id")
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        let raw: String = self
            .request("eth_getTransactionCount", json!([address.to_string(), "pending"]))
            .await?;
        to_u64(parse_quantity(&raw)?, "nonce")
    }

    async fn suggest_fee_rate(&self) -> Result<FeeRate, RpcError> {
        let raw: String = self.request("eth_gasPrice", json!([])).await?;
        Ok(FeeRate::new(parse_quantity(&raw)?))
    }

    async fn balance_of(&self, address: Address) -> Result<u128, RpcError> {
        let raw: String = self
            .request("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    async fn code_at(&self, address: Address) -> Result<Vec<u8>, RpcError> {
        let raw: String = self
            .request("eth_getCode", json!([address.to_string(), "latest"]))
            .await?;
        parse_data(&raw)
    }

    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, RpcError> {
        let mut call = json!({
            "to": request.to.to_string(),
            "data": data_hex(&request.data),
        });
        if let Some(from) = request.from {
            call["from"] = json!(from.to_string());
        }
        let raw: String = self.request("eth_call", json!([call, "latest"])).await?;
        parse_data(&raw)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, RpcError> {
        let raw: String = self
            .request("eth_sendRawTransaction", json!([data_hex(&tx.raw)]))
            .await?;
        raw.parse::<TxHash>()
            .map_err(|e| RpcError::Malformed(format!("transaction hash: {e}")))
    }
}
