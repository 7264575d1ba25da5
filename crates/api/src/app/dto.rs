use serde::{Deserialize, Serialize};
use serde_json::Value;

use realty_core::{Address, LedgerError, LedgerResult, RecordFilter};
use realty_ledger::TxHandle;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEstateRequest {
    /// Defaults to the caller.
    pub owner: Option<String>,
    pub info: String,
    /// Number or decimal string.
    pub area: Value,
    pub usable_area: Value,
}

#[derive(Debug, Deserialize)]
pub struct CreatePresentRequest {
    pub recipient: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

impl ListQuery {
    /// Requested filter; `mine` when absent.
    pub fn filter(&self) -> LedgerResult<RecordFilter> {
        match &self.filter {
            Some(raw) => raw.parse(),
            None => Ok(RecordFilter::Mine),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub address: Address,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub address: Address,
    /// Decimal string; balances can exceed what JSON numbers hold exactly.
    pub balance: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub tx: TxHandle,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Decimal text of a JSON quantity, left for `parse_quantity` to judge.
pub fn quantity_text(field: &str, value: &Value) -> LedgerResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(LedgerError::validation(format!(
            "{field} must be a non-negative integer, got {other}"
        ))),
    }
}

pub fn parse_address(field: &str, raw: &str) -> LedgerResult<Address> {
    raw.parse()
        .map_err(|_| LedgerError::validation(format!("{field} is not an address: '{raw}'")))
}
