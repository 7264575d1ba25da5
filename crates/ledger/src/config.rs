//! Bootstrap configuration for the ledger client.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use realty_core::Address;

use crate::authorization::DEFAULT_GAS_LIMIT;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7545";
pub const DEFAULT_CONTRACT_ADDRESS_FILE: &str = "contract.address";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Endpoint value that selects the in-memory ledger.
pub const MEMORY_ENDPOINT: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("reading contract address from {path}: {source}")]
    AddressFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the ledger is and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub endpoint: String,
    pub contract: Address,
    pub timeout: Duration,
    pub gas_limit: u64,
    /// Overrides the chain id reported by the node.
    pub chain_id: Option<u64>,
}

impl LedgerConfig {
    pub fn new(endpoint: impl Into<String>, contract: Address) -> Self {
        Self {
            endpoint: endpoint.into(),
            contract,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            gas_limit: DEFAULT_GAS_LIMIT,
            chain_id: None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.endpoint == MEMORY_ENDPOINT
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source.
    ///
    /// The contract address comes from `REALTY_CONTRACT_ADDRESS`, or else from
    /// the file named by `REALTY_CONTRACT_ADDRESS_FILE`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup("REALTY_LEDGER_ENDPOINT").unwrap_or_else(|| {
            tracing::warn!("REALTY_LEDGER_ENDPOINT not set, defaulting to {DEFAULT_ENDPOINT}");
            DEFAULT_ENDPOINT.to_string()
        });

        let contract = match lookup("REALTY_CONTRACT_ADDRESS") {
            Some(raw) => parse_address("REALTY_CONTRACT_ADDRESS", &raw)?,
            None => {
                let path = PathBuf::from(
                    lookup("REALTY_CONTRACT_ADDRESS_FILE")
                        .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS_FILE.to_string()),
                );
                let raw = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::AddressFile { path, source })?;
                parse_address("REALTY_CONTRACT_ADDRESS_FILE", &raw)?
            }
        };

        let timeout_secs = parse_number("REALTY_LEDGER_TIMEOUT_SECS", lookup("REALTY_LEDGER_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REALTY_LEDGER_TIMEOUT_SECS",
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            endpoint,
            contract,
            timeout: Duration::from_secs(timeout_secs),
            gas_limit: parse_number("REALTY_GAS_LIMIT", lookup("REALTY_GAS_LIMIT"))?
                .unwrap_or(DEFAULT_GAS_LIMIT),
            chain_id: parse_number("REALTY_CHAIN_ID", lookup("REALTY_CHAIN_ID"))?,
        })
    }
}

fn parse_address(var: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{e}"),
    })
}

fn parse_number(var: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|v| {
        v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("'{v}': {e}"),
        })
    })
    .transpose()
}
