//! Ledger client error model.

use thiserror::Error;

use crate::record::RecordKind;

/// Result type used across the ledger client.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Client-level error.
///
/// Every variant is recoverable from the caller's point of view: none of them
/// touches session state, and none is retried by the client itself. Messages
/// that originate on the ledger are carried verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Identity material could not be turned into a key pair.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    /// The ledger endpoint could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// A call against the ledger failed or returned malformed data.
    #[error("read error: {0}")]
    Read(String),

    /// A queried index has no record.
    #[error("{kind} {index} not found")]
    NotFound { kind: RecordKind, index: u64 },

    /// Input rejected locally, before any ledger interaction.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The ledger rejected a transaction.
    #[error("{0}")]
    Submit(String),
}

impl LedgerError {
    pub fn invalid_secret(msg: impl Into<String>) -> Self {
        Self::InvalidSecret(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn submit(msg: impl Into<String>) -> Self {
        Self::Submit(msg.into())
    }

    pub fn not_found(kind: RecordKind, index: u64) -> Self {
        Self::NotFound { kind, index }
    }

    /// Stable machine-readable code, used by front-ends.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSecret(_) => "invalid_secret",
            Self::Connection(_) => "connection_error",
            Self::Read(_) => "read_error",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Submit(_) => "submit_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_error_displays_remote_message_verbatim() {
        let err = LedgerError::submit("execution reverted: present does not exist");
        assert_eq!(err.to_string(), "execution reverted: present does not exist");
        assert_eq!(err.code(), "submit_error");
    }

    #[test]
    fn not_found_names_kind_and_index() {
        let err = LedgerError::not_found(RecordKind::Present, 7);
        assert_eq!(err.to_string(), "present 7 not found");
    }
}
