//! Identity derivation from a hex-encoded secp256k1 secret.

use k256::ecdsa::SigningKey;

use realty_core::{Address, LedgerError, LedgerResult};

/// A signing identity: secret key plus the address derived from it.
///
/// The address is a pure function of the secret. Identities are never
/// mutated; re-authenticating builds a new one.
#[derive(Clone)]
pub struct Identity {
    key: SigningKey,
    address: Address,
}

/// `r || s` plus the recovery bit, as produced over a 32-byte prehash.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

/// Build an [`Identity`] from a hex secret (optionally `0x`-prefixed).
///
/// Fails with [`LedgerError::InvalidSecret`] on malformed hex, wrong length,
/// or a value that is not a valid private key (zero, or not below the curve
/// order).
pub fn load_identity(secret: &str) -> LedgerResult<Identity> {
    let trimmed = secret.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 64 {
        return Err(LedgerError::invalid_secret(format!(
            "expected 64 hex digits, got {}",
            digits.len()
        )));
    }

    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|e| LedgerError::invalid_secret(e.to_string()))?;

    let key = SigningKey::from_slice(&bytes)
        .map_err(|_| LedgerError::invalid_secret("not a valid secp256k1 private key"))?;
    bytes.fill(0);

    let identity = Identity::from_signing_key(key);
    tracing::debug!(address = %identity.address, "identity loaded");
    Ok(identity)
}

impl Identity {
    fn from_signing_key(key: SigningKey) -> Self {
        let point = key.verifying_key().to_encoded_point(false);
        let mut public = [0u8; 64];
        // Uncompressed SEC1: 0x04 || X || Y.
        public.copy_from_slice(&point.as_bytes()[1..]);
        let address = Address::from_public_key(&public);
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash (deterministic, RFC 6979, low-s).
    pub fn sign_prehash(&self, prehash: &[u8; 32]) -> LedgerResult<RecoverableSignature> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| LedgerError::submit(format!("signing failed: {e}")))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.key == other.key
    }
}

impl Eq for Identity {}

impl core::fmt::Debug for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}
