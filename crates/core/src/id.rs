//! Strongly-typed ledger identifiers (account addresses, transaction hashes).

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::LedgerError;

/// Keccak-256 digest, the ledger's hash function.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A 20-byte account address.
///
/// Rendered in the EIP-55 checksummed form. Parsing is case-insensitive and
/// does not enforce the checksum, so two spellings of the same address compare
/// equal.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

/// A 32-byte transaction identifier.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

macro_rules! impl_fixed_bytes {
    ($t:ident, $len:literal, $name:literal) => {
        impl $t {
            pub const LEN: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Build from a slice, failing unless it has exactly the right length.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, LedgerError> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| {
                    LedgerError::validation(format!(
                        "{}: expected {} bytes, got {}",
                        $name,
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(arr))
            }
        }

        impl From<[u8; $len]> for $t {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl From<$t> for [u8; $len] {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::fmt::Debug for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", $name, self)
            }
        }

        impl FromStr for $t {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                if digits.len() != $len * 2 {
                    return Err(LedgerError::validation(format!(
                        "{}: expected {} hex digits, got {}",
                        $name,
                        $len * 2,
                        digits.len()
                    )));
                }
                let mut out = [0u8; $len];
                hex::decode_to_slice(digits, &mut out)
                    .map_err(|e| LedgerError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(out))
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_fixed_bytes!(Address, 20, "Address");
impl_fixed_bytes!(TxHash, 32, "TxHash");

impl Address {
    /// The all-zero address, used by the ledger for "nobody".
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Derive the address owning an uncompressed secp256k1 public key
    /// (64 bytes, without the `0x04` tag).
    pub fn from_public_key(uncompressed: &[u8; 64]) -> Self {
        let digest = keccak256(uncompressed);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Self(out)
    }

    /// EIP-55 checksummed hex, `0x`-prefixed.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl core::fmt::Display for TxHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
