//! Numeric value objects and decimal input parsing.
//!
//! Areas, balances and fee rates are carried as `u128`, indices and nonces as
//! `u64`. Text input is parsed strictly: digits only, no sign, no overflow.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Price of one unit of gas, in the ledger's smallest currency unit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u128);

impl FeeRate {
    pub const fn new(per_gas: u128) -> Self {
        Self(per_gas)
    }

    pub fn per_gas(&self) -> u128 {
        self.0
    }
}

impl core::fmt::Display for FeeRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn digits<'a>(field: &str, raw: &'a str) -> LedgerResult<&'a str> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(LedgerError::validation(format!("{field}: value is empty")));
    }
    if s.starts_with('-') {
        return Err(LedgerError::validation(format!("{field}: must not be negative")));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::validation(format!("{field}: '{s}' is not a decimal integer")));
    }
    Ok(s)
}

/// Parse a non-negative decimal quantity (areas, amounts).
pub fn parse_quantity(field: &str, raw: &str) -> LedgerResult<u128> {
    digits(field, raw)?
        .parse::<u128>()
        .map_err(|_| LedgerError::validation(format!("{field}: value out of range")))
}

/// Parse a record index.
pub fn parse_index(field: &str, raw: &str) -> LedgerResult<u64> {
    digits(field, raw)?
        .parse::<u64>()
        .map_err(|_| LedgerError::validation(format!("{field}: value out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_plain_decimal() {
        assert_eq!(parse_quantity("area", "100").unwrap(), 100);
        assert_eq!(parse_quantity("area", " 0 ").unwrap(), 0);
        assert_eq!(parse_index("id", "42").unwrap(), 42);
    }

    #[test]
    fn rejects_signs_and_garbage() {
        for bad in ["", "   ", "-1", "+1", "1.5", "ten", "0x10", "1 000"] {
            let err = parse_quantity("area", bad).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)), "{bad:?} -> {err:?}");
        }
    }

    #[test]
    fn rejects_overflow() {
        let too_big = "340282366920938463463374607431768211456"; // u128::MAX + 1
        assert!(parse_quantity("area", too_big).is_err());
        assert!(parse_index("id", "18446744073709551616").is_err());
    }

    proptest! {
        #[test]
        fn any_u128_parses_back(v in any::<u128>()) {
            prop_assert_eq!(parse_quantity("area", &v.to_string()).unwrap(), v);
        }
    }
}
