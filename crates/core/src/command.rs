//! Validated inputs for ledger write operations.

use core::str::FromStr;

use crate::amount::parse_quantity;
use crate::error::{LedgerError, LedgerResult};
use crate::id::Address;

/// Kind of in-flight offer a cancel targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CancelKind {
    Present,
    Sale,
    Rent,
}

impl CancelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelKind::Present => "present",
            CancelKind::Sale => "sale",
            CancelKind::Rent => "rent",
        }
    }
}

impl core::fmt::Display for CancelKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CancelKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "present" => Ok(CancelKind::Present),
            "sale" => Ok(CancelKind::Sale),
            "rent" => Ok(CancelKind::Rent),
            other => Err(LedgerError::validation(format!(
                "cancel kind must be one of: present, sale, rent (got '{other}')"
            ))),
        }
    }
}

/// A new estate, checked locally before it is submitted.
///
/// Areas must be non-negative integers. Whether `usable_area <= area` is left
/// to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstateDraft {
    pub owner: Address,
    pub info: String,
    pub area: u128,
    pub usable_area: u128,
}

impl EstateDraft {
    pub fn parse(
        owner: Address,
        info: impl Into<String>,
        area: &str,
        usable_area: &str,
    ) -> LedgerResult<Self> {
        Ok(Self {
            owner,
            info: info.into(),
            area: parse_quantity("area", area)?,
            usable_area: parse_quantity("usableArea", usable_area)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_kind_parses_known_tags_only() {
        assert_eq!("present".parse::<CancelKind>().unwrap(), CancelKind::Present);
        assert_eq!("SALE".parse::<CancelKind>().unwrap(), CancelKind::Sale);
        assert_eq!("rent".parse::<CancelKind>().unwrap(), CancelKind::Rent);
        assert!(matches!(
            "lease".parse::<CancelKind>(),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn draft_rejects_bad_areas() {
        let owner = Address::from_bytes([1; 20]);
        assert!(EstateDraft::parse(owner, "x", "100", "80").is_ok());
        assert!(EstateDraft::parse(owner, "x", "-100", "80").is_err());
        assert!(EstateDraft::parse(owner, "x", "100", "eighty").is_err());
    }

    #[test]
    fn draft_leaves_area_ordering_to_the_ledger() {
        let owner = Address::from_bytes([1; 20]);
        let draft = EstateDraft::parse(owner, "x", "10", "80").unwrap();
        assert_eq!((draft.area, draft.usable_area), (10, 80));
    }
}
