//! Read-only snapshots of ledger-resident records.
//!
//! A snapshot is a projection of the ledger at the time of the read. It holds
//! no back-reference and is never mutated locally; re-reading is the only way
//! to observe a change.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::Address;

/// Record families exposed by the registry contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Estate,
    Present,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Estate => "estate",
            RecordKind::Present => "present",
        }
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of real estate registered on the ledger.
///
/// `usable_area <= area` is a ledger rule; it is not re-checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estate {
    pub id: u64,
    pub owner: Address,
    pub info: String,
    pub area: u128,
    pub usable_area: u128,
    /// `None` while unrented (the ledger stores the zero address).
    pub renter: Option<Address>,
    pub presented: bool,
    pub for_sale: bool,
    pub for_rent: bool,
}

/// An offer to transfer one estate from `from` to `to`.
///
/// `finished` is terminal: once the ledger sets it, it never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Present {
    pub id: u64,
    pub estate_id: u64,
    pub from: Address,
    pub to: Address,
    pub finished: bool,
}

/// A record family that can be enumerated by ledger index.
pub trait LedgerRecord: Entity<Id = u64> {
    const KIND: RecordKind;

    /// Whether `address` is one of the parties this record is matched on.
    fn involves(&self, address: &Address) -> bool;

    /// Inactive records are hidden from every listing.
    fn is_active(&self) -> bool {
        true
    }
}

impl Entity for Estate {
    type Id = u64;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl LedgerRecord for Estate {
    const KIND: RecordKind = RecordKind::Estate;

    fn involves(&self, address: &Address) -> bool {
        self.owner == *address
    }
}

impl Entity for Present {
    type Id = u64;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl LedgerRecord for Present {
    const KIND: RecordKind = RecordKind::Present;

    fn involves(&self, address: &Address) -> bool {
        self.from == *address || self.to == *address
    }

    fn is_active(&self) -> bool {
        !self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn estate_serializes_with_display_names() {
        let estate = Estate {
            id: 3,
            owner: addr(0x11),
            info: "flat".to_string(),
            area: 100,
            usable_area: 80,
            renter: None,
            presented: false,
            for_sale: true,
            for_rent: false,
        };
        let json = serde_json::to_value(&estate).unwrap();
        assert_eq!(json["usableArea"], 80);
        assert_eq!(json["forSale"], true);
        assert_eq!(json["renter"], serde_json::Value::Null);
        assert_eq!(json["owner"], addr(0x11).to_string());
    }

    #[test]
    fn present_involves_both_endpoints() {
        let p = Present {
            id: 0,
            estate_id: 0,
            from: addr(1),
            to: addr(2),
            finished: false,
        };
        assert!(p.involves(&addr(1)));
        assert!(p.involves(&addr(2)));
        assert!(!p.involves(&addr(3)));
        assert!(p.is_active());
        assert!(!Present { finished: true, ..p.clone() }.is_active());
        assert!(p.same_record(&Present { finished: true, ..p.clone() }));
        assert!(!p.same_record(&Present { id: 1, ..p }));
    }
}
