//! Visibility filters applied while enumerating records.

use core::str::FromStr;

use crate::error::LedgerError;
use crate::id::Address;
use crate::record::LedgerRecord;

/// Which records a listing keeps.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    /// Records involving the viewing identity.
    Mine,
    /// Records involving the given address.
    ByAddress(Address),
}

impl RecordFilter {
    /// Whether `record` passes this filter when viewed by `viewer`.
    ///
    /// Inactive records (finished presents) never pass.
    pub fn admits<R: LedgerRecord>(&self, record: &R, viewer: &Address) -> bool {
        if !record.is_active() {
            return false;
        }
        match self {
            RecordFilter::All => true,
            RecordFilter::Mine => record.involves(viewer),
            RecordFilter::ByAddress(address) => record.involves(address),
        }
    }
}

impl FromStr for RecordFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RecordFilter::All);
        }
        if s.eq_ignore_ascii_case("mine") || s.eq_ignore_ascii_case("my") {
            return Ok(RecordFilter::Mine);
        }
        s.parse::<Address>().map(RecordFilter::ByAddress).map_err(|_| {
            LedgerError::validation(format!("filter must be 'all', 'mine' or an address, got '{s}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Estate, Present};

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn estate(owner: Address) -> Estate {
        Estate {
            id: 0,
            owner,
            info: String::new(),
            area: 1,
            usable_area: 1,
            renter: None,
            presented: false,
            for_sale: false,
            for_rent: false,
        }
    }

    #[test]
    fn parses_keywords_and_addresses() {
        assert_eq!("all".parse::<RecordFilter>().unwrap(), RecordFilter::All);
        assert_eq!("my".parse::<RecordFilter>().unwrap(), RecordFilter::Mine);
        assert_eq!("mine".parse::<RecordFilter>().unwrap(), RecordFilter::Mine);
        assert_eq!("ALL".parse::<RecordFilter>().unwrap(), RecordFilter::All);
        assert_eq!(" Mine ".parse::<RecordFilter>().unwrap(), RecordFilter::Mine);

        let upper = format!("0x{}", "AB".repeat(20));
        assert_eq!(
            upper.parse::<RecordFilter>().unwrap(),
            RecordFilter::ByAddress(addr(0xab))
        );
        assert!(matches!(
            "everything".parse::<RecordFilter>(),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn mine_and_by_address_match_owner() {
        let e = estate(addr(1));
        assert!(RecordFilter::All.admits(&e, &addr(9)));
        assert!(RecordFilter::Mine.admits(&e, &addr(1)));
        assert!(!RecordFilter::Mine.admits(&e, &addr(2)));
        assert!(RecordFilter::ByAddress(addr(1)).admits(&e, &addr(2)));
    }

    #[test]
    fn finished_presents_never_pass() {
        let p = Present {
            id: 0,
            estate_id: 0,
            from: addr(1),
            to: addr(2),
            finished: true,
        };
        for filter in [
            RecordFilter::All,
            RecordFilter::Mine,
            RecordFilter::ByAddress(addr(2)),
        ] {
            assert!(!filter.admits(&p, &addr(1)));
        }
    }
}
