//! GHS pricing: loading NOEMI-format pricing files and resolving a stay's
//! price from its assigned GHS number, sector, and length of stay.

mod error;
mod parse;
mod resolve;

pub use error::{PricingError, Result};
pub use parse::{parse_ghs_pricings, GhsPricing, SectorPricing, FLAG_EXB_ONCE};
pub use resolve::{compute_price, find_pricing, resolve_price};

use drg_schemas::{Date, GhsCode};

/// An immutable, sorted collection of [`GhsPricing`] intervals loaded from
/// one or more NOEMI pricing files.
#[derive(Clone, Debug, Default)]
pub struct PricingSet {
    pricings: Vec<GhsPricing>,
}

impl PricingSet {
    pub fn load(file_data: &[u8]) -> Result<Self> {
        Ok(Self { pricings: parse_ghs_pricings(file_data)? })
    }

    pub fn find(&self, ghs: GhsCode, date: Date) -> Option<&GhsPricing> {
        find_pricing(&self.pricings, ghs, date)
    }

    pub fn pricings(&self) -> &[GhsPricing] {
        &self.pricings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_finds_nothing() {
        let set = PricingSet::default();
        assert!(set.find(GhsCode(145), Date::new(2024, 1, 1)).is_none());
    }
}
