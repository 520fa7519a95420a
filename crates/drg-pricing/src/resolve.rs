//! Turning a resolved [`GhsPricing`] interval and the eligibility table's
//! length-of-stay thresholds into a cents amount for one stay.

use drg_schemas::{Date, GhsCode};
use drg_tables::GhsInfo;

use crate::parse::{GhsPricing, FLAG_EXB_ONCE};

/// Find the pricing interval covering `date` for `ghs`, if any.
pub fn find_pricing(pricings: &[GhsPricing], ghs: GhsCode, date: Date) -> Option<&GhsPricing> {
    pricings
        .iter()
        .find(|p| p.ghs == ghs && date >= p.limit_dates.0 && date < p.limit_dates.1)
}

/// Apply the exh/exb length-of-stay adjustment to a sector's base price.
///
/// `exh_threshold` of `0` disables the high-duration adjustment; likewise
/// `exb_threshold` of `0` disables the low-duration one. Both thresholds can
/// apply in principle but never the same stay, since a stay's duration can't
/// be simultaneously above a high threshold and below a low one.
pub fn compute_price(
    base_cents: i64,
    exh_cents: i64,
    exb_cents: i64,
    exh_threshold: u16,
    exb_threshold: u16,
    flags: u8,
    duration: i64,
) -> i64 {
    if exh_threshold != 0 && duration > exh_threshold as i64 {
        base_cents + (duration - exh_threshold as i64) * exh_cents
    } else if exb_threshold != 0 && duration < exb_threshold as i64 {
        if flags & FLAG_EXB_ONCE != 0 {
            base_cents + exb_cents
        } else {
            base_cents + (exb_threshold as i64 - duration) * exb_cents
        }
    } else {
        base_cents
    }
}

/// Resolve the full price for one stay: find the pricing interval for
/// `ghs_info`'s GHS number on `sector`, then apply its length-of-stay
/// adjustment using `ghs_info`'s thresholds.
pub fn resolve_price(
    pricings: &[GhsPricing],
    ghs_info: &GhsInfo,
    sector: usize,
    date: Date,
    duration: i64,
) -> Option<i64> {
    let ghs = GhsCode(ghs_info.ghs[sector]);
    if !ghs.is_valid() {
        return None;
    }
    let pricing = find_pricing(pricings, ghs, date)?;
    let sector_pricing = &pricing.sectors[sector];
    Some(compute_price(
        sector_pricing.price_cents,
        sector_pricing.exh_cents,
        sector_pricing.exb_cents,
        ghs_info.exh_threshold[sector],
        ghs_info.exb_threshold[sector],
        pricing.flags,
        duration,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::SectorPricing;

    fn pricing(ghs: u16, from: Date, to: Date, price: i64, exh: i64, exb: i64) -> GhsPricing {
        GhsPricing {
            ghs: GhsCode(ghs),
            limit_dates: (from, to),
            sectors: [SectorPricing { price_cents: price, exh_cents: exh, exb_cents: exb }, SectorPricing::default()],
            flags: 0,
        }
    }

    #[test]
    fn flat_price_within_thresholds() {
        assert_eq!(compute_price(10000, 500, 300, 10, 2, 0, 5), 10000);
    }

    #[test]
    fn exh_adjustment_applies_past_high_threshold() {
        assert_eq!(compute_price(10000, 500, 300, 10, 2, 0, 13), 10000 + 3 * 500);
    }

    #[test]
    fn exb_adjustment_applies_below_low_threshold() {
        assert_eq!(compute_price(10000, 500, 300, 10, 4, 0, 2), 10000 + 2 * 300);
    }

    #[test]
    fn exb_once_flag_applies_flat_amount() {
        assert_eq!(compute_price(10000, 500, 300, 10, 4, FLAG_EXB_ONCE, 2), 10000 + 300);
    }

    #[test]
    fn find_pricing_picks_the_covering_interval() {
        let pricings = vec![
            pricing(145, Date::new(2024, 1, 1), Date::new(2024, 6, 1), 10000, 0, 0),
            pricing(145, Date::new(2024, 6, 1), Date::from_days_since_1980(u16::MAX), 12000, 0, 0),
        ];
        let found = find_pricing(&pricings, GhsCode(145), Date::new(2024, 7, 1)).unwrap();
        assert_eq!(found.sectors[0].price_cents, 12000);
        assert!(find_pricing(&pricings, GhsCode(145), Date::new(2023, 1, 1)).is_none());
    }
}
