//! NOEMI-format GHS pricing file parser: fixed 128-byte lines, a one-line
//! magic header, then `"110"` body records carrying a GHS code, sector,
//! start date and per-sector cent amounts at fixed byte offsets.

use drg_schemas::{Date, GhsCode};

use crate::error::{PricingError, Result};

/// Set when a sector's below-threshold adjustment applies `exb_cents` once,
/// rather than once per day under the threshold. Never set by
/// [`parse_ghs_pricings`] today — no loaded pricing file in this format
/// carries the bit — but resolvers should still honor it if some future
/// source sets it directly on a [`GhsPricing`].
pub const FLAG_EXB_ONCE: u8 = 1;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorPricing {
    pub price_cents: i64,
    pub exh_cents: i64,
    pub exb_cents: i64,
}

/// One GHS's price over a `[from, to)` validity interval. `to` is the next
/// record's `from` for the same GHS, or the day-offset `u16::MAX` sentinel
/// for the last one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhsPricing {
    pub ghs: GhsCode,
    pub limit_dates: (Date, Date),
    pub sectors: [SectorPricing; 2],
    pub flags: u8,
}

const MAGIC: &[u8] = b"000AM00000001000000TABGHSCT00000001000000GHX000NXGHS";
const LINE_LEN: usize = 128;

fn digits(line: &[u8], range: std::ops::Range<usize>) -> Option<i64> {
    let slice = line.get(range)?;
    if slice.is_empty() || !slice.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(slice).ok()?.parse().ok()
}

/// Parse and merge every `"110"` record in `file_data` into one
/// chronologically-chained pricing interval list per GHS.
pub fn parse_ghs_pricings(file_data: &[u8]) -> Result<Vec<GhsPricing>> {
    let mut lines = file_data
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line));

    let header = lines.next().unwrap_or(&[]);
    if header.len() != LINE_LEN {
        return Err(PricingError::BadHeaderLength { found: header.len() });
    }
    if &header[..MAGIC.len()] != MAGIC {
        return Err(PricingError::BadMagic);
    }

    let end_sentinel = Date::from_days_since_1980(u16::MAX);
    let mut raw: Vec<GhsPricing> = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.len() != LINE_LEN {
            return Err(PricingError::BadLineLength { found: line.len() });
        }
        if &line[0..3] != b"110" {
            continue;
        }

        let ghs_code = digits(line, 7..11).ok_or(PricingError::MalformedRecord)?;
        let sector = digits(line, 11..12).ok_or(PricingError::MalformedRecord)?;
        let price = digits(line, 21..29).ok_or(PricingError::MalformedRecord)?;
        let exh = digits(line, 30..38).ok_or(PricingError::MalformedRecord)?;
        let year = digits(line, 88..92).ok_or(PricingError::MalformedRecord)?;
        let month = digits(line, 92..94).ok_or(PricingError::MalformedRecord)?;
        let day = digits(line, 94..96).ok_or(PricingError::MalformedRecord)?;
        let exb = digits(line, 97..105).ok_or(PricingError::MalformedRecord)?;

        if !(1..=2).contains(&sector) {
            return Err(PricingError::BadSector { found: sector as u8 });
        }
        let sector = (sector - 1) as usize;

        let start = Date::new(year as i16, month as i8, day as i8);
        if !start.is_valid() {
            return Err(PricingError::InvalidStartDate);
        }

        let mut sectors = [SectorPricing::default(); 2];
        sectors[sector] = SectorPricing { price_cents: price, exh_cents: exh, exb_cents: exb };

        raw.push(GhsPricing {
            ghs: GhsCode(ghs_code as u16),
            limit_dates: (start, end_sentinel),
            sectors,
            flags: 0,
        });
    }

    raw.sort_by_key(|p| (p.ghs.0, p.limit_dates.0));

    let mut merged: Vec<GhsPricing> = Vec::with_capacity(raw.len());
    for pricing in raw {
        match merged.last_mut() {
            Some(prev) if prev.ghs == pricing.ghs && prev.limit_dates.0 == pricing.limit_dates.0 => {
                // Same GHS, same start date: a second line filling in the
                // sector the first one left zeroed.
                if pricing.sectors[0].price_cents != 0 {
                    prev.sectors[0] = pricing.sectors[0];
                } else if pricing.sectors[1].price_cents != 0 {
                    prev.sectors[1] = pricing.sectors[1];
                }
            }
            Some(prev) if prev.ghs == pricing.ghs => {
                let mut next = pricing;
                prev.limit_dates.1 = next.limit_dates.0;
                if next.sectors[0].price_cents == 0 {
                    next.sectors[0] = prev.sectors[0];
                }
                if next.sectors[1].price_cents == 0 {
                    next.sectors[1] = prev.sectors[1];
                }
                merged.push(next);
            }
            _ => merged.push(pricing),
        }
    }

    Ok(merged)
}
