//! Byte-level builder for NOEMI-format GHS pricing files, matching the
//! fixed 128-byte-line layout `drg_pricing::parse_ghs_pricings` reads.

const LINE_LEN: usize = 128;
const MAGIC: &[u8] = b"000AM00000001000000TABGHSCT00000001000000GHX000NXGHS";

fn pad(mut line: Vec<u8>) -> Vec<u8> {
    line.resize(LINE_LEN, b' ');
    line
}

/// One `"110"` pricing record. `sector` is `1` (public) or `2` (private);
/// `date` is `YYYYMMDD`. Amounts are ASCII-digit cent strings at their
/// fixed column widths, matching `drg_pricing::parse::digits`' ranges.
pub fn pricing_record(ghs: &str, sector: u8, price_cents: &str, exh_cents: &str, date: &str, exb_cents: &str) -> Vec<u8> {
    let mut line = b"110".to_vec();
    line.extend_from_slice(b"    ");
    line.extend_from_slice(ghs.as_bytes());
    line.push(b'0' + sector);
    line.extend_from_slice(&[b' '; 9]);
    line.extend_from_slice(price_cents.as_bytes());
    line.push(b' ');
    line.extend_from_slice(exh_cents.as_bytes());
    line.extend_from_slice(&[b' '; 50]);
    line.extend_from_slice(date.as_bytes());
    line.push(b' ');
    line.extend_from_slice(exb_cents.as_bytes());
    pad(line)
}

/// Assemble a full pricing file: the magic header line followed by each
/// record, newline-separated.
pub fn pricing_file(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = pad(MAGIC.to_vec());
    for record in records {
        out.push(b'\n');
        out.extend_from_slice(record);
    }
    out
}
