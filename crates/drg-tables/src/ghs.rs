//! GHS pricing-eligibility table: a stateful fold over consecutive records.
//! Each record sets at most one optional filter field on a "current" GHS
//! entry; a record with `valid_ghs` set closes the entry (stamping in the
//! two per-sector GHS numbers) and starts a fresh one.

use drg_schemas::GhmCode;

use crate::error::{Result, TableError};
use crate::raw::{read_u16_be, TableInfo};

#[derive(Copy, Clone, Debug, Default, serde::Serialize)]
pub struct GhsInfo {
    pub ghm: GhmCode,
    pub ghs: [u16; 2],
    /// Per-sector length-of-stay thresholds carried alongside each GHS
    /// number on the wire. The pricing resolver (`drg-pricing`) reads these
    /// rather than the pricing file, which carries amounts only.
    pub exh_threshold: [u16; 2],
    pub exb_threshold: [u16; 2],
    pub proc_offset: u8,
    pub proc_mask: u8,
    pub unit_authorization: u8,
    pub bed_authorization: u8,
    pub main_diagnosis_offset: u8,
    pub main_diagnosis_mask: u8,
    pub minimal_duration: u8,
    pub diagnosis_offset: u8,
    pub diagnosis_mask: u8,
    pub minimal_age: u8,
}

// cmd(1) + type_seq(2) + low_duration_mode(1) + function(1) + params(2) +
// skip_after_failure(1) + valid_ghs(1) + sectors[2]{ghs_code(2) +
// high_duration_threshold(2) + low_duration_threshold(2)} (12) = 21 bytes.
const NODE_LEN: usize = 21;
const SECTORS_OFFSET: usize = 9;
const SECTOR_LEN: usize = 6;

const CHARS1: [u8; 6] = [0, b'C', b'H', b'K', b'M', b'Z'];
const CHARS4: [u8; 13] = [
    0, b'A', b'B', b'C', b'D', b'E', b'J', b'Z', b'T', b'1', b'2', b'3', b'4',
];

pub fn parse_ghs_table(file_data: &[u8], table: &TableInfo) -> Result<Vec<GhsInfo>> {
    if table.sections.len() != 1 {
        return Err(TableError::UnexpectedSectionCount {
            context: "GHS table",
            expected: 1,
            found: table.sections.len() as u8,
        });
    }
    let section = &table.sections[0];
    if section.value_len != NODE_LEN {
        return Err(TableError::UnexpectedValueLen {
            context: "GHS table node",
            expected: NODE_LEN,
            found: section.value_len,
        });
    }

    let mut out = Vec::new();
    let mut current = GhsInfo::default();
    let mut ghm_assigned = false;

    for i in 0..section.values_count {
        let base = section.raw_offset + i * NODE_LEN;
        let cmd = file_data[base];
        let type_seq = read_u16_be(file_data, base + 1)
            .ok_or(TableError::Truncated { context: "GHS table node" })? as usize;
        let function = file_data[base + 4];
        let params = [file_data[base + 5], file_data[base + 6]];
        let valid_ghs = file_data[base + 8];
        let ghs_code0 = read_u16_be(file_data, base + SECTORS_OFFSET)
            .ok_or(TableError::Truncated { context: "GHS table node" })?;
        let ghs_code1 = read_u16_be(file_data, base + SECTORS_OFFSET + SECTOR_LEN)
            .ok_or(TableError::Truncated { context: "GHS table node" })?;
        let exh0 = read_u16_be(file_data, base + SECTORS_OFFSET + 2)
            .ok_or(TableError::Truncated { context: "GHS table node" })?;
        let exb0 = read_u16_be(file_data, base + SECTORS_OFFSET + 4)
            .ok_or(TableError::Truncated { context: "GHS table node" })?;
        let exh1 = read_u16_be(file_data, base + SECTORS_OFFSET + SECTOR_LEN + 2)
            .ok_or(TableError::Truncated { context: "GHS table node" })?;
        let exb1 = read_u16_be(file_data, base + SECTORS_OFFSET + SECTOR_LEN + 4)
            .ok_or(TableError::Truncated { context: "GHS table node" })?;

        if !ghm_assigned {
            current.ghm = GhmCode {
                cmd,
                kind: CHARS1[(type_seq / 10000) % 6],
                seq: ((type_seq / 100) % 100) as u8,
                mode: CHARS4[type_seq % 100 % 13],
            };
            ghm_assigned = true;
        }

        match function {
            0 => {
                if valid_ghs == 0 {
                    return Err(TableError::UnknownGhsFunction { function });
                }
            }
            1 => {
                current.proc_offset = params[0];
                current.proc_mask = params[1];
            }
            2 => {
                current.unit_authorization = params[1];
            }
            3 => {
                current.bed_authorization = params[1];
            }
            5 => {
                current.main_diagnosis_offset = params[0];
                current.main_diagnosis_mask = params[1];
            }
            6 => {
                current.minimal_duration = params[1];
            }
            7 => {
                current.diagnosis_offset = params[0];
                current.diagnosis_mask = params[1];
            }
            8 => {
                current.minimal_age = params[1];
            }
            other => return Err(TableError::UnknownGhsFunction { function: other }),
        }

        if valid_ghs != 0 {
            if !current.ghm.is_valid() {
                return Err(TableError::GhsRecordWithoutGhm);
            }
            current.ghs = [ghs_code0, ghs_code1];
            current.exh_threshold = [exh0, exh1];
            current.exb_threshold = [exb0, exb1];
            out.push(current);
            current = GhsInfo::default();
            ghm_assigned = false;
        }
    }

    out.sort_by(|a, b| {
        let root_cmp = (a.ghm.cmd, a.ghm.kind, a.ghm.seq).cmp(&(b.ghm.cmd, b.ghm.kind, b.ghm.seq));
        if root_cmp != std::cmp::Ordering::Equal {
            return root_cmp;
        }
        match (a.ghm.mode >= b'J', b.ghm.mode >= b'J') {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.ghm.mode.cmp(&b.ghm.mode),
        }
    });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{SectionInfo, TableKind};
    use drg_schemas::Date;

    fn node(cmd: u8, type_seq: u16, function: u8, params: [u8; 2], valid: u8, ghs: u16) -> Vec<u8> {
        let mut v = vec![cmd];
        v.extend_from_slice(&type_seq.to_be_bytes());
        v.push(0); // low_duration_mode
        v.push(function);
        v.extend_from_slice(&params);
        v.push(0); // skip_after_failure
        v.push(valid);
        // sector 0: ghs_code, high_duration_threshold, low_duration_threshold
        v.extend_from_slice(&ghs.to_be_bytes());
        v.extend_from_slice(&[0, 0, 0, 0]);
        // sector 1
        v.extend_from_slice(&ghs.to_be_bytes());
        v.extend_from_slice(&[0, 0, 0, 0]);
        v
    }

    #[test]
    fn closes_record_on_valid_ghs() {
        let data = node(4, 300, 6, [0, 5], 1, 145);
        assert_eq!(data.len(), NODE_LEN);
        let table = TableInfo {
            kind: TableKind::GhsTable,
            raw_name: "GHSINFO".into(),
            build_date: Date::new(2024, 1, 1),
            version: (11, 14),
            limit_dates: (Date::new(2024, 1, 1), Date::new(2024, 12, 31)),
            sections: vec![SectionInfo { raw_offset: 0, raw_len: data.len(), values_count: 1, value_len: NODE_LEN }],
        };
        let ghs = parse_ghs_table(&data, &table).unwrap();
        assert_eq!(ghs.len(), 1);
        assert_eq!(ghs[0].minimal_duration, 5);
        assert_eq!(ghs[0].ghs[0], 145);
    }

    #[test]
    fn rejects_unassigned_ghm_on_close() {
        // cmd=0/type_seq=0 still produces a zero GhmCode which is invalid.
        let data = node(0, 0, 6, [0, 5], 1, 10);
        let table = TableInfo {
            kind: TableKind::GhsTable,
            raw_name: "GHSINFO".into(),
            build_date: Date::new(2024, 1, 1),
            version: (11, 14),
            limit_dates: (Date::new(2024, 1, 1), Date::new(2024, 12, 31)),
            sections: vec![SectionInfo { raw_offset: 0, raw_len: data.len(), values_count: 1, value_len: NODE_LEN }],
        };
        assert!(parse_ghs_table(&data, &table).is_err());
    }
}
