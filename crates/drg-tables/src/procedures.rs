//! CCAM procedure table: a 26^3 first-three-letters lookup pointing at
//! variable-length blocks of procedure entries, each carrying a validity
//! interval and an opaque attribute byte string consumed by the severity
//! and pricing layers.

use drg_schemas::{Date, ProcedureCode};

use crate::error::{Result, TableError};
use crate::raw::{convert_date_1980, read_u16_be, TableInfo};

const ROOT_COUNT: usize = 26 * 26 * 26;
const PTR_LEN: usize = 9;

#[derive(Clone, Debug, serde::Serialize)]
pub struct ProcedureInfo {
    pub code: ProcedureCode,
    pub phase: u8,
    pub limit_dates: (Date, Date),
    pub bytes: Vec<u8>,
}

pub fn parse_procedure_table(file_data: &[u8], table: &TableInfo) -> Result<Vec<ProcedureInfo>> {
    if table.sections.len() != 3 {
        return Err(TableError::UnexpectedSectionCount {
            context: "procedure table",
            expected: 3,
            found: table.sections.len() as u8,
        });
    }
    let (roots, ptrs, attrs) = (&table.sections[0], &table.sections[1], &table.sections[2]);

    if roots.values_count != ROOT_COUNT || roots.value_len != 2 {
        return Err(TableError::UnexpectedValueLen {
            context: "procedure root index",
            expected: 2,
            found: roots.value_len,
        });
    }
    if ptrs.value_len != PTR_LEN {
        return Err(TableError::UnexpectedValueLen {
            context: "procedure pointer",
            expected: PTR_LEN,
            found: ptrs.value_len,
        });
    }
    if attrs.value_len == 0 {
        return Err(TableError::UnexpectedValueLen {
            context: "procedure attributes",
            expected: 1,
            found: 0,
        });
    }

    let mut procedures = Vec::new();
    let mut block_start = ptrs.raw_offset;
    for root_idx in 0..roots.values_count {
        let end_idx = read_u16_be(file_data, roots.raw_offset + root_idx * 2)
            .ok_or(TableError::Truncated { context: "procedure root index" })? as usize;
        if end_idx > ptrs.values_count {
            return Err(TableError::IndexOutOfBounds {
                context: "procedure root index",
                index: end_idx,
                bound: ptrs.values_count,
            });
        }
        let block_end = ptrs.raw_offset + end_idx * PTR_LEN;

        let mut code123 = [0u8; 3];
        let mut remain = root_idx;
        for slot in code123.iter_mut().rev() {
            *slot = b'A' + (remain % 26) as u8;
            remain /= 26;
        }

        let mut offset = block_start;
        while offset < block_end {
            let char4 = file_data[offset];
            let seq_phase = read_u16_be(file_data, offset + 1)
                .ok_or(TableError::Truncated { context: "procedure pointer" })?;
            let section2_idx = read_u16_be(file_data, offset + 3)
                .ok_or(TableError::Truncated { context: "procedure pointer" })? as usize;
            let date_min = read_u16_be(file_data, offset + 5)
                .ok_or(TableError::Truncated { context: "procedure pointer" })?;
            let date_max = read_u16_be(file_data, offset + 7)
                .ok_or(TableError::Truncated { context: "procedure pointer" })?;

            if section2_idx >= attrs.values_count {
                return Err(TableError::IndexOutOfBounds {
                    context: "procedure attribute index",
                    index: section2_idx,
                    bound: attrs.values_count,
                });
            }

            let mut code_bytes = [0u8; 7];
            code_bytes[0..3].copy_from_slice(&code123);
            code_bytes[3] = b'A' + (char4 % 26);
            let seq = (seq_phase / 10) % 1000;
            let seq_str = format!("{seq:03}");
            code_bytes[4..7].copy_from_slice(seq_str.as_bytes());
            let code = ProcedureCode::parse(std::str::from_utf8(&code_bytes).unwrap())
                .ok_or(TableError::Truncated { context: "procedure code" })?;
            let phase = (seq_phase % 10) as u8;

            let limit_start = convert_date_1980(date_min);
            let limit_end = if date_max < u16::MAX {
                convert_date_1980(date_max + 1)
            } else {
                convert_date_1980(u16::MAX)
            };

            let attr_base = attrs.raw_offset + section2_idx * attrs.value_len;
            let bytes = file_data[attr_base..attr_base + attrs.value_len].to_vec();

            procedures.push(ProcedureInfo {
                code,
                phase,
                limit_dates: (limit_start, limit_end),
                bytes,
            });

            offset += PTR_LEN;
        }

        block_start = block_end;
    }

    Ok(procedures)
}
