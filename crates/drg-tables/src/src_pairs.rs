//! Diagnosis/procedure "source pair" tables used by two of the numbered GHM
//! tree tests (a pairing list restricting which procedure can justify which
//! diagnosis, and vice versa).

use drg_schemas::{DiagnosisCode, ProcedureCode};

use crate::error::{Result, TableError};
use crate::raw::{convert_diagnosis_code, read_u16_be, TableInfo};

#[derive(Copy, Clone, Debug, serde::Serialize)]
pub struct SrcPair {
    pub diagnosis: DiagnosisCode,
    pub procedure: ProcedureCode,
}

const PAIR_LEN: usize = 8;

pub fn parse_src_pair_table(file_data: &[u8], table: &TableInfo, section_idx: usize) -> Result<Vec<SrcPair>> {
    let section = table
        .sections
        .get(section_idx)
        .ok_or(TableError::IndexOutOfBounds {
            context: "source pair table section",
            index: section_idx,
            bound: table.sections.len(),
        })?;
    if section.value_len != PAIR_LEN {
        return Err(TableError::UnexpectedValueLen {
            context: "source pair record",
            expected: PAIR_LEN,
            found: section.value_len,
        });
    }

    let mut pairs = Vec::with_capacity(section.values_count);
    for i in 0..section.values_count {
        let base = section.raw_offset + i * PAIR_LEN;
        let diag_code123 = read_u16_be(file_data, base).ok_or(TableError::Truncated { context: "source pair" })?;
        let diag_code456 =
            read_u16_be(file_data, base + 2).ok_or(TableError::Truncated { context: "source pair" })?;
        let proc_code123 =
            read_u16_be(file_data, base + 4).ok_or(TableError::Truncated { context: "source pair" })?;
        let proc_code456 =
            read_u16_be(file_data, base + 6).ok_or(TableError::Truncated { context: "source pair" })?;

        let diagnosis = convert_diagnosis_code(diag_code123, diag_code456)
            .ok_or(TableError::Truncated { context: "source pair diagnosis code" })?;

        let mut letters = [0u8; 3];
        let mut remain = proc_code123;
        for slot in letters.iter_mut().rev() {
            *slot = b'A' + (remain % 26) as u8;
            remain /= 26;
        }
        let mut code_bytes = [0u8; 7];
        code_bytes[0..3].copy_from_slice(&letters);
        code_bytes[3] = b'A' + (proc_code456 / 1000 % 26) as u8;
        let seq = proc_code456 % 1000;
        let seq_str = format!("{seq:03}");
        code_bytes[4..7].copy_from_slice(seq_str.as_bytes());
        let procedure = ProcedureCode::parse(std::str::from_utf8(&code_bytes).unwrap())
            .ok_or(TableError::Truncated { context: "source pair procedure code" })?;

        pairs.push(SrcPair { diagnosis, procedure });
    }

    Ok(pairs)
}
