//! Care-unit/bed/facility authorization table: two sections (bed
//! authorizations, then unit-or-facility authorizations distinguished by a
//! `global` flag) folded into one flat list.

use crate::error::{Result, TableError};
use crate::raw::TableInfo;

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum AuthorizationKind {
    Bed,
    Unit,
    Facility,
}

#[derive(Copy, Clone, Debug, serde::Serialize)]
pub struct AuthorizationInfo {
    pub kind: AuthorizationKind,
    pub code: u8,
    pub function: u8,
}

const RECORD_LEN: usize = 3;

pub fn parse_authorization_table(file_data: &[u8], table: &TableInfo) -> Result<Vec<AuthorizationInfo>> {
    if table.sections.len() != 2 {
        return Err(TableError::UnexpectedSectionCount {
            context: "authorization table",
            expected: 2,
            found: table.sections.len() as u8,
        });
    }

    let mut out = Vec::new();
    for (section_idx, section) in table.sections.iter().enumerate() {
        if section.value_len != RECORD_LEN {
            return Err(TableError::UnexpectedValueLen {
                context: "authorization record",
                expected: RECORD_LEN,
                found: section.value_len,
            });
        }
        for j in 0..section.values_count {
            let base = section.raw_offset + j * RECORD_LEN;
            let code = file_data[base];
            let function = file_data[base + 1];
            let global = file_data[base + 2];

            let kind = if section_idx == 0 {
                AuthorizationKind::Bed
            } else if global == 0 {
                AuthorizationKind::Unit
            } else {
                AuthorizationKind::Facility
            };

            out.push(AuthorizationInfo { kind, code, function });
        }
    }

    Ok(out)
}
