//! GHM root table: per-root severity adjustment parameters (ambulatory and
//! short-duration overrides, young/old age thresholds, CMA exclusion bit,
//! childbirth severity list selector).

use drg_schemas::GhmRootCode;

use crate::error::{Result, TableError};
use crate::raw::{read_u16_be, TableInfo};

const RECORD_LEN_PRE_11_14: usize = 11;
const RECORD_LEN: usize = 12;

#[derive(Copy, Clone, Debug, Default, serde::Serialize)]
pub struct GhmRootInfo {
    pub code: GhmRootCode,
    pub allow_ambulatory: bool,
    pub short_duration_threshold: u8,
    pub confirm_duration_threshold: u8,
    pub young_age_threshold: u8,
    pub young_severity_limit: u8,
    pub old_age_threshold: u8,
    pub old_severity_limit: u8,
    /// 0 = no childbirth override, otherwise selects one of lists A1-A3.
    pub childbirth_severity_list: u8,
    pub cma_exclusion_offset: u8,
    pub cma_exclusion_mask: u8,
}

const CHARS1: [u8; 10] = [0, b'C', b'H', b'K', b'M', b'Z', b' ', b' ', b' ', b' '];

pub fn parse_ghm_root_table(file_data: &[u8], table: &TableInfo) -> Result<Vec<GhmRootInfo>> {
    if table.sections.len() != 1 {
        return Err(TableError::UnexpectedSectionCount {
            context: "GHM root table",
            expected: 1,
            found: table.sections.len() as u8,
        });
    }
    let section = &table.sections[0];
    let has_childbirth_field = table.version.0 > 11 || (table.version.0 == 11 && table.version.1 > 14);
    let expected_len = if has_childbirth_field { RECORD_LEN } else { RECORD_LEN_PRE_11_14 };
    if section.value_len != expected_len {
        return Err(TableError::UnexpectedValueLen {
            context: "GHM root record",
            expected: expected_len,
            found: section.value_len,
        });
    }

    let mut roots = Vec::with_capacity(section.values_count);
    for i in 0..section.values_count {
        let base = section.raw_offset + i * section.value_len;
        let cmd = file_data[base];
        let type_seq = read_u16_be(file_data, base + 1)
            .ok_or(TableError::Truncated { context: "GHM root record" })?;
        let young_severity_mode = file_data[base + 3];
        let old_severity_mode = file_data[base + 4];
        let duration_severity_mode = file_data[base + 5];
        // pad1[2] at base+6..8
        let cma_exclusion_offset = file_data[base + 8];
        let cma_exclusion_mask = file_data[base + 9];
        let confirm_duration_threshold = file_data[base + 10];
        let childbirth_severity_mode = if section.value_len >= RECORD_LEN {
            file_data[base + 11]
        } else {
            0
        };

        let code = GhmRootCode {
            cmd,
            kind: CHARS1[(type_seq as usize / 100) % 10],
            seq: (type_seq % 100) as u8,
        };

        let mut info = GhmRootInfo {
            code,
            confirm_duration_threshold,
            cma_exclusion_offset,
            cma_exclusion_mask,
            ..Default::default()
        };

        match duration_severity_mode {
            1 => info.allow_ambulatory = true,
            2 => info.short_duration_threshold = 1,
            3 => info.short_duration_threshold = 2,
            4 => info.short_duration_threshold = 3,
            _ => {}
        }

        if young_severity_mode == 1 {
            info.young_age_threshold = 2;
            info.young_severity_limit = 1;
        }

        match old_severity_mode {
            1 => {
                info.old_age_threshold = 70;
                info.old_severity_limit = 1;
            }
            2 => {
                info.old_age_threshold = 80;
                info.old_severity_limit = 1;
            }
            3 => {
                info.old_age_threshold = 70;
                info.old_severity_limit = 2;
            }
            4 => {
                info.old_age_threshold = 80;
                info.old_severity_limit = 2;
            }
            5 => {
                info.old_age_threshold = 70;
                info.old_severity_limit = 3;
            }
            6 => {
                info.old_age_threshold = 80;
                info.old_severity_limit = 3;
            }
            _ => {}
        }

        if childbirth_severity_mode != 0 {
            if !(2..=4).contains(&childbirth_severity_mode) {
                return Err(TableError::InvalidChildbirthSeverityMode { found: childbirth_severity_mode });
            }
            info.childbirth_severity_list = childbirth_severity_mode - 1;
        }

        roots.push(info);
    }

    Ok(roots)
}
