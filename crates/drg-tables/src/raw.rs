//! Big-endian byte-slice readers and the table/section header format shared
//! by every binary table kind. No `unsafe`, no `transmute` — every
//! multi-byte field is assembled from individual bytes.

use drg_schemas::{Date, DiagnosisCode};

use crate::error::{Result, TableError};

pub fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}

pub fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// A day count against the 1979-12-31 epoch used throughout the binary
/// table format.
pub fn convert_date_1980(days: u16) -> Date {
    Date::from_days_since_1980(days)
}

/// Reassemble a diagnosis code from its packed `(code123, code456)` form:
/// `code123` gives the letter + two digits, `code456` is a base-12 encoding
/// of up to three trailing characters (space/digit/`+`).
pub fn convert_diagnosis_code(code123: u16, code456: u16) -> Option<DiagnosisCode> {
    let letter = b'A' + (code123 / 100) as u8;
    let digits = code123 % 100;
    let mut buf = [0u8; 6];
    buf[0] = letter;
    buf[1] = b'0' + (digits / 10) as u8;
    buf[2] = b'0' + (digits % 10) as u8;

    const CODE456_CHARS: &[u8] = b" 0123456789+";
    let mut rest = code456 % 1584;
    buf[3] = CODE456_CHARS[(rest / 132) as usize];
    rest %= 132;
    buf[4] = CODE456_CHARS[(rest / 11) as usize];
    rest %= 11;
    buf[5] = CODE456_CHARS[rest as usize];

    let mut end = 6usize;
    while end > 3 && buf[end - 1] == b' ' {
        buf[end - 1] = 0;
        end -= 1;
    }
    let text = std::str::from_utf8(&buf[..end]).ok()?;
    DiagnosisCode::parse(text).or_else(|| DiagnosisCode::parse(&text.replace('\0', "")))
}

/// One of the named binary table kinds, decoded from the header's 8-byte
/// `name` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    GhmDecisionTree,
    DiagnosisTable,
    ProcedureTable,
    GhmRootTable,
    GhsTable,
    SeverityTable,
    AuthorizationTable,
    SrcPairTable,
    Unknown,
}

impl TableKind {
    fn from_name(name: &str) -> TableKind {
        match name {
            "ARBREDEC" => TableKind::GhmDecisionTree,
            "DIAG10CR" => TableKind::DiagnosisTable,
            "CCAMCARA" => TableKind::ProcedureTable,
            "RGHMINFO" => TableKind::GhmRootTable,
            "GHSINFO" => TableKind::GhsTable,
            "TABCOMBI" => TableKind::SeverityTable,
            "AUTOREFS" => TableKind::AuthorizationTable,
            "SRCDGACT" => TableKind::SrcPairTable,
            _ => TableKind::Unknown,
        }
    }
}

/// One section within a table: a homogeneous array of fixed-size records.
#[derive(Copy, Clone, Debug)]
pub struct SectionInfo {
    pub raw_offset: usize,
    pub raw_len: usize,
    pub values_count: usize,
    pub value_len: usize,
}

/// One table entry as described by the file's pointer table: its kind,
/// build metadata, validity interval, and section layout.
#[derive(Clone, Debug)]
pub struct TableInfo {
    pub kind: TableKind,
    pub raw_name: String,
    pub build_date: Date,
    pub version: (i16, i16),
    pub limit_dates: (Date, Date),
    pub sections: Vec<SectionInfo>,
}

// Field layout of `PackedHeader1111` (32 bytes, no padding): signature[8],
// version[4], date[6], name[8], pad1[1], sections_count[1], pad2[4].
const HEADER_LEN: usize = 32;
const HEADER_VERSION_OFFSET: usize = 8;
const HEADER_DATE_OFFSET: usize = 12;
const HEADER_NAME_OFFSET: usize = 18;
const HEADER_SECTIONS_COUNT_OFFSET: usize = 27;

// Field layout of `PackedSection1111` (33 bytes): pad1[18], values_count[2],
// value_len[2], raw_len[4], raw_offset[4], pad2[3].
const SECTION_LEN: usize = 33;
const SECTION_VALUES_COUNT_OFFSET: usize = 18;
const SECTION_VALUE_LEN_OFFSET: usize = 20;
const SECTION_RAW_LEN_OFFSET: usize = 22;
const SECTION_RAW_OFFSET_OFFSET: usize = 26;

// Field layout of `PackedTablePtr1111` (10 bytes): date_range[2*2], pad1[2],
// raw_offset[4].
const TABLE_PTR_LEN: usize = 10;
const TABLE_PTR_RAW_OFFSET_OFFSET: usize = 6;

/// Parse every table entry (possibly spanning several date ranges) out of
/// one `.tab`-format file's raw bytes.
pub fn parse_table_headers(file_data: &[u8]) -> Result<Vec<TableInfo>> {
    if file_data.len() < HEADER_LEN + SECTION_LEN {
        return Err(TableError::Truncated { context: "table file header" });
    }

    let main_sections_count = file_data[HEADER_SECTIONS_COUNT_OFFSET];
    if main_sections_count != 1 {
        return Err(TableError::UnexpectedSectionCount {
            context: "main header",
            expected: 1,
            found: main_sections_count,
        });
    }

    let main_section_base = HEADER_LEN;
    let values_count = read_u16_be(file_data, main_section_base + SECTION_VALUES_COUNT_OFFSET)
        .ok_or(TableError::Truncated { context: "main section" })? as usize;
    let value_len = read_u16_be(file_data, main_section_base + SECTION_VALUE_LEN_OFFSET)
        .ok_or(TableError::Truncated { context: "main section" })? as usize;

    if value_len != TABLE_PTR_LEN {
        return Err(TableError::UnexpectedValueLen {
            context: "main section table pointers",
            expected: TABLE_PTR_LEN,
            found: value_len,
        });
    }
    if file_data.len() < HEADER_LEN + values_count * TABLE_PTR_LEN {
        return Err(TableError::Truncated { context: "table pointer array" });
    }

    let build_date = parse_header_build_date(file_data)?;

    let mut tables = Vec::with_capacity(values_count);
    for i in 0..values_count {
        let ptr_base = HEADER_LEN + SECTION_LEN + i * TABLE_PTR_LEN;
        let date_min = read_u16_be(file_data, ptr_base)
            .ok_or(TableError::Truncated { context: "table pointer" })?;
        let date_max = read_u16_be(file_data, ptr_base + 2)
            .ok_or(TableError::Truncated { context: "table pointer" })?;
        let raw_offset = read_u32_be(file_data, ptr_base + TABLE_PTR_RAW_OFFSET_OFFSET)
            .ok_or(TableError::Truncated { context: "table pointer" })? as usize;

        if file_data.len() < raw_offset + HEADER_LEN {
            return Err(TableError::Truncated { context: "table header" });
        }

        let sections_count = file_data[raw_offset + HEADER_SECTIONS_COUNT_OFFSET] as usize;
        if file_data.len() < raw_offset + sections_count * SECTION_LEN {
            return Err(TableError::Truncated { context: "table sections" });
        }

        let version_str = std::str::from_utf8(
            &file_data[raw_offset + HEADER_VERSION_OFFSET..raw_offset + HEADER_VERSION_OFFSET + 4],
        )
        .map_err(|_| TableError::UnsupportedVersion { found: String::new() })?;
        let version = parse_version(version_str)?;

        let mut sections = Vec::with_capacity(sections_count);
        for j in 0..sections_count {
            let sect_base = raw_offset + HEADER_LEN + j * SECTION_LEN;
            let sec_values_count = read_u16_be(file_data, sect_base + SECTION_VALUES_COUNT_OFFSET)
                .ok_or(TableError::Truncated { context: "section" })? as usize;
            let sec_value_len = read_u16_be(file_data, sect_base + SECTION_VALUE_LEN_OFFSET)
                .ok_or(TableError::Truncated { context: "section" })? as usize;
            let sec_raw_len = read_u32_be(file_data, sect_base + SECTION_RAW_LEN_OFFSET)
                .ok_or(TableError::Truncated { context: "section" })? as usize;
            let sec_raw_offset_local = read_u32_be(file_data, sect_base + SECTION_RAW_OFFSET_OFFSET)
                .ok_or(TableError::Truncated { context: "section" })? as usize;

            if sec_raw_len != sec_values_count * sec_value_len {
                return Err(TableError::InconsistentSectionLength { context: "section" });
            }
            let sec_raw_offset = raw_offset + sec_raw_offset_local;
            if file_data.len() < sec_raw_offset + sec_raw_len {
                return Err(TableError::Truncated { context: "section data" });
            }

            sections.push(SectionInfo {
                raw_offset: sec_raw_offset,
                raw_len: sec_raw_len,
                values_count: sec_values_count,
                value_len: sec_value_len,
            });
        }

        let raw_name = std::str::from_utf8(
            &file_data[raw_offset + HEADER_NAME_OFFSET..raw_offset + HEADER_NAME_OFFSET + 8],
        )
        .unwrap_or("")
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string();
        let kind = TableKind::from_name(&raw_name);

        let limit_dates = (convert_date_1980(date_min), convert_date_1980(date_max));
        if limit_dates.1 <= limit_dates.0 {
            return Err(TableError::EmptyValidityInterval);
        }

        tables.push(TableInfo {
            kind,
            raw_name,
            build_date,
            version,
            limit_dates,
            sections,
        });
    }

    Ok(tables)
}

fn parse_header_build_date(file_data: &[u8]) -> Result<Date> {
    let raw = std::str::from_utf8(&file_data[HEADER_DATE_OFFSET..HEADER_DATE_OFFSET + 6]).map_err(
        |_| TableError::Truncated { context: "header build date" },
    )?;
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TableError::Truncated { context: "header build date" });
    }
    let day: i8 = raw[0..2].parse().unwrap_or(0);
    let month: i8 = raw[2..4].parse().unwrap_or(0);
    let year: i16 = raw[4..6].parse::<i16>().unwrap_or(0) + 2000;
    let date = Date::new(year, month, day);
    if !date.is_valid() {
        return Err(TableError::Truncated { context: "header build date" });
    }
    Ok(date)
}

fn parse_version(raw: &str) -> Result<(i16, i16)> {
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TableError::UnsupportedVersion { found: raw.to_string() });
    }
    let major: i16 = raw[0..2].parse().unwrap();
    let minor: i16 = raw[2..4].parse().unwrap();
    if major < 11 || (major == 11 && minor < 10) {
        return Err(TableError::UnsupportedVersion { found: raw.to_string() });
    }
    Ok((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosis_code_round_trips_through_packed_form() {
        let code = convert_diagnosis_code(0, 132 * 11).unwrap();
        assert_eq!(code.as_str(), "A");
    }

    #[test]
    fn read_u16_be_matches_manual_shift() {
        let data = [0x01, 0x02];
        assert_eq!(read_u16_be(&data, 0), Some(0x0102));
    }

    #[test]
    fn version_rejects_pre_11_10() {
        assert!(parse_version("1109").is_err());
        assert!(parse_version("1110").is_ok());
        assert!(parse_version("1200").is_ok());
    }
}
