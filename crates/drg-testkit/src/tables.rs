//! Byte-level builders for the `.tab`-format binary tables `drg-tables`
//! parses: a main header/section/pointer-array wrapper around one nested
//! table, which in turn wraps one or more fixed-record sections.
//!
//! Mirrors the layout documented in `drg_tables::raw` field-for-field so a
//! file built here round-trips through `drg_tables::load_table_set`
//! without any of the crate's own parsing logic being duplicated here.

const HEADER_LEN: usize = 32;
const SECTION_LEN: usize = 33;
const TABLE_PTR_LEN: usize = 10;

fn push_ascii_date(out: &mut Vec<u8>, day: u8, month: u8, year_since_2000: u8) {
    out.extend_from_slice(format!("{day:02}{month:02}{year_since_2000:02}").as_bytes());
}

fn push_name(out: &mut Vec<u8>, name: &str) {
    let mut padded = name.as_bytes().to_vec();
    padded.resize(8, b' ');
    out.extend_from_slice(&padded);
}

/// One fixed-record section: `records` is the already-packed byte payload,
/// `value_len` the size of a single record.
pub struct SectionSpec {
    pub value_len: u16,
    pub records: Vec<u8>,
}

impl SectionSpec {
    pub fn new(value_len: u16, records: Vec<u8>) -> Self {
        Self { value_len, records }
    }

    fn values_count(&self) -> u16 {
        (self.records.len() / self.value_len as usize) as u16
    }
}

/// One nested table entry: a `TableKind` name, version, and its sections.
pub struct TableSpec {
    pub name: &'static str,
    pub version: (u8, u8),
    pub date_min_days: u16,
    pub date_max_days: u16,
    pub sections: Vec<SectionSpec>,
}

/// Assemble a complete `.tab` file wrapping a single [`TableSpec`].
///
/// `build_date` is the 6-digit `DDMMYY` string stamped in the main header;
/// any valid calendar date works since `drg-tables` only uses it for
/// diagnostics.
pub fn build_table_file(build_date: (u8, u8, u8), table: &TableSpec) -> Vec<u8> {
    let table_ptr_base = HEADER_LEN + SECTION_LEN;
    let nested_header_offset = table_ptr_base + TABLE_PTR_LEN;
    let nested_sections_offset = nested_header_offset + HEADER_LEN;
    let data_offset = nested_sections_offset + table.sections.len() * SECTION_LEN;

    let mut out = Vec::new();

    // Main header.
    out.extend_from_slice(b"DRGTABLE");
    out.extend_from_slice(format!("{:02}{:02}", table.version.0, table.version.1).as_bytes());
    push_ascii_date(&mut out, build_date.0, build_date.1, build_date.2);
    push_name(&mut out, "MAINIDX");
    out.push(0); // pad1
    out.push(1); // sections_count
    out.extend_from_slice(&[0u8; 4]); // pad2
    debug_assert_eq!(out.len(), HEADER_LEN);

    // Main section: one table pointer, each TABLE_PTR_LEN bytes.
    out.extend_from_slice(&[0u8; 18]);
    out.extend_from_slice(&1u16.to_be_bytes()); // values_count
    out.extend_from_slice(&(TABLE_PTR_LEN as u16).to_be_bytes()); // value_len
    out.extend_from_slice(&(TABLE_PTR_LEN as u32).to_be_bytes()); // raw_len (unchecked)
    out.extend_from_slice(&0u32.to_be_bytes()); // raw_offset (unchecked)
    out.extend_from_slice(&[0u8; 3]);
    debug_assert_eq!(out.len(), table_ptr_base);

    // Table pointer.
    out.extend_from_slice(&table.date_min_days.to_be_bytes());
    out.extend_from_slice(&table.date_max_days.to_be_bytes());
    out.extend_from_slice(&[0u8; 2]); // pad1
    out.extend_from_slice(&(nested_header_offset as u32).to_be_bytes());
    debug_assert_eq!(out.len(), nested_header_offset);

    // Nested table header.
    out.extend_from_slice(b"DRGTABLE");
    out.extend_from_slice(format!("{:02}{:02}", table.version.0, table.version.1).as_bytes());
    push_ascii_date(&mut out, build_date.0, build_date.1, build_date.2);
    push_name(&mut out, table.name);
    out.push(0);
    out.push(table.sections.len() as u8);
    out.extend_from_slice(&[0u8; 4]);
    debug_assert_eq!(out.len(), nested_sections_offset);

    // Nested sections array, then the section data itself, back to back.
    let mut payload = Vec::new();
    for section in &table.sections {
        let raw_offset_local = data_offset - nested_header_offset + payload.len();
        out.extend_from_slice(&[0u8; 18]);
        out.extend_from_slice(&section.values_count().to_be_bytes());
        out.extend_from_slice(&section.value_len.to_be_bytes());
        out.extend_from_slice(&(section.records.len() as u32).to_be_bytes());
        out.extend_from_slice(&(raw_offset_local as u32).to_be_bytes());
        out.extend_from_slice(&[0u8; 3]);
        payload.extend_from_slice(&section.records);
    }
    out.extend_from_slice(&payload);

    out
}

/// One `GHSINFO` record (`NODE_LEN = 21` in `drg_tables::ghs`). Set
/// `valid_ghs` nonzero to close the record immediately after applying
/// `function`'s eligibility constraint.
pub fn ghs_record(cmd: u8, type_seq: u16, function: u8, params: [u8; 2], valid_ghs: u8, ghs: [u16; 2]) -> Vec<u8> {
    let mut v = vec![cmd];
    v.extend_from_slice(&type_seq.to_be_bytes());
    v.push(0); // low_duration_mode
    v.push(function);
    v.extend_from_slice(&params);
    v.push(0); // skip_after_failure
    v.push(valid_ghs);
    for sector_ghs in ghs {
        v.extend_from_slice(&sector_ghs.to_be_bytes());
        v.extend_from_slice(&[0u8; 4]); // high/low duration thresholds
    }
    v
}

/// One `AUTOREFS` record (`RECORD_LEN = 3`): `code`, `function`, and a
/// `global` flag that only matters for the unit/facility section.
pub fn authorization_record(code: u8, function: u8, global: u8) -> Vec<u8> {
    vec![code, function, global]
}

const GHM_CHARS1: [u8; 10] = [0, b'C', b'H', b'K', b'M', b'Z', b' ', b' ', b' ', b' '];
const GHM_CHARS4: [u8; 10] = [0, b'A', b'B', b'C', b'D', b'E', b'J', b'Z', b' ', b' '];

/// One GHM decision-tree test node (`NODE_LEN = 6` in `drg_tables::ghm_tree`):
/// `function` (anything but 12), `params`, `children_count`, and
/// `children_idx` packed into the node's final big-endian `u16`.
pub fn ghm_test_node(function: u8, params: [u8; 2], children_idx: u16, children_count: u8) -> Vec<u8> {
    assert_ne!(function, 12, "function 12 marks a terminal node, not a test");
    let mut v = vec![function, params[0], params[1], children_count];
    v.extend_from_slice(&children_idx.to_be_bytes());
    v
}

/// One GHM decision-tree terminal node (`function == 12`) assigning `kind`
/// (one of `C`/`H`/`K`/`M`/`Z`/space) and `mode` (one of `A`-`E`/`J`/`Z`/space)
/// to a `(cmd, seq)` pair, with `error` set as the node's reported error code.
pub fn ghm_terminal_node(cmd: u8, kind: u8, seq: u8, mode: u8, error: u8) -> Vec<u8> {
    let kind_idx = GHM_CHARS1.iter().position(|&c| c == kind).expect("kind must be a valid GHM letter") as u16;
    let mode_idx = GHM_CHARS4.iter().position(|&c| c == mode).expect("mode must be a valid GHM severity char") as u16;
    let children_idx_raw = kind_idx * 1000 + seq as u16 * 10 + mode_idx;
    let mut v = vec![12u8, error, cmd, 0];
    v.extend_from_slice(&children_idx_raw.to_be_bytes());
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use drg_tables::load_table_set;

    #[test]
    fn builds_a_loadable_ghs_table() {
        let section = SectionSpec::new(21, ghs_record(4, 300, 6, [0, 5], 1, [145, 145]));
        let table = TableSpec {
            name: "GHSINFO",
            version: (11, 14),
            date_min_days: 16072, // 2024-01-01 (days since 1979-12-31)
            date_max_days: 16437, // 2024-12-31
            sections: vec![section],
        };
        let bytes = build_table_file((1, 1, 24), &table);

        let set = load_table_set(&[("ghsinfo.tab".to_string(), bytes)]).unwrap();
        let view = set.find_index(drg_schemas::Date::new(2024, 6, 1)).unwrap();
        let ghs = view.ghs();
        assert_eq!(ghs.len(), 1);
        assert_eq!(ghs[0].ghs[0], 145);
        assert_eq!(ghs[0].minimal_duration, 5);
    }

    #[test]
    fn builds_a_loadable_ghm_decision_tree() {
        let root = ghm_test_node(3, [10, 0], 1, 1);
        let leaf = ghm_terminal_node(4, b'C', 3, b'Z', 0);
        let section = SectionSpec::new(6, [root, leaf].concat());
        let table = TableSpec {
            name: "ARBREDEC",
            version: (11, 14),
            date_min_days: 16072,
            date_max_days: 16437,
            sections: vec![section],
        };
        let bytes = build_table_file((1, 1, 24), &table);

        let set = load_table_set(&[("arbredec.tab".to_string(), bytes)]).unwrap();
        let view = set.find_index(drg_schemas::Date::new(2024, 6, 1)).unwrap();
        let nodes = view.ghm_nodes();
        assert_eq!(nodes.len(), 2);
        match nodes[1] {
            drg_tables::GhmDecisionNode::Terminal { code, error } => {
                assert_eq!(code.cmd, 4);
                assert_eq!(code.kind, b'C');
                assert_eq!(code.seq, 3);
                assert_eq!(code.mode, b'Z');
                assert_eq!(error, 0);
            }
            _ => panic!("expected terminal node"),
        }
    }

    #[test]
    fn builds_a_loadable_authorization_table() {
        let bed = SectionSpec::new(3, authorization_record(1, 2, 0));
        let unit = SectionSpec::new(3, authorization_record(3, 4, 1));
        let table = TableSpec {
            name: "AUTOREFS",
            version: (11, 14),
            date_min_days: 16072,
            date_max_days: 16437,
            sections: vec![bed, unit],
        };
        let bytes = build_table_file((1, 1, 24), &table);

        let set = load_table_set(&[("autorefs.tab".to_string(), bytes)]).unwrap();
        let view = set.find_index(drg_schemas::Date::new(2024, 6, 1)).unwrap();
        let auths = view.authorizations();
        assert_eq!(auths.len(), 2);
        assert_eq!(auths[0].kind, drg_tables::AuthorizationKind::Bed);
        assert_eq!(auths[1].kind, drg_tables::AuthorizationKind::Facility);
    }
}
