//! GHM decision tree: a flat array of nodes, each either a numbered test
//! (with a range of child indices) or a terminal GHM assignment.

use drg_schemas::GhmCode;

use crate::error::{Result, TableError};
use crate::raw::{read_u16_be, TableInfo};

const NODE_LEN: usize = 6;

#[derive(Copy, Clone, Debug, serde::Serialize)]
pub enum GhmDecisionNode {
    Test {
        function: u8,
        params: [u8; 2],
        children_idx: usize,
        children_count: usize,
    },
    Terminal {
        code: GhmCode,
        error: u8,
    },
}

const CHARS1: [u8; 10] = [0, b'C', b'H', b'K', b'M', b'Z', b' ', b' ', b' ', b' '];
const CHARS4: [u8; 10] = [0, b'A', b'B', b'C', b'D', b'E', b'J', b'Z', b' ', b' '];

pub fn parse_ghm_decision_tree(file_data: &[u8], table: &TableInfo) -> Result<Vec<GhmDecisionNode>> {
    if table.sections.len() != 1 {
        return Err(TableError::UnexpectedSectionCount {
            context: "GHM decision tree",
            expected: 1,
            found: table.sections.len() as u8,
        });
    }
    let section = &table.sections[0];
    if section.value_len != NODE_LEN {
        return Err(TableError::UnexpectedValueLen {
            context: "GHM decision tree node",
            expected: NODE_LEN,
            found: section.value_len,
        });
    }

    let mut nodes = Vec::with_capacity(section.values_count);
    for i in 0..section.values_count {
        let base = section.raw_offset + i * NODE_LEN;
        let function = file_data[base];
        let params = [file_data[base + 1], file_data[base + 2]];
        let children_count_raw = file_data[base + 3] as usize;
        let children_idx_raw = read_u16_be(file_data, base + 4)
            .ok_or(TableError::Truncated { context: "GHM decision tree node" })? as usize;

        let node = if function != 12 {
            let (children_idx, children_count) = if function == 20 {
                (
                    children_idx_raw + ((params[0] as usize) << 8) + params[1] as usize,
                    1,
                )
            } else {
                (children_idx_raw, children_count_raw)
            };

            if children_count == 0 || children_idx > section.values_count
                || children_count > section.values_count - children_idx
            {
                return Err(TableError::InvalidTreeReference { node: i });
            }

            GhmDecisionNode::Test {
                function,
                params,
                children_idx,
                children_count,
            }
        } else {
            let code = GhmCode {
                cmd: params[1],
                kind: CHARS1[(children_idx_raw / 1000) % 10],
                seq: ((children_idx_raw / 10) % 100) as u8,
                mode: CHARS4[children_idx_raw % 10],
            };
            GhmDecisionNode::Terminal { code, error: params[0] }
        };

        nodes.push(node);
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{SectionInfo, TableKind};
    use drg_schemas::Date;

    fn table_with_section(section: SectionInfo) -> TableInfo {
        TableInfo {
            kind: TableKind::GhmDecisionTree,
            raw_name: "ARBREDEC".into(),
            build_date: Date::new(2024, 1, 1),
            version: (11, 14),
            limit_dates: (Date::new(2024, 1, 1), Date::new(2024, 12, 31)),
            sections: vec![section],
        }
    }

    #[test]
    fn parses_a_single_test_node() {
        let data = vec![3u8, 10, 20, 1, 0, 0];
        let table = table_with_section(SectionInfo {
            raw_offset: 0,
            raw_len: NODE_LEN,
            values_count: 1,
            value_len: NODE_LEN,
        });
        let nodes = parse_ghm_decision_tree(&data, &table).unwrap();
        assert_eq!(nodes.len(), 1);
        match nodes[0] {
            GhmDecisionNode::Test { function, children_count, .. } => {
                assert_eq!(function, 3);
                assert_eq!(children_count, 1);
            }
            _ => panic!("expected test node"),
        }
    }

    #[test]
    fn rejects_out_of_range_children() {
        let data = vec![3u8, 0, 0, 5, 0, 0];
        let table = table_with_section(SectionInfo {
            raw_offset: 0,
            raw_len: NODE_LEN,
            values_count: 1,
            value_len: NODE_LEN,
        });
        assert!(parse_ghm_decision_tree(&data, &table).is_err());
    }
}
