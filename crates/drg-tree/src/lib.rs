//! Interpret the GHM decision tree: walk numbered test nodes from the root
//! until a terminal node assigns a GHM code.

use drg_aggregate::StayAggregate;
use drg_schemas::{DiagnosisCode, GhmCode};
use drg_stays::Procedure;
use drg_tables::{GhmDecisionNode, TableView};

const ERR_EMPTY_OR_LOOPING_TREE: i16 = 4;
const ERR_TEST_OUT_OF_RANGE: i16 = 4;

/// Mutable state threaded through the test functions: the main/linked
/// diagnosis can be swapped mid-walk (function 34) and the newborn-weight
/// cell is memoized once computed (function 39).
struct TreeContext<'a> {
    agg: &'a StayAggregate,
    diagnoses: &'a [DiagnosisCode],
    procedures: &'a [Procedure],
    main_diagnosis: DiagnosisCode,
    linked_diagnosis: DiagnosisCode,
    gnn_cache: u16,
}

/// Walk the decision tree rooted at node 0 until a terminal GHM is
/// assigned, or the tree is malformed/looping (error 4, `90Z03Z`).
pub fn run_ghm_tree(
    table: &TableView<'_>,
    agg: &StayAggregate,
    diagnoses: &[DiagnosisCode],
    procedures: &[Procedure],
    errors: &mut Vec<i16>,
) -> GhmCode {
    let nodes = table.ghm_nodes();
    let mut ctx = TreeContext {
        agg,
        diagnoses,
        procedures,
        main_diagnosis: agg.main_diagnosis,
        linked_diagnosis: agg.linked_diagnosis.unwrap_or_default(),
        gnn_cache: 0,
    };

    let mut node_idx = 0usize;
    for _ in 0..=nodes.len() {
        let Some(node) = nodes.get(node_idx) else {
            errors.push(ERR_EMPTY_OR_LOOPING_TREE);
            return GhmCode::parse("90Z03Z").expect("literal GHM code always parses");
        };

        match *node {
            GhmDecisionNode::Test { function, params, children_idx, children_count } => {
                let result = execute_test(table, &mut ctx, function, params, errors);
                if result < 0 || result as usize >= children_count {
                    errors.push(ERR_TEST_OUT_OF_RANGE);
                    return GhmCode::parse("90Z03Z").expect("literal GHM code always parses");
                }
                node_idx = children_idx + result as usize;
            }
            GhmDecisionNode::Terminal { code, error } => {
                if error != 0 {
                    errors.push(error as i16);
                }
                return code;
            }
        }
    }

    errors.push(ERR_EMPTY_OR_LOOPING_TREE);
    GhmCode::parse("90Z03Z").expect("literal GHM code always parses")
}

fn execute_test(
    table: &TableView<'_>,
    ctx: &mut TreeContext<'_>,
    function: u8,
    params: [u8; 2],
    errors: &mut Vec<i16>,
) -> i32 {
    let sex = ctx.agg.sex;
    match function {
        0 | 1 => table.diagnosis_byte(sex, ctx.main_diagnosis, params[0] as usize) as i32,

        2 => {
            for proc in ctx.procedures {
                let byte = table.procedure_byte(proc.code, proc.phase, proc.date, params[0] as usize);
                if byte & params[1] != 0 {
                    return 1;
                }
            }
            0
        }

        3 => {
            if params[1] == 1 {
                let age_days = ctx.agg.entry_date - ctx.agg.birthdate;
                (age_days > params[0] as i64) as i32
            } else {
                (ctx.agg.age > params[0] as i32) as i32
            }
        }

        5 => {
            let byte = table.diagnosis_byte(sex, ctx.main_diagnosis, params[0] as usize);
            (byte & params[1] != 0) as i32
        }

        6 => {
            for &diag in ctx.diagnoses {
                if diag == ctx.main_diagnosis || diag == ctx.linked_diagnosis {
                    continue;
                }
                let byte = table.diagnosis_byte(sex, diag, params[0] as usize);
                if byte & params[1] != 0 {
                    return 1;
                }
            }
            0
        }

        7 => {
            for &diag in ctx.diagnoses {
                let byte = table.diagnosis_byte(sex, diag, params[0] as usize);
                if byte & params[1] != 0 {
                    return 1;
                }
            }
            0
        }

        9 => {
            let mut result = 0;
            for proc in ctx.procedures {
                if table.procedure_byte(proc.code, proc.phase, proc.date, 0) & 0x80 != 0 {
                    let byte = table.procedure_byte(proc.code, proc.phase, proc.date, params[0] as usize);
                    if byte & params[1] != 0 {
                        result = 1;
                    } else {
                        return 0;
                    }
                }
            }
            result
        }

        10 => {
            let mut matches = 0u32;
            for proc in ctx.procedures {
                let byte = table.procedure_byte(proc.code, proc.phase, proc.date, params[0] as usize);
                if byte & params[1] != 0 {
                    matches += 1;
                    if matches >= 2 {
                        return 1;
                    }
                }
            }
            0
        }

        13 => {
            let byte = table.diagnosis_byte(sex, ctx.main_diagnosis, params[0] as usize);
            (byte == params[1]) as i32
        }

        14 => (sex as i32 - 1 == params[0] as i32 - 49) as i32,

        18 => {
            let mut matches = 0u32;
            let mut special_matches = 0u32;
            for &diag in ctx.diagnoses {
                let byte = table.diagnosis_byte(sex, diag, params[0] as usize);
                if byte & params[1] != 0 {
                    matches += 1;
                    if diag == ctx.main_diagnosis || diag == ctx.linked_diagnosis {
                        special_matches += 1;
                    }
                    if matches >= 2 && matches > special_matches {
                        return 1;
                    }
                }
            }
            0
        }

        19 => match params[1] {
            0 => (ctx.agg.exit.mode == params[0]) as i32,
            1 => (ctx.agg.exit.destination == params[0]) as i32,
            2 => (ctx.agg.entry.mode == params[0]) as i32,
            3 => (ctx.agg.entry.origin == params[0]) as i32,
            _ => -1,
        },

        20 => 0,

        22 => {
            let param = combine_u16(params);
            (ctx.agg.duration < param as i64) as i32
        }

        26 => {
            let byte = table.diagnosis_byte(sex, ctx.linked_diagnosis, params[0] as usize);
            (byte & params[1] != 0) as i32
        }

        28 => {
            errors.push(params[0] as i16);
            0
        }

        29 => {
            let param = combine_u16(params);
            (ctx.agg.duration == param as i64) as i32
        }

        30 => {
            let param = combine_u16(params);
            (ctx.agg.session_count == param) as i32
        }

        33 => {
            for proc in ctx.procedures {
                if proc.activities & (1 << params[0]) != 0 {
                    return 1;
                }
            }
            0
        }

        34 => {
            if ctx.linked_diagnosis.is_valid() && Some(ctx.linked_diagnosis) == ctx.agg.linked_diagnosis {
                if let Some(info) = table.find_diagnosis(ctx.linked_diagnosis) {
                    let attrs = info.attributes[sex as usize - 1];
                    if attrs.cmd != 0 || attrs.jump != 3 {
                        std::mem::swap(&mut ctx.main_diagnosis, &mut ctx.linked_diagnosis);
                    }
                }
            }
            0
        }

        35 => (ctx.main_diagnosis != ctx.agg.main_diagnosis) as i32,

        36 => {
            for &diag in ctx.diagnoses {
                if diag == ctx.linked_diagnosis {
                    continue;
                }
                let byte = table.diagnosis_byte(sex, diag, params[0] as usize);
                if byte & params[1] != 0 {
                    return 1;
                }
            }
            0
        }

        38 => (ctx.gnn_cache >= params[0] as u16 && ctx.gnn_cache <= params[1] as u16) as i32,

        39 => {
            if ctx.gnn_cache == 0 {
                let gestational_age = match ctx.agg.gestational_age {
                    Some(0) | None => 99,
                    Some(age) => age,
                };
                for cell in table.gnn_cells() {
                    if cell.limits[0].contains(ctx.agg.newborn_weight.unwrap_or(0))
                        && cell.limits[1].contains(gestational_age)
                    {
                        ctx.gnn_cache = cell.value;
                        break;
                    }
                }
            }
            0
        }

        41 => {
            for &diag in ctx.diagnoses {
                let Some(info) = table.find_diagnosis(diag) else { continue };
                let attrs = info.attributes[sex as usize - 1];
                if attrs.cmd == params[0] && attrs.jump == params[1] {
                    return 1;
                }
            }
            0
        }

        42 => {
            let param = combine_u16(params);
            ctx.agg.newborn_weight.is_some_and(|w| w < param) as i32
        }

        43 => {
            for &diag in ctx.diagnoses {
                if diag == ctx.linked_diagnosis {
                    continue;
                }
                let Some(info) = table.find_diagnosis(diag) else { continue };
                let attrs = info.attributes[sex as usize - 1];
                if attrs.cmd == params[0] && attrs.jump == params[1] {
                    return 1;
                }
            }
            0
        }

        _ => -1,
    }
}

fn combine_u16(params: [u8; 2]) -> u16 {
    (params[0] as u16) << 8 | params[1] as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use drg_schemas::{Date, Sex};
    use drg_stays::{EntryInfo, ExitInfo};
    use drg_tables::TableSet;

    #[test]
    fn combine_u16_is_big_endian() {
        assert_eq!(combine_u16([0x01, 0x02]), 0x0102);
    }

    fn agg() -> StayAggregate {
        StayAggregate {
            birthdate: Date::new(2000, 1, 1),
            sex: Sex::Male,
            entry_date: Date::new(2024, 1, 1),
            exit_date: Date::new(2024, 1, 3),
            entry: EntryInfo { mode: 8, origin: 0 },
            exit: ExitInfo { mode: 9, destination: 0 },
            unit: None,
            session_count: 4,
            igs2: None,
            gestational_age: None,
            newborn_weight: None,
            main_diagnosis: DiagnosisCode::parse("I10").unwrap(),
            linked_diagnosis: None,
            duration: 2,
            age: 24,
        }
    }

    fn ctx<'a>(agg: &'a StayAggregate) -> TreeContext<'a> {
        TreeContext {
            agg,
            diagnoses: &[],
            procedures: &[],
            main_diagnosis: agg.main_diagnosis,
            linked_diagnosis: agg.linked_diagnosis.unwrap_or_default(),
            gnn_cache: 0,
        }
    }

    #[test]
    fn function_14_compares_sex_to_ascii_digit() {
        let a = agg();
        let set = TableSet::empty();
        let view = set.find_index(Date::new(2024, 1, 1)).unwrap();
        let mut c = ctx(&a);
        let mut errs = Vec::new();
        assert_eq!(execute_test(&view, &mut c, 14, [b'1', 0], &mut errs), 1);
        assert_eq!(execute_test(&view, &mut c, 14, [b'2', 0], &mut errs), 0);
    }

    #[test]
    fn function_19_reads_entry_and_exit_fields() {
        let a = agg();
        let set = TableSet::empty();
        let view = set.find_index(Date::new(2024, 1, 1)).unwrap();
        let mut c = ctx(&a);
        let mut errs = Vec::new();
        assert_eq!(execute_test(&view, &mut c, 19, [9, 0], &mut errs), 1); // exit.mode
        assert_eq!(execute_test(&view, &mut c, 19, [8, 2], &mut errs), 1); // entry.mode
        assert_eq!(execute_test(&view, &mut c, 19, [0, 7], &mut errs), -1); // unknown sub-case
    }

    #[test]
    fn function_22_29_30_compare_duration_and_sessions() {
        let a = agg();
        let set = TableSet::empty();
        let view = set.find_index(Date::new(2024, 1, 1)).unwrap();
        let mut c = ctx(&a);
        let mut errs = Vec::new();
        assert_eq!(execute_test(&view, &mut c, 22, [0, 3], &mut errs), 1); // 2 < 3
        assert_eq!(execute_test(&view, &mut c, 29, [0, 2], &mut errs), 1); // 2 == 2
        assert_eq!(execute_test(&view, &mut c, 30, [0, 4], &mut errs), 1); // session_count == 4
    }

    #[test]
    fn function_28_appends_literal_error_code() {
        let a = agg();
        let set = TableSet::empty();
        let view = set.find_index(Date::new(2024, 1, 1)).unwrap();
        let mut c = ctx(&a);
        let mut errs = Vec::new();
        assert_eq!(execute_test(&view, &mut c, 28, [77, 0], &mut errs), 0);
        assert_eq!(errs, vec![77]);
    }

    #[test]
    fn run_ghm_tree_reports_error_4_on_empty_tree() {
        let a = agg();
        let set = TableSet::empty();
        let view = set.find_index(Date::new(2024, 1, 1)).unwrap();
        let mut errs = Vec::new();
        let ghm = run_ghm_tree(&view, &a, &[], &[], &mut errs);
        assert_eq!(ghm, GhmCode::parse("90Z03Z").unwrap());
        assert!(errs.contains(&4));
    }
}
