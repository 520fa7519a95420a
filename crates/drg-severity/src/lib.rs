//! Severity adjustment: turn the bare GHM root a tree walk produced into a
//! full GHM code by picking the mode letter/digit that carries severity
//! (ambulatory, short-stay, and the CMA/age/discharge-mode escalation
//! rules for the medical and obstetric roots).

use drg_aggregate::StayAggregate;
use drg_schemas::{DiagnosisCode, GhmCode};
use drg_tables::{DiagnosisAttributes, TableView};

const ERR_UNKNOWN_GHM_ROOT: i16 = 4;

/// Clamp a severity level to what `duration` (days) can support: level 3
/// needs at least 5 days, level 2 at least 4, level 1 at least 3.
fn limit_severity(duration: i64, severity: u8) -> u8 {
    let mut severity = severity;
    if severity == 3 && duration < 5 {
        severity = 2;
    }
    if severity == 2 && duration < 4 {
        severity = 1;
    }
    if severity == 1 && duration < 3 {
        severity = 0;
    }
    severity
}

/// A CMA diagnosis excludes a root-level severity bump when its own
/// exclusion set flags the given root's `(cma_exclusion_offset, mask)`.
fn root_excludes(attrs: &DiagnosisAttributes, offset: u8, mask: u8) -> bool {
    attrs.test(offset as usize, mask)
}

fn test_exclusion(table: &TableView<'_>, cma_exclusion_set_idx: u16, against_offset: u8, against_mask: u8) -> bool {
    table
        .exclusion_set(cma_exclusion_set_idx)
        .is_some_and(|excl| excl.test(against_offset, against_mask))
}

/// Assign `ghm`'s mode letter/digit from its root's severity rules.
/// Returns `90Z03Z` with error 4 if the root isn't in the loaded table.
pub fn run_ghm_severity(
    table: &TableView<'_>,
    agg: &StayAggregate,
    diagnoses: &[DiagnosisCode],
    ghm: GhmCode,
    errors: &mut Vec<i16>,
) -> GhmCode {
    let mut ghm = ghm;

    let Some(root_info) = table.find_ghm_root(ghm.root()) else {
        errors.push(ERR_UNKNOWN_GHM_ROOT);
        return GhmCode::parse("90Z03Z").expect("literal GHM code always parses");
    };

    if root_info.allow_ambulatory && agg.duration == 0 {
        ghm.mode = b'J';
    } else if root_info.short_duration_threshold != 0 && agg.duration < root_info.short_duration_threshold as i64 {
        ghm.mode = b'T';
    }

    if (b'A'..=b'D').contains(&ghm.mode) {
        let mut severity = ghm.mode - b'A';

        if root_info.childbirth_severity_list != 0 {
            let gestational_age = agg.gestational_age.unwrap_or(0);
            for cell in table.cma_cells(root_info.childbirth_severity_list) {
                if cell.limits[0].contains(gestational_age) && cell.limits[1].contains(severity as u16) {
                    severity = cell.value as u8;
                    break;
                }
            }
        }

        ghm.mode = b'A' + limit_severity(agg.duration, severity);
    } else if ghm.mode == 0 {
        let mut severity = 0u8;

        let main_info = table.find_diagnosis(agg.main_diagnosis);
        let linked_info = agg.linked_diagnosis.and_then(|d| table.find_diagnosis(d));

        for &diag in diagnoses {
            if diag == agg.main_diagnosis || Some(diag) == agg.linked_diagnosis {
                continue;
            }
            let Some(diag_info) = table.find_diagnosis(diag) else { continue };
            let attrs = &diag_info.attributes[agg.sex as usize - 1];

            let excluded_pediatric = (agg.age < 14 && attrs.test(19, 0x10))
                || (agg.age >= 2 && attrs.test(19, 0x8))
                || (agg.age >= 2 && diag.as_str().starts_with('P'));
            let excluded_by_root = root_excludes(attrs, root_info.cma_exclusion_offset, root_info.cma_exclusion_mask);
            let excluded_by_main = main_info.is_some_and(|m| {
                test_exclusion(table, diag_info.exclusion_set_idx, m.cma_exclusion_offset, m.cma_exclusion_mask)
            });
            let excluded_by_linked = linked_info.is_some_and(|l| {
                test_exclusion(table, diag_info.exclusion_set_idx, l.cma_exclusion_offset, l.cma_exclusion_mask)
            });

            if attrs.severity > severity
                && !excluded_pediatric
                && !excluded_by_root
                && !excluded_by_main
                && !excluded_by_linked
            {
                severity = attrs.severity;
            }
        }

        if agg.age >= root_info.old_age_threshold as i32 && severity < root_info.old_severity_limit {
            severity += 1;
        } else if agg.age < root_info.young_age_threshold as i32 && severity < root_info.young_severity_limit {
            severity += 1;
        } else if agg.exit.mode == 9 && severity == 0 {
            severity = 1;
        }

        ghm.mode = b'1' + limit_severity(agg.duration, severity);
    }

    ghm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_severity_clamps_by_duration() {
        assert_eq!(limit_severity(1, 3), 0);
        assert_eq!(limit_severity(3, 3), 1);
        assert_eq!(limit_severity(4, 3), 2);
        assert_eq!(limit_severity(5, 3), 3);
    }

    #[test]
    fn unknown_root_reports_error_and_error_ghm() {
        use drg_schemas::{Date, Sex};
        use drg_stays::{EntryInfo, ExitInfo};
        use drg_tables::TableSet;

        let set = TableSet::empty();
        let table = set.find_index(Date::new(2024, 1, 1)).unwrap();
        let agg = StayAggregate {
            birthdate: Date::new(2000, 1, 1),
            sex: Sex::Male,
            entry_date: Date::new(2024, 1, 1),
            exit_date: Date::new(2024, 1, 2),
            entry: EntryInfo::default(),
            exit: ExitInfo::default(),
            unit: None,
            session_count: 0,
            igs2: None,
            gestational_age: None,
            newborn_weight: None,
            main_diagnosis: DiagnosisCode::parse("I10").unwrap(),
            linked_diagnosis: None,
            duration: 1,
            age: 24,
        };
        let mut errors = Vec::new();
        let ghm = run_ghm_severity(&table, &agg, &[], GhmCode::parse("04M02Z").unwrap(), &mut errors);
        assert_eq!(ghm, GhmCode::parse("90Z03Z").unwrap());
        assert_eq!(errors, vec![4]);
    }
}
