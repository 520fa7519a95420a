//! Merge a cluster of stay fragments into the single aggregate the tree
//! interpreter and severity adjuster classify.

use drg_schemas::{Date, DiagnosisCode, GhmCode, Sex, UnitCode};
use drg_stays::{EntryInfo, ExitInfo, Procedure, Stay};
use drg_tables::TableView;

use crate::main_stay::find_main_stay;

/// A cluster's combined identity and clinical picture: the fields the tree
/// interpreter and severity adjuster read directly, separate from the
/// `diagnoses`/`procedures` pools carried alongside in [`AggregateOutcome`].
#[derive(Clone, Debug)]
pub struct StayAggregate {
    pub birthdate: Date,
    pub sex: Sex,
    pub entry_date: Date,
    pub exit_date: Date,
    pub entry: EntryInfo,
    pub exit: ExitInfo,
    pub unit: Option<UnitCode>,
    pub session_count: u16,
    pub igs2: Option<u16>,
    pub gestational_age: Option<u16>,
    pub newborn_weight: Option<u16>,
    pub main_diagnosis: DiagnosisCode,
    pub linked_diagnosis: Option<DiagnosisCode>,
    /// Sum of every fragment's length of stay, in days.
    pub duration: i64,
    pub age: i32,
}

pub struct AggregateOutcome {
    pub agg: StayAggregate,
    /// Associated diagnoses pooled across every fragment, sorted and
    /// deduplicated. Does not include `main_diagnosis`/`linked_diagnosis`.
    pub diagnoses: Vec<DiagnosisCode>,
    /// Procedures pooled across fragments; same `(code, phase)` entries are
    /// merged, OR-ing their activity bits and summing counts up to 9999.
    pub procedures: Vec<Procedure>,
    pub errors: Vec<i16>,
    /// `90Z00Z`, set when the cluster fails a basic sanity check (missing
    /// main diagnosis, missing/malformed birthdate, fragments disagreeing
    /// on birthdate or sex). The caller skips classification when this is set.
    pub error_ghm: Option<GhmCode>,
    /// Index within the cluster of the fragment the main-stay picker chose
    /// (always `0` for single-fragment clusters). Downstream pricing reads
    /// authorization/age fields off this fragment.
    pub main_stay_index: usize,
}

const ERR_MISSING_BIRTHDATE: i16 = 13;
const ERR_MALFORMED_BIRTHDATE: i16 = 14;
const ERR_MISSING_MAIN_DIAGNOSIS: i16 = 40;
const ERR_INVALID_BIRTHDATE: i16 = 39;
const ERR_MISMATCHED_BIRTHDATE: i16 = 45;
const ERR_MISMATCHED_SEX: i16 = 46;

/// Merge `cluster` (one or more stay fragments belonging to the same RSS
/// unit) into a single [`StayAggregate`], picking a main stay by
/// [`find_main_stay`] when the cluster has more than one fragment.
pub fn aggregate(table: &TableView<'_>, cluster: &[Stay]) -> AggregateOutcome {
    assert!(!cluster.is_empty(), "aggregate called on an empty cluster");

    let mut errors = Vec::new();
    let mut valid = true;

    let first = &cluster[0];
    let last = &cluster[cluster.len() - 1];

    let mut igs2 = first.igs2;
    let mut gestational_age = first.gestational_age;
    let mut duration = 0i64;
    for stay in cluster {
        if !stay.main_diagnosis.is_valid() {
            errors.push(ERR_MISSING_MAIN_DIAGNOSIS);
            valid = false;
        }
        if let Some(v) = stay.gestational_age {
            if gestational_age.map(|cur| v > cur).unwrap_or(true) {
                gestational_age = Some(v);
            }
        }
        if let Some(v) = stay.igs2 {
            if igs2.map(|cur| v > cur).unwrap_or(true) {
                igs2 = Some(v);
            }
        }
        duration += stay.duration_days();
    }

    if first.birthdate.is_zero() {
        if first.errors.contains(&ERR_MALFORMED_BIRTHDATE) {
            errors.push(ERR_MALFORMED_BIRTHDATE);
        } else {
            errors.push(ERR_MISSING_BIRTHDATE);
        }
        valid = false;
    } else if !first.birthdate.is_valid() {
        errors.push(ERR_INVALID_BIRTHDATE);
        valid = false;
    }
    for stay in &cluster[1..] {
        if stay.birthdate != first.birthdate {
            errors.push(ERR_MISMATCHED_BIRTHDATE);
            valid = false;
        }
        if stay.sex != first.sex {
            errors.push(ERR_MISMATCHED_SEX);
            valid = false;
        }
    }

    let mut diagnoses: Vec<DiagnosisCode> = cluster
        .iter()
        .flat_map(|s| s.associated_diagnoses.iter().copied())
        .collect();
    diagnoses.sort();
    diagnoses.dedup();

    let mut procedures: Vec<Procedure> = Vec::new();
    for stay in cluster {
        for proc in &stay.procedures {
            match procedures.iter_mut().find(|p| p.code == proc.code && p.phase == proc.phase) {
                Some(existing) => {
                    existing.activities |= proc.activities;
                    existing.count = existing.count.saturating_add(proc.count).min(9999);
                }
                None => procedures.push(proc.clone()),
            }
        }
    }
    procedures.sort_by_key(|p| (p.code, p.phase));

    let (main_diagnosis, linked_diagnosis, main_stay_index) = if cluster.len() > 1 {
        let idx = find_main_stay(table, cluster, duration);
        (cluster[idx].main_diagnosis, cluster[idx].linked_diagnosis, idx)
    } else {
        (first.main_diagnosis, first.linked_diagnosis, 0)
    };

    let agg = StayAggregate {
        birthdate: first.birthdate,
        sex: first.sex,
        entry_date: first.entry_date,
        exit_date: last.exit_date,
        entry: first.entry,
        exit: last.exit,
        unit: first.unit,
        session_count: first.session_count,
        igs2,
        gestational_age,
        newborn_weight: first.newborn_weight,
        main_diagnosis,
        linked_diagnosis,
        duration,
        age: compute_age(first.entry_date, first.birthdate),
    };

    let error_ghm = (!valid).then(|| GhmCode::parse("90Z00Z").expect("literal GHM code always parses"));

    AggregateOutcome { agg, diagnoses, procedures, errors, error_ghm, main_stay_index }
}

/// Age in whole years at `at`, subtracting one when `at`'s month/day falls
/// before the birth month/day.
fn compute_age(at: Date, birthdate: Date) -> i32 {
    let mut years = at.year as i32 - birthdate.year as i32;
    if (at.month, at.day) < (birthdate.month, birthdate.day) {
        years -= 1;
    }
    years.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drg_schemas::ProcedureCode;

    fn base_stay(id: u32) -> Stay {
        Stay {
            stay_id: id,
            bill_id: 0,
            birthdate: Date::new(2000, 6, 1),
            sex: Sex::Male,
            entry_date: Date::new(2024, 3, 1),
            exit_date: Date::new(2024, 3, 1),
            entry: EntryInfo::default(),
            exit: ExitInfo::default(),
            unit: None,
            session_count: 0,
            igs2: None,
            gestational_age: None,
            newborn_weight: None,
            last_menstrual_period: None,
            main_diagnosis: DiagnosisCode::parse("I10").unwrap(),
            linked_diagnosis: None,
            associated_diagnoses: Vec::new(),
            procedures: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn compute_age_matches_stay_age_years() {
        assert_eq!(compute_age(Date::new(2024, 3, 1), Date::new(2000, 6, 1)), 23);
        assert_eq!(compute_age(Date::new(2024, 7, 1), Date::new(2000, 6, 1)), 24);
    }

    #[test]
    fn single_fragment_cluster_keeps_its_own_identity() {
        let set = drg_tables::TableSet::empty();
        let table = set.find_index(Date::new(2024, 3, 1)).unwrap();
        let cluster = [base_stay(1)];
        let outcome = aggregate(&table, &cluster);
        assert_eq!(outcome.agg.main_diagnosis.as_str(), "I10");
        assert!(outcome.error_ghm.is_none());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn missing_main_diagnosis_and_birthdate_flag_as_invalid() {
        let mut stay = base_stay(1);
        stay.main_diagnosis = DiagnosisCode::default();
        stay.birthdate = Date::default();
        let cluster = [stay];
        let set = drg_tables::TableSet::empty();
        let table = set.find_index(Date::new(2024, 3, 1)).unwrap();
        let outcome = aggregate(&table, &cluster);
        assert!(outcome.errors.contains(&ERR_MISSING_MAIN_DIAGNOSIS));
        assert!(outcome.errors.contains(&ERR_MISSING_BIRTHDATE));
        assert_eq!(outcome.error_ghm, GhmCode::parse("90Z00Z"));
    }

    #[test]
    fn procedures_from_different_fragments_merge_by_code_and_phase() {
        let mut a = base_stay(1);
        a.entry_date = Date::new(2024, 3, 1);
        a.exit_date = Date::new(2024, 3, 2);
        a.procedures.push(Procedure {
            code: ProcedureCode::parse("AAAA001").unwrap(),
            phase: 0,
            date: Date::new(2024, 3, 1),
            count: 1,
            activities: 0x1,
        });
        let mut b = base_stay(1);
        b.entry_date = Date::new(2024, 3, 2);
        b.exit_date = Date::new(2024, 3, 3);
        b.procedures.push(Procedure {
            code: ProcedureCode::parse("AAAA001").unwrap(),
            phase: 0,
            date: Date::new(2024, 3, 2),
            count: 2,
            activities: 0x2,
        });
        let cluster = [a, b];
        let set = drg_tables::TableSet::empty();
        let table = set.find_index(Date::new(2024, 3, 1)).unwrap();
        let outcome = aggregate(&table, &cluster);
        assert_eq!(outcome.procedures.len(), 1);
        assert_eq!(outcome.procedures[0].count, 3);
        assert_eq!(outcome.procedures[0].activities, 0x3);
        assert_eq!(outcome.agg.duration, 2);
        assert_eq!(outcome.agg.exit_date, Date::new(2024, 3, 3));
    }
}
