//! Ties the classification pipeline together: cluster stay fragments,
//! aggregate each cluster, walk the GHM tree, apply severity, and resolve
//! a price.

mod find_ghs;
mod summarize;

pub use find_ghs::find_ghs;
pub use summarize::{classify, summarize, summarize_parallel, SummarizeResult};

#[cfg(test)]
mod tests {
    use super::*;
    use drg_schemas::{Date, DiagnosisCode, GhmCode, Sex};
    use drg_stays::{ClusterMode, EntryInfo, ExitInfo, Stay};
    use drg_tables::TableSet;

    fn stay(id: u32, entry: (i16, i8, i8), exit: (i16, i8, i8)) -> Stay {
        Stay {
            stay_id: id,
            bill_id: id,
            birthdate: Date::new(2000, 1, 1),
            sex: Sex::Male,
            entry_date: Date::new(entry.0, entry.1, entry.2),
            exit_date: Date::new(exit.0, exit.1, exit.2),
            entry: EntryInfo { mode: 8, origin: 0 },
            exit: ExitInfo { mode: 8, destination: 0 },
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
    fn summarize_reports_missing_table_as_error_502() {
        let stays = vec![stay(1, (2024, 1, 1), (2024, 1, 5))];
        let empty_set = TableSet::default(); // no indexes at all
        let results = summarize(&empty_set, &stays, ClusterMode::StayModes, None, 0);
        assert_eq!(results.len(), 1);
        assert!(results[0].errors.contains(&502));
        assert!(results[0].agg.is_none());
    }

    #[test]
    fn summarize_classifies_a_single_stay_cluster_on_empty_tables() {
        let stays = vec![stay(1, (2024, 1, 1), (2024, 1, 5))];
        let set = TableSet::empty();
        let results = summarize(&set, &stays, ClusterMode::StayModes, None, 0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].cluster_len, 1);
        assert!(results[0].agg.is_some());
        // An empty tree reports error 4 and the 90Z03Z fallback code.
        assert!(results[0].errors.contains(&4));
        assert_eq!(results[0].ghm, GhmCode::parse("90Z03Z").unwrap());
        assert!(results[0].price_cents.is_none());
    }

    #[test]
    fn summarize_parallel_matches_sequential_on_multiple_clusters() {
        let stays = vec![
            stay(1, (2024, 1, 1), (2024, 1, 3)),
            stay(2, (2024, 2, 1), (2024, 2, 4)),
            stay(3, (2024, 3, 1), (2024, 3, 6)),
            stay(4, (2024, 4, 1), (2024, 4, 2)),
        ];
        let set = TableSet::empty();
        let sequential = summarize(&set, &stays, ClusterMode::StayModes, None, 0);
        let parallel = summarize_parallel(&set, &stays, ClusterMode::StayModes, None, 0, 3);
        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a.ghm, b.ghm);
            assert_eq!(a.cluster_len, b.cluster_len);
        }
    }
}
