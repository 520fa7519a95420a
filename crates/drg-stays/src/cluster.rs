//! Partition an ordered stay sequence into RSS clusters. The only pass
//! allowed to look across stay fragments.

use crate::stay::Stay;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClusterMode {
    StayModes,
    BillId,
    Disable,
}

/// Consume the cluster starting at `stays[0]`, returning `(cluster, rest)`.
/// Panics if `stays` is empty — callers stop once the sequence is drained.
pub fn next_cluster(stays: &[Stay], mode: ClusterMode) -> (&[Stay], &[Stay]) {
    assert!(!stays.is_empty(), "next_cluster called on an empty sequence");

    let len = match mode {
        ClusterMode::Disable => 1,
        ClusterMode::StayModes => {
            let first = &stays[0];
            let mut n = 1;
            while n < stays.len() {
                let next = &stays[n];
                if next.stay_id == first.stay_id
                    && next.session_count == 0
                    && matches!(next.entry.mode, 0 | 6)
                {
                    n += 1;
                } else {
                    break;
                }
            }
            n
        }
        ClusterMode::BillId => {
            let first = &stays[0];
            let mut n = 1;
            if first.bill_id != 0 {
                while n < stays.len() && stays[n].bill_id == first.bill_id {
                    n += 1;
                }
            }
            n
        }
    };

    stays.split_at(len)
}

/// Split the whole sequence into clusters (P4: `concat(clusters) == stays`,
/// every cluster non-empty).
pub fn clusters(stays: &[Stay], mode: ClusterMode) -> Vec<&[Stay]> {
    let mut out = Vec::new();
    let mut rest = stays;
    while !rest.is_empty() {
        let (cluster, remainder) = next_cluster(rest, mode);
        out.push(cluster);
        rest = remainder;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stay::{EntryInfo, ExitInfo, Stay};
    use drg_schemas::{Date, DiagnosisCode, Sex};

    fn stay(id: u32, bill_id: u32, session_count: u16, entry_mode: u8) -> Stay {
        Stay {
            stay_id: id,
            bill_id,
            birthdate: Date::new(2000, 1, 1),
            sex: Sex::Male,
            entry_date: Date::new(2024, 1, 1),
            exit_date: Date::new(2024, 1, 1),
            entry: EntryInfo { mode: entry_mode, origin: 0 },
            exit: ExitInfo::default(),
            unit: None,
            session_count,
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
    fn stay_modes_groups_by_session_and_entry_mode() {
        let stays = vec![
            stay(1, 0, 0, 8),
            stay(1, 0, 0, 6),
            stay(1, 0, 0, 0),
            stay(2, 0, 0, 8),
        ];
        let groups = clusters(&stays, ClusterMode::StayModes);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn bill_id_groups_consecutive_nonzero_ids() {
        let stays = vec![stay(1, 10, 0, 0), stay(2, 10, 0, 0), stay(3, 11, 0, 0), stay(4, 11, 0, 0)];
        let groups = clusters(&stays, ClusterMode::BillId);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 2);
    }

    #[test]
    fn disable_mode_always_singletons() {
        let stays = vec![stay(1, 0, 0, 0), stay(1, 0, 0, 0)];
        let groups = clusters(&stays, ClusterMode::Disable);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn cover_is_total_and_clusters_nonempty() {
        let stays = vec![stay(1, 0, 0, 0), stay(1, 0, 0, 6), stay(2, 0, 0, 0)];
        for mode in [ClusterMode::StayModes, ClusterMode::BillId, ClusterMode::Disable] {
            let groups = clusters(&stays, mode);
            assert!(groups.iter().all(|g| !g.is_empty()));
            let total: usize = groups.iter().map(|g| g.len()).sum();
            assert_eq!(total, stays.len());
        }
    }
}
