//! Pick the fragment within a multi-stay cluster whose main/linked
//! diagnosis represents the cluster as a whole.

use drg_schemas::DiagnosisCode;
use drg_stays::Stay;
use drg_tables::TableView;

/// Discharge-circumstance prefixes ("supervision of pregnancy") that force
/// the longest such fragment to win outright, ahead of the score pass.
const ZX_PREFIXES: [&str; 3] = ["Z515", "Z502", "Z503"];

fn is_zx_main_diagnosis(code: DiagnosisCode) -> bool {
    ZX_PREFIXES
        .iter()
        .any(|p| DiagnosisCode::parse(p).is_some_and(|prefix| prefix.matches(code)))
}

/// Pick the main-stay fragment out of `stays` (a cluster with at least two
/// fragments), returning its index within `stays`. `duration` is the
/// cluster's total length of stay in days, used by the procedure-priority
/// override.
pub fn find_main_stay(table: &TableView<'_>, stays: &[Stay], duration: i64) -> usize {
    let mut max_duration = -1i64;
    let mut zx_stay: Option<usize> = None;
    let mut zx_duration = -1i64;
    let mut trauma_stay: Option<usize> = None;
    let mut last_trauma_idx: Option<usize> = None;
    let mut ignore_trauma = false;
    let mut score_stay: Option<usize> = None;
    let mut base_score: i64 = 0;
    let mut min_score = i64::MAX;

    for (i, stay) in stays.iter().enumerate() {
        let stay_duration = stay.duration_days();
        let mut stay_score = base_score;

        let mut proc_priority = 0u8;
        let mut forces_main = false;
        for proc in &stay.procedures {
            let Some(info) = table.find_procedure(proc.code, proc.phase, proc.date) else { continue };
            let b0 = info.bytes.first().copied().unwrap_or(0);
            let b23 = info.bytes.get(23).copied().unwrap_or(0);
            if b0 & 0x80 != 0 && b23 & 0x80 == 0 {
                forces_main = true;
                break;
            }
            let b38 = info.bytes.get(38).copied().unwrap_or(0);
            let b39 = info.bytes.get(39).copied().unwrap_or(0);
            if proc_priority < 3 && b38 & 0x2 != 0 {
                proc_priority = 3;
            } else if proc_priority < 2 && duration <= 1 && b39 & 0x80 != 0 {
                proc_priority = 2;
            } else if proc_priority < 1 && duration == 0 && b39 & 0x40 != 0 {
                proc_priority = 1;
            }
        }
        if forces_main {
            return i;
        }
        match proc_priority {
            3 => stay_score -= 999_999,
            2 => stay_score -= 99_999,
            1 => stay_score -= 9_999,
            _ => {}
        }

        if stay_duration > zx_duration && stay_duration >= max_duration {
            if is_zx_main_diagnosis(stay.main_diagnosis) {
                zx_stay = Some(i);
                zx_duration = stay_duration;
            } else {
                zx_stay = None;
            }
        }

        let byte21 = table.diagnosis_byte(stay.sex, stay.main_diagnosis, 21);

        if !ignore_trauma {
            if byte21 & 0x4 != 0 {
                last_trauma_idx = Some(i);
                if stay_duration > max_duration {
                    trauma_stay = Some(i);
                }
            } else {
                ignore_trauma = true;
            }
        }

        if byte21 & 0x20 != 0 {
            stay_score += 150;
        } else if stay_duration >= 2 {
            base_score += 100;
        }
        if stay_duration == 0 {
            stay_score += 2;
        } else if stay_duration == 1 {
            stay_score += 1;
        }
        if byte21 & 0x2 != 0 {
            stay_score += 201;
        }

        if stay_score < min_score {
            score_stay = Some(i);
            min_score = stay_score;
        }
        if stay_duration > max_duration {
            max_duration = stay_duration;
        }
    }

    if let Some(i) = zx_stay {
        return i;
    }
    // Positional comparison, not a value comparison: "the last fragment
    // carrying the trauma diagnosis occurs at or after the lowest-score
    // fragment" — `None` sorts before any `Some` index, same as a null
    // pointer would sort before any real stay address.
    if last_trauma_idx >= score_stay {
        if let Some(i) = trauma_stay {
            return i;
        }
    }
    score_stay.expect("cluster is non-empty: first stay always sets score_stay")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zx_prefixes_match_longer_codes() {
        assert!(is_zx_main_diagnosis(DiagnosisCode::parse("Z515").unwrap()));
        assert!(is_zx_main_diagnosis(DiagnosisCode::parse("Z5029").unwrap()));
        assert!(!is_zx_main_diagnosis(DiagnosisCode::parse("Z510").unwrap()));
        assert!(!is_zx_main_diagnosis(DiagnosisCode::parse("I10").unwrap()));
    }
}
