//! Pick the GHS eligible for a classified GHM, sector, and stay picture.

use drg_aggregate::StayAggregate;
use drg_schemas::DiagnosisCode;
use drg_schemas::GhmCode;
use drg_stays::Procedure;
use drg_tables::{AuthorizationKind, GhsInfo, TableView};

/// `(offset, mask)` of `(0, 0)` means "no filter on this field".
fn no_filter(offset: u8, mask: u8) -> bool {
    offset == 0 && mask == 0
}

fn passes_filters(
    table: &TableView<'_>,
    info: &GhsInfo,
    agg: &StayAggregate,
    diagnoses: &[DiagnosisCode],
    procedures: &[Procedure],
) -> bool {
    if !no_filter(info.main_diagnosis_offset, info.main_diagnosis_mask) {
        let byte = table.diagnosis_byte(agg.sex, agg.main_diagnosis, info.main_diagnosis_offset as usize);
        if byte & info.main_diagnosis_mask == 0 {
            return false;
        }
    }

    if !no_filter(info.diagnosis_offset, info.diagnosis_mask) {
        let matches = diagnoses.iter().any(|&diag| {
            table.diagnosis_byte(agg.sex, diag, info.diagnosis_offset as usize) & info.diagnosis_mask != 0
        });
        if !matches {
            return false;
        }
    }

    if !no_filter(info.proc_offset, info.proc_mask) {
        let matches = procedures.iter().any(|proc| {
            table.procedure_byte(proc.code, proc.phase, proc.date, info.proc_offset as usize) & info.proc_mask != 0
        });
        if !matches {
            return false;
        }
    }

    if info.minimal_duration != 0 && agg.duration < info.minimal_duration as i64 {
        return false;
    }
    if info.minimal_age != 0 && agg.age < info.minimal_age as i32 {
        return false;
    }

    if info.unit_authorization != 0
        && !table
            .authorizations()
            .iter()
            .any(|a| a.kind != AuthorizationKind::Bed && a.code == info.unit_authorization)
    {
        return false;
    }
    if info.bed_authorization != 0
        && !table
            .authorizations()
            .iter()
            .any(|a| a.kind == AuthorizationKind::Bed && a.code == info.bed_authorization)
    {
        return false;
    }

    true
}

/// Find the GHS eligible for `ghm` on `sector` (`0` public, `1` private)
/// given the aggregate's diagnoses/procedures pool. Entries are matched by
/// exact GHM code (root and severity mode both carry pricing weight) and
/// must carry a nonzero sector GHS number.
pub fn find_ghs<'a>(
    table: &TableView<'a>,
    agg: &StayAggregate,
    diagnoses: &[DiagnosisCode],
    procedures: &[Procedure],
    ghm: GhmCode,
    sector: usize,
) -> Option<&'a GhsInfo> {
    table
        .ghs()
        .iter()
        .find(|info| info.ghm == ghm && info.ghs[sector] != 0 && passes_filters(table, info, agg, diagnoses, procedures))
}
