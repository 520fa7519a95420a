//! Assembling loaded tables into date-indexed views, and the accessors
//! (`TableSet::find_index`, `TableIndex::find_*`) that the classification
//! pipeline queries against.

use std::collections::HashMap;
use std::sync::Arc;

use drg_schemas::{Date, DiagnosisCode, GhmRootCode, ProcedureCode};

use crate::authorizations::{parse_authorization_table, AuthorizationInfo};
use crate::diagnoses::{parse_diagnosis_table, parse_exclusion_table, DiagnosisInfo, ExclusionInfo};
use crate::error::Result;
use crate::ghm_roots::{parse_ghm_root_table, GhmRootInfo};
use crate::ghm_tree::{parse_ghm_decision_tree, GhmDecisionNode};
use crate::ghs::{parse_ghs_table, GhsInfo};
use crate::procedures::{parse_procedure_table, ProcedureInfo};
use crate::raw::{parse_table_headers, TableInfo, TableKind};
use crate::severity::{parse_severity_section, ValueRangeCell2};
use crate::src_pairs::{parse_src_pair_table, SrcPair};

#[derive(Copy, Clone, Debug, Default)]
struct Slice {
    start: usize,
    len: usize,
}

impl Slice {
    fn of<T>(store: &[T], start: usize) -> Slice {
        Slice { start, len: store.len() - start }
    }

    fn get<T>(self, store: &[T]) -> &[T] {
        &store[self.start..self.start + self.len]
    }
}

#[derive(Default)]
struct TableStore {
    ghm_nodes: Vec<GhmDecisionNode>,
    diagnoses: Vec<DiagnosisInfo>,
    exclusions: Vec<ExclusionInfo>,
    procedures: Vec<ProcedureInfo>,
    ghm_roots: Vec<GhmRootInfo>,
    gnn_cells: Vec<ValueRangeCell2>,
    cma_cells: [Vec<ValueRangeCell2>; 3],
    ghs: Vec<GhsInfo>,
    authorizations: Vec<AuthorizationInfo>,
    src_pairs: [Vec<SrcPair>; 2],
}

/// A committed, self-consistent set of active tables over one date
/// interval. Every field other than `limit_dates` is an index range into
/// the owning `TableSet`'s store.
#[derive(Default)]
pub struct TableIndex {
    pub limit_dates: (Date, Date),
    ghm_nodes: Slice,
    diagnoses: Slice,
    exclusions: Slice,
    procedures: Slice,
    ghm_roots: Slice,
    gnn_cells: Slice,
    cma_cells: [Slice; 3],
    ghs: Slice,
    authorizations: Slice,
    src_pairs: [Slice; 2],
    /// Bit `i` set means the table kind at that `TableKind` ordinal changed
    /// relative to the previous index (used by `drg indexes`).
    pub changed_tables: u16,
}

/// Borrowed view combining one `TableIndex` with the `TableSet` store it
/// slices into. This is what the classification pipeline actually queries.
pub struct TableView<'a> {
    index: &'a TableIndex,
    store: &'a TableStore,
}

impl<'a> TableView<'a> {
    pub fn ghm_nodes(&self) -> &'a [GhmDecisionNode] {
        self.index.ghm_nodes.get(&self.store.ghm_nodes)
    }

    pub fn diagnoses(&self) -> &'a [DiagnosisInfo] {
        self.index.diagnoses.get(&self.store.diagnoses)
    }

    pub fn find_diagnosis(&self, code: DiagnosisCode) -> Option<&'a DiagnosisInfo> {
        self.diagnoses().iter().find(|d| d.code == code)
    }

    pub fn exclusion_set(&self, idx: u16) -> Option<&'a ExclusionInfo> {
        self.index.exclusions.get(&self.store.exclusions).get(idx as usize)
    }

    pub fn procedures(&self) -> &'a [ProcedureInfo] {
        self.index.procedures.get(&self.store.procedures)
    }

    pub fn find_procedure(&self, code: ProcedureCode, phase: u8, date: Date) -> Option<&'a ProcedureInfo> {
        self.procedures().iter().find(|p| {
            p.code == code && p.phase == phase && date >= p.limit_dates.0 && date < p.limit_dates.1
        })
    }

    /// Byte `offset` of `code`'s sex-specific attribute block, `0` when the
    /// code is invalid, unknown, or the block is shorter than `offset`.
    pub fn diagnosis_byte(&self, sex: drg_schemas::Sex, code: DiagnosisCode, offset: usize) -> u8 {
        if !code.is_valid() {
            return 0;
        }
        let Some(info) = self.find_diagnosis(code) else { return 0 };
        info.attributes[sex as usize - 1].raw.get(offset).copied().unwrap_or(0)
    }

    /// Byte `offset` of the `ProcedureInfo` record matching `proc`'s code,
    /// phase and date, `0` when no such record exists.
    pub fn procedure_byte(&self, code: ProcedureCode, phase: u8, date: Date, offset: usize) -> u8 {
        self.find_procedure(code, phase, date)
            .and_then(|p| p.bytes.get(offset))
            .copied()
            .unwrap_or(0)
    }

    pub fn ghm_roots(&self) -> &'a [GhmRootInfo] {
        self.index.ghm_roots.get(&self.store.ghm_roots)
    }

    pub fn find_ghm_root(&self, code: GhmRootCode) -> Option<&'a GhmRootInfo> {
        self.ghm_roots().iter().find(|r| r.code == code)
    }

    pub fn gnn_cells(&self) -> &'a [ValueRangeCell2] {
        self.index.gnn_cells.get(&self.store.gnn_cells)
    }

    pub fn cma_cells(&self, list: u8) -> &'a [ValueRangeCell2] {
        match list {
            1..=3 => self.index.cma_cells[list as usize - 1].get(&self.store.cma_cells[list as usize - 1]),
            _ => &[],
        }
    }

    pub fn ghs(&self) -> &'a [GhsInfo] {
        self.index.ghs.get(&self.store.ghs)
    }

    pub fn authorizations(&self) -> &'a [AuthorizationInfo] {
        self.index.authorizations.get(&self.store.authorizations)
    }

    pub fn src_pairs(&self, which: usize) -> &'a [SrcPair] {
        if which < 2 {
            self.index.src_pairs[which].get(&self.store.src_pairs[which])
        } else {
            &[]
        }
    }
}

/// The fully loaded set of binary tables, spanning every date interval
/// found across the input files.
#[derive(Default)]
pub struct TableSet {
    pub tables: Vec<TableInfo>,
    store: TableStore,
    indexes: Vec<TableIndex>,
}

impl TableSet {
    /// A set with no rows in any table, covering every calendar date.
    /// Exercises table-independent classification paths (single-fragment
    /// aggregation, the parts of the decision tree that never touch a
    /// lookup table) without loading real reference data.
    pub fn empty() -> TableSet {
        let mut set = TableSet::default();
        set.indexes.push(TableIndex {
            limit_dates: (Date::new(1, 1, 1), Date::new(9999, 12, 31)),
            ..Default::default()
        });
        set
    }

    /// The active index for `date`, or the most recent one when `date` is
    /// the zero sentinel (mirrors querying "the latest known tables").
    pub fn find_index(&self, date: Date) -> Option<TableView<'_>> {
        let index = if date.is_zero() {
            self.indexes.last()
        } else {
            self.indexes
                .iter()
                .rev()
                .find(|idx| date >= idx.limit_dates.0 && date < idx.limit_dates.1)
        }?;
        Some(TableView { index, store: &self.store })
    }

    pub fn indexes(&self) -> &[TableIndex] {
        &self.indexes
    }
}

const KIND_COUNT: usize = 9;

fn kind_ordinal(kind: TableKind) -> Option<usize> {
    match kind {
        TableKind::GhmDecisionTree => Some(0),
        TableKind::DiagnosisTable => Some(1),
        TableKind::ProcedureTable => Some(2),
        TableKind::GhmRootTable => Some(3),
        TableKind::SeverityTable => Some(4),
        TableKind::GhsTable => Some(5),
        TableKind::AuthorizationTable => Some(6),
        TableKind::SrcPairTable => Some(7),
        TableKind::Unknown => None,
    }
}

struct LoadedTable {
    info: TableInfo,
    bytes: Arc<Vec<u8>>,
}

/// Parse every table out of `files` (filename kept only for diagnostics)
/// and assemble the date-interval index described in the module docs.
pub fn load_table_set(files: &[(String, Vec<u8>)]) -> Result<TableSet> {
    let mut tables: Vec<TableInfo> = Vec::new();
    let mut loaded: Vec<LoadedTable> = Vec::new();

    for (filename, bytes) in files {
        let bytes = Arc::new(bytes.clone());
        let parsed = match parse_table_headers(&bytes) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(file = %filename, error = %err, "failed to parse table file");
                return Err(err);
            }
        };
        for info in parsed {
            if info.kind == TableKind::Unknown {
                tracing::debug!(file = %filename, name = %info.raw_name, "skipping unknown table kind");
            } else {
                loaded.push(LoadedTable { info: info.clone(), bytes: bytes.clone() });
            }
            tables.push(info);
        }
    }

    loaded.sort_by(|a, b| {
        (a.info.limit_dates.0, a.info.version, a.info.build_date).cmp(&(
            b.info.limit_dates.0,
            b.info.version,
            b.info.build_date,
        ))
    });

    let mut boundaries: Vec<Date> = Vec::new();
    for t in &loaded {
        boundaries.push(t.info.limit_dates.0);
        boundaries.push(t.info.limit_dates.1);
    }
    boundaries.sort();
    boundaries.dedup();

    let mut store = TableStore::default();
    let mut indexes = Vec::new();
    let mut cache: HashMap<(usize, usize), Slice> = HashMap::new();
    let mut cache_cma: HashMap<(usize, u8), Slice> = HashMap::new();
    let mut cache_src: HashMap<(usize, u8), Slice> = HashMap::new();
    let mut prev_active: [Option<usize>; KIND_COUNT] = [None; KIND_COUNT];

    for window in boundaries.windows(2) {
        let (lo, hi) = (window[0], window[1]);

        let mut active: [Option<usize>; KIND_COUNT] = [None; KIND_COUNT];
        for (i, table) in loaded.iter().enumerate() {
            if let Some(ord) = kind_ordinal(table.info.kind) {
                if table.info.limit_dates.0 <= lo && hi <= table.info.limit_dates.1 {
                    active[ord] = Some(i);
                }
            }
        }

        if active.iter().all(Option::is_none) {
            continue;
        }

        let mut index = TableIndex { limit_dates: (lo, hi), ..Default::default() };
        let mut changed_tables = 0u16;

        for ord in 0..KIND_COUNT {
            let Some(table_idx) = active[ord] else { continue };
            if prev_active[ord] != Some(table_idx) {
                changed_tables |= 1 << ord;
            }
            let table = &loaded[table_idx];

            match kind_ordinal(table.info.kind).unwrap() {
                0 => {
                    index.ghm_nodes = match cache.get(&(0, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.ghm_nodes.len();
                            let nodes = parse_ghm_decision_tree(&table.bytes, &table.info)?;
                            store.ghm_nodes.extend(nodes);
                            let slice = Slice::of(&store.ghm_nodes, start);
                            cache.insert((0, table_idx), slice);
                            slice
                        }
                    };
                }
                1 => {
                    index.diagnoses = match cache.get(&(1, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.diagnoses.len();
                            let diags = parse_diagnosis_table(&table.bytes, &table.info)?;
                            store.diagnoses.extend(diags);
                            let slice = Slice::of(&store.diagnoses, start);
                            cache.insert((1, table_idx), slice);
                            slice
                        }
                    };
                    index.exclusions = match cache.get(&(100, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.exclusions.len();
                            let excl = parse_exclusion_table(&table.bytes, &table.info)?;
                            store.exclusions.extend(excl);
                            let slice = Slice::of(&store.exclusions, start);
                            cache.insert((100, table_idx), slice);
                            slice
                        }
                    };
                }
                2 => {
                    index.procedures = match cache.get(&(2, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.procedures.len();
                            let procs = parse_procedure_table(&table.bytes, &table.info)?;
                            store.procedures.extend(procs);
                            let slice = Slice::of(&store.procedures, start);
                            cache.insert((2, table_idx), slice);
                            slice
                        }
                    };
                }
                3 => {
                    index.ghm_roots = match cache.get(&(3, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.ghm_roots.len();
                            let roots = parse_ghm_root_table(&table.bytes, &table.info)?;
                            store.ghm_roots.extend(roots);
                            let slice = Slice::of(&store.ghm_roots, start);
                            cache.insert((3, table_idx), slice);
                            slice
                        }
                    };
                }
                4 => {
                    index.gnn_cells = match cache.get(&(4, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.gnn_cells.len();
                            let cells = parse_severity_section(&table.bytes, &table.info, 0)?;
                            store.gnn_cells.extend(cells);
                            let slice = Slice::of(&store.gnn_cells, start);
                            cache.insert((4, table_idx), slice);
                            slice
                        }
                    };
                    for (i, slot) in index.cma_cells.iter_mut().enumerate() {
                        *slot = match cache_cma.get(&(table_idx, i as u8)) {
                            Some(slice) => *slice,
                            None => {
                                let start = store.cma_cells[i].len();
                                let cells = parse_severity_section(&table.bytes, &table.info, i + 1)?;
                                store.cma_cells[i].extend(cells);
                                let slice = Slice::of(&store.cma_cells[i], start);
                                cache_cma.insert((table_idx, i as u8), slice);
                                slice
                            }
                        };
                    }
                }
                5 => {
                    index.ghs = match cache.get(&(5, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.ghs.len();
                            let ghs = parse_ghs_table(&table.bytes, &table.info)?;
                            store.ghs.extend(ghs);
                            let slice = Slice::of(&store.ghs, start);
                            cache.insert((5, table_idx), slice);
                            slice
                        }
                    };
                }
                6 => {
                    index.authorizations = match cache.get(&(6, table_idx)) {
                        Some(slice) => *slice,
                        None => {
                            let start = store.authorizations.len();
                            let auths = parse_authorization_table(&table.bytes, &table.info)?;
                            store.authorizations.extend(auths);
                            let slice = Slice::of(&store.authorizations, start);
                            cache.insert((6, table_idx), slice);
                            slice
                        }
                    };
                }
                7 => {
                    for (i, slot) in index.src_pairs.iter_mut().enumerate() {
                        *slot = match cache_src.get(&(table_idx, i as u8)) {
                            Some(slice) => *slice,
                            None => {
                                let start = store.src_pairs[i].len();
                                let pairs = parse_src_pair_table(&table.bytes, &table.info, i)?;
                                store.src_pairs[i].extend(pairs);
                                let slice = Slice::of(&store.src_pairs[i], start);
                                cache_src.insert((table_idx, i as u8), slice);
                                slice
                            }
                        };
                    }
                }
                _ => {}
            }
        }

        index.changed_tables = changed_tables;
        prev_active = active;
        indexes.push(index);
    }

    Ok(TableSet { tables, store, indexes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_set() {
        let set = load_table_set(&[]).unwrap();
        assert!(set.indexes().is_empty());
        assert!(set.find_index(Date::new(2024, 1, 1)).is_none());
    }
}
