//! Drive a stay sequence through clustering, aggregation, classification
//! and pricing: the entry point the CLI and any embedding caller use.

use drg_aggregate::{aggregate, StayAggregate};
use drg_pricing::{resolve_price, PricingSet};
use drg_schemas::GhmCode;
use drg_stays::{next_cluster, ClusterMode, Stay};
use drg_tables::{GhsInfo, TableSet, TableView};
use drg_tree::run_ghm_tree;

use crate::find_ghs::find_ghs;

const ERR_NO_TABLE_FOR_DATE: i16 = 502;

/// One cluster's classification outcome: the GHM, the errors collected
/// across every stage, and (when available) the resolved GHS and price.
pub struct SummarizeResult {
    pub cluster_len: usize,
    /// Index within the cluster of the fragment the main-stay picker chose.
    pub main_stay_index: usize,
    pub ghm: GhmCode,
    pub errors: Vec<i16>,
    /// `None` only when no table covers the cluster's exit date.
    pub agg: Option<StayAggregate>,
    pub ghs: Option<GhsInfo>,
    pub price_cents: Option<i64>,
}

fn error_ghm() -> GhmCode {
    GhmCode::parse("90Z03Z").expect("literal GHM code always parses")
}

/// Run the GHM tree then the severity adjuster, mirroring the two-stage
/// split the table-driven classifier and the escalation rules each own.
pub fn classify(
    table: &TableView<'_>,
    agg: &StayAggregate,
    diagnoses: &[drg_schemas::DiagnosisCode],
    procedures: &[drg_stays::Procedure],
    errors: &mut Vec<i16>,
) -> GhmCode {
    let ghm = run_ghm_tree(table, agg, diagnoses, procedures, errors);
    drg_severity::run_ghm_severity(table, agg, diagnoses, ghm, errors)
}

fn summarize_cluster(
    table_set: &TableSet,
    cluster: &[Stay],
    pricing: Option<&PricingSet>,
    sector: usize,
) -> SummarizeResult {
    let mut errors = Vec::new();
    let last_date = cluster.last().expect("cluster is non-empty").exit_date;

    let Some(table) = table_set.find_index(last_date) else {
        errors.push(ERR_NO_TABLE_FOR_DATE);
        return SummarizeResult {
            cluster_len: cluster.len(),
            main_stay_index: 0,
            ghm: error_ghm(),
            errors,
            agg: None,
            ghs: None,
            price_cents: None,
        };
    };

    let outcome = aggregate(&table, cluster);
    let mut errors = outcome.errors;

    if let Some(ghm) = outcome.error_ghm {
        return SummarizeResult {
            cluster_len: cluster.len(),
            main_stay_index: outcome.main_stay_index,
            ghm,
            errors,
            agg: Some(outcome.agg),
            ghs: None,
            price_cents: None,
        };
    }

    let ghm = classify(&table, &outcome.agg, &outcome.diagnoses, &outcome.procedures, &mut errors);

    let ghs = find_ghs(&table, &outcome.agg, &outcome.diagnoses, &outcome.procedures, ghm, sector).copied();
    let price_cents = match (&ghs, pricing) {
        (Some(info), Some(set)) => {
            resolve_price(set.pricings(), info, sector, outcome.agg.exit_date, outcome.agg.duration)
        }
        _ => None,
    };

    SummarizeResult {
        cluster_len: cluster.len(),
        main_stay_index: outcome.main_stay_index,
        ghm,
        errors,
        agg: Some(outcome.agg),
        ghs,
        price_cents,
    }
}

/// Classify and price every cluster in `stays`, in order.
pub fn summarize(
    table_set: &TableSet,
    stays: &[Stay],
    mode: ClusterMode,
    pricing: Option<&PricingSet>,
    sector: usize,
) -> Vec<SummarizeResult> {
    let mut results = Vec::new();
    let mut remaining = stays;
    while !remaining.is_empty() {
        let (cluster, rest) = next_cluster(remaining, mode);
        remaining = rest;
        results.push(summarize_cluster(table_set, cluster, pricing, sector));
    }
    results
}

/// Same as [`summarize`], but partitions `stays` into contiguous,
/// cluster-aligned chunks and classifies each chunk on its own thread.
/// Results are returned in the original stay order.
pub fn summarize_parallel(
    table_set: &TableSet,
    stays: &[Stay],
    mode: ClusterMode,
    pricing: Option<&PricingSet>,
    sector: usize,
    thread_count: usize,
) -> Vec<SummarizeResult> {
    if thread_count <= 1 || stays.len() < 2 {
        return summarize(table_set, stays, mode, pricing, sector);
    }

    let chunk_target = stays.len().div_ceil(thread_count).max(1);
    let mut chunks: Vec<&[Stay]> = Vec::new();
    let mut remaining = stays;
    while !remaining.is_empty() {
        // Accumulate whole clusters until the chunk reaches its target
        // size, so no cluster is ever split across two threads.
        let mut take = 0usize;
        let mut cursor = remaining;
        while take < chunk_target && !cursor.is_empty() {
            let (cluster, rest) = next_cluster(cursor, mode);
            take += cluster.len();
            cursor = rest;
        }
        let (chunk, rest) = remaining.split_at(take);
        chunks.push(chunk);
        remaining = rest;
    }

    let mut results = Vec::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| scope.spawn(|| summarize(table_set, chunk, mode, pricing, sector)))
            .collect();
        for handle in handles {
            results.extend(handle.join().expect("summarize worker thread panicked"));
        }
    });
    results
}
