use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use drg_classify::summarize;
use drg_pricing::PricingSet;
use drg_schemas::{Date, GhsCode};
use drg_stays::{ClusterMode, Stay};
use drg_tables::{load_table_set, TableSet};

#[derive(Parser)]
#[command(name = "drg")]
#[command(about = "French MCO/DRG classification and GHS pricing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump a table's parsed records as JSON lines.
    Dump {
        #[arg(long)]
        tables: PathBuf,
        kind: DumpKind,
    },
    /// Print per-root / per-GHM parameters resolved from the active index.
    Info {
        #[arg(long)]
        tables: PathBuf,
        /// A GHM root code (e.g. `04C02`) or a full GHM code (e.g. `04C02J`).
        code: String,
    },
    /// Print each table index's validity interval and which table kinds
    /// changed relative to the previous index.
    Indexes {
        #[arg(long)]
        tables: PathBuf,
    },
    /// Enumerate codes known to the index covering `--date`.
    List {
        #[arg(long)]
        tables: PathBuf,
        #[arg(long)]
        date: String,
        kind: ListKind,
    },
    /// Resolve and print a GHS price on a given date and sector.
    Pricing {
        #[arg(long)]
        file: PathBuf,
        ghs: u16,
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "public")]
        sector: Sector,
    },
    /// Ingest a stay array, classify and price each cluster, print one JSON
    /// result per cluster.
    Summarize {
        #[arg(long)]
        tables: PathBuf,
        #[arg(long)]
        pricing: Option<PathBuf>,
        #[arg(long)]
        stays: PathBuf,
        #[arg(long, default_value = "public")]
        sector: Sector,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum DumpKind {
    Tree,
    Diagnoses,
    Procedures,
    GhmRoots,
    Severity,
    Ghs,
    Authorizations,
    SrcPairs,
}

#[derive(Copy, Clone, ValueEnum)]
enum ListKind {
    Diagnoses,
    Procedures,
    Ghs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Sector {
    Public,
    Private,
}

impl Sector {
    fn index(self) -> usize {
        match self {
            Sector::Public => 0,
            Sector::Private => 1,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Dump { tables, kind } => cmd_dump(&tables, kind),
        Commands::Info { tables, code } => cmd_info(&tables, &code),
        Commands::Indexes { tables } => cmd_indexes(&tables),
        Commands::List { tables, date, kind } => cmd_list(&tables, &date, kind),
        Commands::Pricing { file, ghs, date, sector } => cmd_pricing(&file, ghs, &date, sector),
        Commands::Summarize { tables, pricing, stays, sector } => {
            cmd_summarize(&tables, pricing.as_deref(), &stays, sector, ClusterMode::StayModes)
        }
    }
}

fn load_tables_dir(dir: &std::path::Path) -> Result<TableSet> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read table directory {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let bytes = fs::read(entry.path()).with_context(|| format!("read table file {name}"))?;
        files.push((name, bytes));
    }
    load_table_set(&files).map_err(Into::into)
}

fn parse_date(s: &str) -> Result<Date> {
    Date::parse(s).with_context(|| format!("invalid date: {s}"))
}

fn cmd_dump(tables_dir: &std::path::Path, kind: DumpKind) -> Result<()> {
    let set = load_tables_dir(tables_dir)?;
    let Some(table) = set.find_index(Date::default()) else {
        bail!("no table index loaded from {}", tables_dir.display());
    };

    macro_rules! dump_all {
        ($iter:expr) => {
            for record in $iter {
                println!("{}", serde_json::to_string(&record)?);
            }
        };
    }

    match kind {
        DumpKind::Tree => dump_all!(table.ghm_nodes()),
        DumpKind::Diagnoses => dump_all!(table.diagnoses()),
        DumpKind::Procedures => dump_all!(table.procedures()),
        DumpKind::GhmRoots => dump_all!(table.ghm_roots()),
        DumpKind::Severity => dump_all!(table.gnn_cells()),
        DumpKind::Ghs => dump_all!(table.ghs()),
        DumpKind::Authorizations => dump_all!(table.authorizations()),
        DumpKind::SrcPairs => dump_all!(table.src_pairs(0)),
    }
    Ok(())
}

fn cmd_info(tables_dir: &std::path::Path, code: &str) -> Result<()> {
    let set = load_tables_dir(tables_dir)?;
    let Some(table) = set.find_index(Date::default()) else {
        bail!("no table index loaded from {}", tables_dir.display());
    };

    if let Some(ghm) = drg_schemas::GhmCode::parse(code) {
        let Some(root) = table.find_ghm_root(ghm.root()) else {
            bail!("no root parameters found for {}", ghm.root());
        };
        println!("{}", serde_json::to_string_pretty(&json!({
            "ghm": ghm.to_string(),
            "root": root,
            "severity": ghm.severity(),
        }))?);
        return Ok(());
    }

    let Some(root_code) = drg_schemas::GhmRootCode::parse(code) else {
        bail!("'{code}' is neither a valid GHM root code nor a full GHM code");
    };
    let Some(root) = table.find_ghm_root(root_code) else {
        bail!("no root parameters found for {root_code}");
    };
    println!("{}", serde_json::to_string_pretty(root)?);
    Ok(())
}

/// Same kind ordering `TableIndex::changed_tables` bits are assigned in
/// (see `drg-tables::index::kind_ordinal`).
const CHANGED_KIND_NAMES: [&str; 8] = [
    "ghm_decision_tree",
    "diagnosis_table",
    "procedure_table",
    "ghm_root_table",
    "severity_table",
    "ghs_table",
    "authorization_table",
    "src_pair_table",
];

fn cmd_indexes(tables_dir: &std::path::Path) -> Result<()> {
    let set = load_tables_dir(tables_dir)?;
    for index in set.indexes() {
        let changed: Vec<&str> = CHANGED_KIND_NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| index.changed_tables & (1 << bit) != 0)
            .map(|(_, name)| *name)
            .collect();
        println!(
            "{}",
            serde_json::to_string(&json!({
                "start": index.limit_dates.0.to_string(),
                "end": index.limit_dates.1.to_string(),
                "changed_tables": changed,
            }))?
        );
    }
    Ok(())
}

fn cmd_list(tables_dir: &std::path::Path, date: &str, kind: ListKind) -> Result<()> {
    let set = load_tables_dir(tables_dir)?;
    let date = parse_date(date)?;
    let Some(table) = set.find_index(date) else {
        bail!("no table index covers {date}");
    };

    match kind {
        ListKind::Diagnoses => {
            for d in table.diagnoses() {
                println!("{}", d.code);
            }
        }
        ListKind::Procedures => {
            for p in table.procedures() {
                println!("{}", p.code);
            }
        }
        ListKind::Ghs => {
            for g in table.ghs() {
                for sector_code in g.ghs {
                    if sector_code != 0 {
                        println!("{}", GhsCode(sector_code));
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_pricing(file: &std::path::Path, ghs: u16, date: &str, sector: Sector) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("read pricing file {}", file.display()))?;
    let set = PricingSet::load(&bytes)?;
    let date = parse_date(date)?;
    let ghs_code = GhsCode(ghs);

    let Some(pricing) = set.find(ghs_code, date) else {
        bail!("no pricing interval covers GHS {ghs} on {date}");
    };
    let sector_pricing = &pricing.sectors[sector.index()];
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "ghs": ghs,
            "date": date.to_string(),
            "sector": format!("{sector:?}"),
            "price_cents": sector_pricing.price_cents,
            "exh_cents": sector_pricing.exh_cents,
            "exb_cents": sector_pricing.exb_cents,
        }))?
    );
    Ok(())
}

fn cmd_summarize(
    tables_dir: &std::path::Path,
    pricing_file: Option<&std::path::Path>,
    stays_path: &std::path::Path,
    sector: Sector,
    mode: ClusterMode,
) -> Result<()> {
    let table_set = load_tables_dir(tables_dir)?;
    let pricing = pricing_file
        .map(|p| -> Result<PricingSet> {
            let bytes = fs::read(p).with_context(|| format!("read pricing file {}", p.display()))?;
            PricingSet::load(&bytes).map_err(Into::into)
        })
        .transpose()?;

    let stays_json = fs::read_to_string(stays_path).with_context(|| format!("read stays {}", stays_path.display()))?;
    let stays: Vec<Stay> = serde_json::from_str(&stays_json).context("parse stays JSON")?;

    let results = summarize(&table_set, &stays, mode, pricing.as_ref(), sector.index());
    for result in results {
        println!(
            "{}",
            serde_json::to_string(&json!({
                "cluster_len": result.cluster_len,
                "main_stay_index": result.main_stay_index,
                "ghm": result.ghm.to_string(),
                "errors": result.errors,
                "ghs": result.ghs.map(|g| g.ghs[sector.index()]),
                "price_cents": result.price_cents,
            }))?
        );
    }
    Ok(())
}
