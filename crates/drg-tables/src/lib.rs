//! Parsing and date-indexed assembly of the binary reference tables that
//! drive classification: the GHM decision tree, diagnosis/procedure
//! dictionaries, GHM root severity parameters, severity combination cells,
//! the GHS pricing-eligibility table, care authorizations, and the
//! diagnosis/procedure source-pair lists.
//!
//! [`load_table_set`] is the entry point: hand it the raw bytes of every
//! `.tab`-format file and it returns a [`TableSet`] that can be queried by
//! date with [`TableSet::find_index`].

mod authorizations;
mod diagnoses;
mod error;
mod ghm_roots;
mod ghm_tree;
mod ghs;
mod index;
mod procedures;
mod raw;
mod severity;
mod src_pairs;

pub use authorizations::{AuthorizationInfo, AuthorizationKind};
pub use diagnoses::{DiagnosisAttributes, DiagnosisInfo, ExclusionInfo};
pub use error::{Result, TableError};
pub use ghm_roots::GhmRootInfo;
pub use ghm_tree::GhmDecisionNode;
pub use ghs::GhsInfo;
pub use index::{load_table_set, TableIndex, TableSet, TableView};
pub use procedures::ProcedureInfo;
pub use raw::{SectionInfo, TableInfo, TableKind};
pub use severity::{lookup as severity_lookup, Range, ValueRangeCell2};
pub use src_pairs::SrcPair;
