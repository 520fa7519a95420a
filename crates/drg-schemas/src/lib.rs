//! Value types shared across the classification pipeline: dates and the
//! fixed-size codes (diagnosis, procedure, GHM, GHS, unit). Every type here
//! is `Copy` and allocation-free so the table loader, tree interpreter and
//! pricing resolver can pass them by value without cloning.

mod codes;
mod date;

pub use codes::{DiagnosisCode, GhmCode, GhmRootCode, GhsCode, ProcedureCode, Sex, UnitCode};
pub use date::Date;
