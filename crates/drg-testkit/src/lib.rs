//! Synthetic binary-table and pricing-file builders for integration tests
//! elsewhere in the workspace. Nothing here is reachable from the
//! classification or pricing pipeline itself — it exists purely to let a
//! test assemble a byte-accurate `.tab` or NOEMI file without copying the
//! crate's own parsing logic into the test.

pub mod pricing;
pub mod tables;

pub use pricing::{pricing_file, pricing_record};
pub use tables::{
    authorization_record, build_table_file, ghm_terminal_node, ghm_test_node, ghs_record, SectionSpec,
    TableSpec,
};
