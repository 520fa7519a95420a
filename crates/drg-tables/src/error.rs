use std::fmt;

/// Structural failure while parsing a binary table file. These never carry
/// classification data — a malformed file is a build-time failure, not a
/// per-stay classification error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// File is shorter than the smallest header/section structure requires.
    Truncated { context: &'static str },
    /// The main section header does not describe exactly one section.
    UnexpectedSectionCount { context: &'static str, expected: u8, found: u8 },
    /// Version string could not be parsed, or is older than supported.
    UnsupportedVersion { found: String },
    /// A section's declared `value_len` does not match what the parser for
    /// that table kind expects.
    UnexpectedValueLen { context: &'static str, expected: usize, found: usize },
    /// A section's `raw_len` does not equal `values_count * value_len`.
    InconsistentSectionLength { context: &'static str },
    /// An index read from one section pointed outside another section's
    /// bounds.
    IndexOutOfBounds { context: &'static str, index: usize, bound: usize },
    /// A table's validity interval is empty or inverted.
    EmptyValidityInterval,
    /// A GHM decision tree node referenced children outside the node table.
    InvalidTreeReference { node: usize },
    /// A GHS table node used a function byte we do not recognize.
    UnknownGhsFunction { function: u8 },
    /// A GHS table node closed a record with `valid_ghs` set but no GHM code
    /// had been assigned yet.
    GhsRecordWithoutGhm,
    /// A childbirth severity mode byte outside the documented 2-4 range.
    InvalidChildbirthSeverityMode { found: u8 },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { context } => write!(f, "truncated table data in {context}"),
            Self::UnexpectedSectionCount { context, expected, found } => write!(
                f,
                "{context}: expected {expected} section(s), found {found}"
            ),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported table version '{found}'")
            }
            Self::UnexpectedValueLen { context, expected, found } => write!(
                f,
                "{context}: expected value_len {expected}, found {found}"
            ),
            Self::InconsistentSectionLength { context } => {
                write!(f, "{context}: raw_len does not match values_count * value_len")
            }
            Self::IndexOutOfBounds { context, index, bound } => write!(
                f,
                "{context}: index {index} out of bounds (len {bound})"
            ),
            Self::EmptyValidityInterval => write!(f, "table validity interval is empty or inverted"),
            Self::InvalidTreeReference { node } => {
                write!(f, "decision tree node {node} references children out of range")
            }
            Self::UnknownGhsFunction { function } => {
                write!(f, "unknown GHS table function byte {function}")
            }
            Self::GhsRecordWithoutGhm => {
                write!(f, "GHS table closed a record before any GHM code was assigned")
            }
            Self::InvalidChildbirthSeverityMode { found } => write!(
                f,
                "childbirth severity mode {found} is out of the documented 2-4 range"
            ),
        }
    }
}

impl std::error::Error for TableError {}

pub type Result<T> = std::result::Result<T, TableError>;
