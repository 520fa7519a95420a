use std::fmt;

/// Structural failure while parsing a NOEMI-format GHS pricing file. Like
/// [`drg_tables::TableError`], these are build-time failures, never
/// classification data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The file's first line isn't exactly 128 bytes.
    BadHeaderLength { found: usize },
    /// The first line's 52-byte magic prefix doesn't match.
    BadMagic,
    /// A body line isn't exactly 128 bytes.
    BadLineLength { found: usize },
    /// A `"110"` body line's fixed-width numeric fields didn't parse.
    MalformedRecord,
    /// A record's sector digit decoded to something other than `1` or `2`.
    BadSector { found: u8 },
    /// A record's start date isn't a valid calendar date.
    InvalidStartDate,
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadHeaderLength { found } => {
                write!(f, "pricing file header line is {found} bytes, expected 128")
            }
            Self::BadMagic => write!(f, "pricing file header does not match the expected NOEMI magic"),
            Self::BadLineLength { found } => write!(f, "pricing record line is {found} bytes, expected 128"),
            Self::MalformedRecord => write!(f, "pricing record has malformed fixed-width numeric fields"),
            Self::BadSector { found } => write!(f, "pricing record sector digit {found} is not 1 or 2"),
            Self::InvalidStartDate => write!(f, "pricing record start date is not a valid calendar date"),
        }
    }
}

impl std::error::Error for PricingError {}

pub type Result<T> = std::result::Result<T, PricingError>;
