//! quadpattern: compiles sets of quadruple character codes into POSIX EREs.
//!
//! TTCN-3 universal charstring patterns are matched by a POSIX regex engine
//! that only sees bytes. Every universal character is therefore rewritten as
//! a [`Quad`] in its 8-letter hex-alphabet form (`'A'..='P'` stand for the
//! nibbles `0..=15`), and character sets and ranges become regular
//! expressions over that alphabet:
//!
//! ```
//! use quadpattern::{Quad, QuadInterval, QuadSet};
//!
//! let mut set = QuadSet::new();
//! set.add(Quad::from('a'));
//! set.add(QuadInterval::new(Quad::from('0'), Quad::from('9')).unwrap());
//!
//! assert_eq!(set.generate_posix(), "(AAAAAAD[A-J]|AAAAAAGB)");
//! ```
//!
//! Case-insensitive patterns run both the pattern and the matched text
//! through a [`UnicharPattern`] table first.

mod quad;
mod quad_interval;
mod quad_set;
mod unichar_pattern;

pub use quad::{char_hexrepr, char_hexrepr_str, hexrepr_of_str, Field, Quad, HEXREPR_LEN};
pub use quad_interval::{generate_hex_interval, QuadInterval};
pub use quad_set::{Element, QuadSet};
pub use unichar_pattern::{
    UnicharPattern, CASE_FOLDING_FILE, FALLBACK_CASE_FOLDING_PATH, TTCN3_DIR_ENV,
};

use std::fmt;
use std::io;

/// Errors raised while building or rendering quadruple sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// An interval was built with its upper bound below its lower bound.
    InvertedInterval { lower: Quad, upper: Quad },
    /// A single-byte range whose start is larger than its end.
    InvertedByteRange { source: u8, dest: u8 },
    /// A string that is not exactly 8 characters from `'A'..='P'`.
    InvalidHexRepr(String),
    /// A byte index outside `0..=3`.
    FieldIndexOutOfRange(usize),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InvertedInterval { lower, upper } => write!(
                f,
                "in set interval: end {:#010x} is lower than start {:#010x}",
                upper.value(),
                lower.value()
            ),
            PatternError::InvertedByteRange { source, dest } => {
                write!(f, "illegal interval in set: start {} > end {}", source, dest)
            }
            PatternError::InvalidHexRepr(s) => {
                write!(f, "invalid quadruple representation: {:?}", s)
            }
            PatternError::FieldIndexOutOfRange(i) => {
                write!(f, "accessing a nonexistent field of a quadruple: {}", i)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Column of a case folding record that failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Code,
    Status,
    Mapping,
    CharacterCode,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::Code => "code column",
            Column::Status => "status column",
            Column::Mapping => "mapping column",
            Column::CharacterCode => "character code",
        };
        f.write_str(name)
    }
}

/// Errors raised while loading a case folding table.
#[derive(Debug)]
pub enum CaseFoldingError {
    /// `TTCN3_DIR` is not set, so there is no installation to look in.
    MissingTtcn3Dir,
    /// The file could not be opened or read.
    Io(io::Error),
    /// A record is malformed; the whole table is discarded.
    InvalidFormat { line: usize, column: Column },
}

impl fmt::Display for CaseFoldingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseFoldingError::MissingTtcn3Dir => {
                write!(f, "environment variable {} not present", TTCN3_DIR_ENV)
            }
            CaseFoldingError::Io(e) => write!(f, "cannot read case folding file: {}", e),
            CaseFoldingError::InvalidFormat { line, column } => write!(
                f,
                "invalid format of case folding file ({}) on line {}",
                column, line
            ),
        }
    }
}

impl std::error::Error for CaseFoldingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaseFoldingError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CaseFoldingError {
    fn from(e: io::Error) -> Self {
        CaseFoldingError::Io(e)
    }
}
