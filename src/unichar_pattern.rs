//! Case folding for case-insensitive universal charstring patterns.
//!
//! Patterns with the `@nocase` modifier are matched by converting both the
//! pattern and the matched string to lowercase. The mappings come from the
//! Unicode `CaseFolding.txt` file shipped in the TITAN installation; only the
//! simple foldings (statuses `C` and `S`) are used.
//!
//! Loading never fails hard: if the file is missing or malformed a warning is
//! logged and the table stays empty, which turns case folding into a no-op.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::quad::{Quad, HEXREPR_LEN};
use crate::{CaseFoldingError, Column};

/// Environment variable pointing at the TITAN installation.
pub const TTCN3_DIR_ENV: &str = "TTCN3_DIR";

/// Location of the case folding file inside the installation.
pub const CASE_FOLDING_FILE: &str = "etc/CaseFolding.txt";

/// Tried when the installed file cannot be opened; this is where the file
/// lives in a source tree during the build.
pub const FALLBACK_CASE_FOLDING_PATH: &str = "../etc/CaseFolding.txt";

/// Uppercase to lowercase mappings between quadruples.
#[derive(Debug, Clone, Default)]
pub struct UnicharPattern {
    /// Mappings in file order.
    mappings: Vec<(Quad, Quad)>,
    /// `from` -> position in `mappings`; the first mapping of a code wins.
    index: FxHashMap<Quad, usize>,
}

impl UnicharPattern {
    /// A table without mappings; every conversion is the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The process-wide table, loaded on first use.
    pub fn shared() -> &'static UnicharPattern {
        static SHARED: OnceLock<UnicharPattern> = OnceLock::new();
        SHARED.get_or_init(UnicharPattern::load)
    }

    /// Load the installed case folding file.
    ///
    /// Looks for `$TTCN3_DIR/etc/CaseFolding.txt`, then for
    /// `../etc/CaseFolding.txt`. Any failure is logged once and results in an
    /// empty table.
    pub fn load() -> Self {
        let fallback = Path::new(FALLBACK_CASE_FOLDING_PATH);
        match Self::load_from_dir(env::var_os(TTCN3_DIR_ENV), fallback) {
            Ok(table) => {
                debug!("loaded {} case folding mappings", table.len());
                table
            }
            Err(e) => {
                warn!(
                    "{}. Case-insensitive universal charstring patterns are disabled.",
                    e
                );
                Self::empty()
            }
        }
    }

    /// Open `<ttcn3_dir>/etc/CaseFolding.txt`, or `fallback` if that fails.
    /// When both fail the error names the installed path.
    fn load_from_dir(
        ttcn3_dir: Option<OsString>,
        fallback: &Path,
    ) -> Result<Self, CaseFoldingError> {
        let dir = ttcn3_dir.ok_or(CaseFoldingError::MissingTtcn3Dir)?;
        let path = PathBuf::from(dir).join(CASE_FOLDING_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(primary) => File::open(fallback).map_err(|_| {
                io::Error::new(
                    primary.kind(),
                    format!("cannot open file '{}': {}", path.display(), primary),
                )
            })?,
        };
        Self::from_reader(BufReader::new(file))
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CaseFoldingError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a table in `CaseFolding.txt` format.
    ///
    /// Each record is `code; status; mapping; # comment`. Codes are 4 or 5
    /// hex digits. A malformed record rejects the whole table.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, CaseFoldingError> {
        let mut table = Self::empty();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = n + 1;
            let invalid = |column| CaseFoldingError::InvalidFormat {
                line: line_no,
                column,
            };

            let content = line.split('#').next().unwrap_or("");
            let mut fields = content.split(';').map(str::trim);

            let from = fields.next().unwrap_or("");
            if from.is_empty() {
                continue;
            }
            if !(4..=5).contains(&from.len()) {
                return Err(invalid(Column::Code));
            }

            let status = match fields.next() {
                Some(s) if s.len() == 1 => s,
                _ => return Err(invalid(Column::Status)),
            };
            if status != "C" && status != "S" {
                continue;
            }

            let to = fields.next().unwrap_or("");
            if !(4..=5).contains(&to.len()) {
                return Err(invalid(Column::Mapping));
            }

            match (parse_code(from), parse_code(to)) {
                (Some(from), Some(to)) => table.push(from, to),
                _ => return Err(invalid(Column::CharacterCode)),
            }
        }
        Ok(table)
    }

    fn push(&mut self, from: Quad, to: Quad) {
        self.index.entry(from).or_insert(self.mappings.len());
        self.mappings.push((from, to));
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn find_mapping(&self, q: Quad) -> Option<Quad> {
        self.index.get(&q).map(|&i| self.mappings[i].1)
    }

    /// The lowercase form of `q`, or `q` itself if it has none.
    pub fn convert_quad_to_lowercase(&self, q: Quad) -> Quad {
        self.find_mapping(q).unwrap_or(q)
    }

    /// Lowercase a string of 8-letter quadruples in place.
    ///
    /// Chunks are taken at multiples of 8; a shorter tail and chunks that are
    /// not valid quadruples are left alone, so the length never changes.
    pub fn convert_regex_str_to_lowercase(&self, s: &mut String) {
        if self.is_empty() {
            return;
        }
        for start in (0..s.len() / HEXREPR_LEN).map(|i| i * HEXREPR_LEN) {
            let end = start + HEXREPR_LEN;
            let Some(q) = Quad::from_hexrepr_bytes(&s.as_bytes()[start..end]) else {
                continue;
            };
            // A decoded chunk is all ASCII, so both ends are char boundaries.
            if let Some(to) = self.find_mapping(q) {
                s.replace_range(start..end, &to.hexrepr());
            }
        }
    }

    /// [`convert_regex_str_to_lowercase`](Self::convert_regex_str_to_lowercase)
    /// on raw bytes.
    pub fn convert_regex_bytes_to_lowercase(&self, buf: &mut [u8]) {
        if self.is_empty() {
            return;
        }
        for chunk in buf.chunks_exact_mut(HEXREPR_LEN) {
            let Some(to) = Quad::from_hexrepr_bytes(chunk).and_then(|q| self.find_mapping(q))
            else {
                continue;
            };
            let mut out = [0u8; HEXREPR_LEN];
            to.write_hexrepr(&mut out);
            chunk.copy_from_slice(&out);
        }
    }
}

/// A 4 or 5 digit hex code; a fifth leading digit is the plane.
fn parse_code(s: &str) -> Option<Quad> {
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(s, 16).ok().map(Quad::from_value)
}
