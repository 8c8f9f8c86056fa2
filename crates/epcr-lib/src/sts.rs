//! STS library loading
//!
//! An STS file is tab-delimited text, one record per line:
//!
//! ```text
//! <id>\t<primer1>\t<primer2>\t<size>[\t<annotation>]
//! ```
//!
//! `#`-prefixed lines and blank lines are ignored. `<size>` is either a
//! positive integer or a range `a-b`, in which case the midpoint is
//! used. Malformed lines are logged and skipped; a file with no records
//! at all is a fatal input error.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{EpcrError, Result};

/// One STS marker: an identifier, a primer pair, and the expected
/// PCR product size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StsRecord {
    /// Marker identifier (opaque)
    pub id: String,
    /// Left primer, 5'->3', upper-cased
    pub primer1: Vec<u8>,
    /// Right primer, 5'->3', upper-cased
    pub primer2: Vec<u8>,
    /// Expected PCR product size in bases
    pub pcr_size: usize,
    /// Optional annotation, verbatim from the input line
    pub alias: String,
}

/// A frozen collection of STS records, in file order
#[derive(Debug, Default)]
pub struct StsLibrary {
    /// The loaded records
    pub records: Vec<StsRecord>,
    /// Lines skipped because they had fewer than four fields
    pub skipped_lines: usize,
    /// Records whose declared size was raised to the primer-length sum
    pub adjusted_sizes: usize,
}

impl StsLibrary {
    /// Load an STS library from a file
    ///
    /// `default_pcr_size` substitutes for sizes that are missing, zero,
    /// or unparseable.
    ///
    /// # Errors
    /// Fails if the file cannot be read or contains no records.
    pub fn load<P: AsRef<Path>>(path: P, default_pcr_size: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading STS file: {}", path.display());

        let file = File::open(path).map_err(|e| EpcrError::InvalidInput {
            path: path.to_path_buf(),
            reason: format!("cannot open: {e}"),
        })?;

        let library = Self::from_reader(BufReader::new(file), default_pcr_size)?;
        if library.records.is_empty() {
            return Err(EpcrError::InvalidInput {
                path: path.to_path_buf(),
                reason: "no STS records found".to_string(),
            });
        }

        info!("Loaded {} STS records", library.records.len());
        Ok(library)
    }

    /// Parse STS records from any buffered reader
    ///
    /// # Errors
    /// Fails only on read errors; malformed lines are counted and
    /// skipped.
    pub fn from_reader<R: BufRead>(reader: R, default_pcr_size: usize) -> Result<Self> {
        let mut library = StsLibrary::default();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 4 {
                warn!(
                    "line {}: expected at least 4 tab-delimited fields, got {}; skipped",
                    line_no + 1,
                    fields.len()
                );
                library.skipped_lines += 1;
                continue;
            }

            let primer1 = fields[1].as_bytes().to_ascii_uppercase();
            let primer2 = fields[2].as_bytes().to_ascii_uppercase();
            let mut pcr_size = parse_pcr_size(fields[3], default_pcr_size);

            // A declared size smaller than the primers themselves is
            // raised to the primer-length sum.
            if primer1.len() + primer2.len() > pcr_size {
                pcr_size = primer1.len() + primer2.len();
                library.adjusted_sizes += 1;
            }

            // Annotations may contain embedded tabs; keep them verbatim.
            let alias = if fields.len() > 4 {
                fields[4..].join("\t")
            } else {
                String::new()
            };

            library.records.push(StsRecord {
                id: fields[0].to_string(),
                primer1,
                primer2,
                pcr_size,
                alias,
            });
        }

        if library.skipped_lines > 0 {
            warn!("{} malformed STS lines skipped", library.skipped_lines);
        }
        if library.adjusted_sizes > 0 {
            warn!(
                "{} STSs have a primer length sum greater than the pcr size: expected pcr size adjusted",
                library.adjusted_sizes
            );
        }

        Ok(library)
    }

    /// Number of records in the library
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the library holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a PCR size field, handling `a-b` ranges by their midpoint
fn parse_pcr_size(field: &str, default: usize) -> usize {
    if let Some((lo, hi)) = field.split_once('-') {
        if !lo.is_empty() && !hi.is_empty() {
            if let (Ok(lo), Ok(hi)) = (lo.parse::<usize>(), hi.parse::<usize>()) {
                return (lo + hi) / 2;
            }
        }
        default
    } else {
        match field.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => default,
        }
    }
}
