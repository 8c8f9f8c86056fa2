//! FASTA target loading
//!
//! Reads target sequences via needletail (transparent gzip support)
//! and normalizes payloads to the search alphabet: bytes are
//! upper-cased and anything outside `ACGTBDHKMNRSVWXY` (whitespace,
//! digits, gap characters) is dropped. The record label is the first
//! whitespace-delimited token of the header.

use std::path::Path;

use needletail::parse_fastx_file;
use tracing::{info, warn};

use crate::error::{EpcrError, Result};

/// One target sequence: label, raw header, and normalized payload
#[derive(Debug, Clone)]
pub struct FastaRecord {
    /// First whitespace-delimited token of the header
    pub label: String,
    /// The full header line, including the leading `>`
    pub defline: String,
    /// Upper-cased payload restricted to the search alphabet
    pub seq: Vec<u8>,
}

/// Load all sequences from a FASTA file
///
/// An empty file yields an empty vector, not an error; searching zero
/// targets is a successful no-op run.
///
/// # Errors
/// Fails if the file cannot be opened or is not parseable as FASTA.
pub fn load_fasta_file<P: AsRef<Path>>(path: P) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();

    let size = std::fs::metadata(path)
        .map_err(|e| EpcrError::InvalidInput {
            path: path.to_path_buf(),
            reason: format!("cannot stat: {e}"),
        })?
        .len();
    if size == 0 {
        warn!("FASTA file {} is empty", path.display());
        return Ok(Vec::new());
    }

    info!("Reading FASTA file: {}", path.display());

    let mut reader = parse_fastx_file(path).map_err(|e| EpcrError::InvalidInput {
        path: path.to_path_buf(),
        reason: format!("not a readable FASTA file: {e}"),
    })?;

    let mut records = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| EpcrError::InvalidInput {
            path: path.to_path_buf(),
            reason: format!("bad record: {e}"),
        })?;

        let header = String::from_utf8_lossy(record.id()).into_owned();
        let label = header
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        records.push(FastaRecord {
            label,
            defline: format!(">{header}"),
            seq: normalize(&record.seq()),
        });
    }

    info!("Loaded {} sequences", records.len());
    Ok(records)
}

/// Restrict a raw payload to the search alphabet, upper-casing as we go
pub fn normalize(raw: &[u8]) -> Vec<u8> {
    raw.iter()
        .filter_map(|&b| {
            let b = b.to_ascii_uppercase();
            matches!(
                b,
                b'A' | b'C' | b'G' | b'T' | b'B' | b'D' | b'H' | b'K' | b'M' | b'N' | b'R'
                    | b'S' | b'V' | b'W' | b'X' | b'Y'
            )
            .then_some(b)
        })
        .collect()
}
