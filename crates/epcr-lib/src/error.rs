//! Error types for the search engine
//!
//! Per-record problems in input files (a malformed STS line, a primer
//! shorter than the word size) are logged and skipped where they occur;
//! everything surfaced through this type is fatal to the run.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for engine operations
#[derive(Error, Debug)]
pub enum EpcrError {
    /// A configuration option is out of range
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An input file is unreadable or yields nothing usable
    #[error("{path}: {reason}")]
    InvalidInput {
        /// Path of the offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// No STS record survived preprocessing; there is nothing to search
    #[error("no STS record is usable at word size {wordsize}")]
    EmptyLibrary {
        /// The configured hash word size
        wordsize: usize,
    },

    /// An I/O failure, typically on the output sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An invariant violation; indicates a bug
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, EpcrError>;
