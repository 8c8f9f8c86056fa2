// epcr: Electronic PCR
//
// A Rust implementation of STS marker search over genomic sequences,
// built around a k-mer hash index and a rolling-hash scanner.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod codec;
pub mod compare;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fasta;
pub mod index;
pub mod output;
pub mod primer;
pub mod scanner;
pub mod sts;

// Re-export common types at crate root
pub use compare::{Comparator, Direction};
pub use config::SearchConfig;
pub use engine::{CancelToken, SearchEngine};
pub use error::{EpcrError, Result};
pub use fasta::{load_fasta_file, FastaRecord};
pub use index::StsIndex;
pub use output::HitWriter;
pub use primer::{PrimerRecord, Strand};
pub use scanner::Hit;
pub use sts::{StsLibrary, StsRecord};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let (major, minor, patch) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
        assert_eq!(patch, 0);
    }
}
