//! Search configuration
//!
//! Holds the parameters that shape a search run: hash word size,
//! partner-placement margin, mismatch budget, 3'-protection length,
//! IUPAC mode, the fallback PCR size, and the worker count.

use crate::constants::{
    DEFAULT_MARGIN, DEFAULT_MISMATCHES, DEFAULT_PCR_SIZE, DEFAULT_THREADS, DEFAULT_THREE_PRIME,
    DEFAULT_WORDSIZE, MAX_MARGIN, MAX_MISMATCHES, MAX_PCR_SIZE, MAX_WORDSIZE, MIN_PCR_SIZE,
    MIN_WORDSIZE,
};
use crate::error::EpcrError;

/// Configuration parameters for an STS search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Hash word size W (3..=16); also the shortest usable primer length
    pub wordsize: usize,

    /// Tolerance around the expected PCR product size when placing the
    /// trailing primer
    pub margin: usize,

    /// Mismatches allowed per primer outside the protected region
    pub mismatches: u32,

    /// Number of bases at each primer's 3' end that must match exactly
    pub three_prime: usize,

    /// Honor IUPAC ambiguity codes during comparison
    pub iupac: bool,

    /// PCR product size assumed when an STS record omits its own
    pub default_pcr_size: usize,

    /// Worker count; payloads under the threading threshold always run
    /// on a single worker
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wordsize: DEFAULT_WORDSIZE,
            margin: DEFAULT_MARGIN,
            mismatches: DEFAULT_MISMATCHES,
            three_prime: DEFAULT_THREE_PRIME,
            iupac: false,
            default_pcr_size: DEFAULT_PCR_SIZE,
            threads: DEFAULT_THREADS,
        }
    }
}

impl SearchConfig {
    /// Validate the configuration parameters
    ///
    /// # Errors
    /// Returns [`EpcrError::Config`] when any option is out of range.
    pub fn validate(&self) -> Result<(), EpcrError> {
        if self.wordsize < MIN_WORDSIZE || self.wordsize > MAX_WORDSIZE {
            return Err(EpcrError::Config(format!(
                "word size must be between {} and {}, got {}",
                MIN_WORDSIZE, MAX_WORDSIZE, self.wordsize
            )));
        }
        if self.mismatches > MAX_MISMATCHES {
            return Err(EpcrError::Config(format!(
                "mismatch count must be at most {}, got {}",
                MAX_MISMATCHES, self.mismatches
            )));
        }
        if self.margin > MAX_MARGIN {
            return Err(EpcrError::Config(format!(
                "margin must be at most {}, got {}",
                MAX_MARGIN, self.margin
            )));
        }
        if self.default_pcr_size < MIN_PCR_SIZE || self.default_pcr_size > MAX_PCR_SIZE {
            return Err(EpcrError::Config(format!(
                "default PCR size must be between {} and {}, got {}",
                MIN_PCR_SIZE, MAX_PCR_SIZE, self.default_pcr_size
            )));
        }
        if self.threads == 0 {
            return Err(EpcrError::Config(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Log the configuration via tracing
    pub fn print(&self) {
        tracing::info!("Search configuration:");
        tracing::info!("  wordsize = {}", self.wordsize);
        tracing::info!("  margin = {}", self.margin);
        tracing::info!("  mismatches = {}", self.mismatches);
        tracing::info!("  three_prime = {}", self.three_prime);
        tracing::info!("  iupac = {}", self.iupac);
        tracing::debug!("  default_pcr_size = {}", self.default_pcr_size);
        tracing::debug!("  threads = {}", self.threads);
    }
}
