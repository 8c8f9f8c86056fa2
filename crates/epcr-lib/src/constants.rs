//! Constants and parameter bounds
//!
//! Defaults follow the classic electronic-PCR parameterization: an
//! 11-base hash word, a 50-base margin around the expected product
//! size, and one exact-match base at each primer's 3' end.

/// Default hash word size
pub const DEFAULT_WORDSIZE: usize = 11;

/// Default margin around the expected PCR product size
pub const DEFAULT_MARGIN: usize = 50;

/// Default mismatch budget per primer
pub const DEFAULT_MISMATCHES: u32 = 0;

/// Default number of protected bases at each primer's 3' end
pub const DEFAULT_THREE_PRIME: usize = 1;

/// Default PCR product size used when an STS record omits its size
pub const DEFAULT_PCR_SIZE: usize = 240;

/// Default worker count
pub const DEFAULT_THREADS: usize = 1;

/// Minimum hash word size
pub const MIN_WORDSIZE: usize = 3;
/// Maximum hash word size (a word must fit in 32 bits)
pub const MAX_WORDSIZE: usize = 16;

/// Maximum mismatch budget
pub const MAX_MISMATCHES: u32 = 10;

/// Maximum margin
pub const MAX_MARGIN: usize = 10_000;

/// Minimum default PCR product size
pub const MIN_PCR_SIZE: usize = 1;
/// Maximum default PCR product size
pub const MAX_PCR_SIZE: usize = 10_000;

/// Payloads shorter than this are always scanned single-threaded
pub const MIN_PAYLOAD_FOR_THREADING: usize = 100_000;

/// Largest word size for which the index uses a dense bucket array;
/// above this the key space (4^W) is backed by a hash map instead.
pub const DENSE_WORDSIZE_LIMIT: usize = 13;

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);
