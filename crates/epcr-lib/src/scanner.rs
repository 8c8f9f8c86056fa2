//! Streaming scan over a target slice
//!
//! Maintains a rolling 2-bit hash over the last W bases together with a
//! countdown of bases still owed before the window is free of
//! ambiguity. At every hashable window the index is probed; candidate
//! records are verified by the comparator, first the leading primer at
//! the anchored position, then the trailing primer at every admissible
//! distance inside the margin. Fallback records are tried at every
//! window start regardless of the hash.
//!
//! Positions handed to the scanner are slice-local; emitted hits carry
//! global coordinates. The ownership bound makes a worker emit only
//! hits whose leading primer starts inside its own partition, so
//! overlapping slices never produce duplicates.

use crate::codec::{code2, AMBIG};
use crate::compare::{Comparator, Direction};
use crate::engine::CancelToken;
use crate::index::StsIndex;

/// A confirmed STS hit, 0-based inclusive global coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Start of the leading primer
    pub start: usize,
    /// End of the trailing primer
    pub end: usize,
    /// Index of the search record that produced the hit
    pub record: u32,
}

/// Scanner over one target slice
pub struct Scanner<'i, 'a> {
    index: &'i StsIndex<'a>,
    comparator: &'i Comparator,
    wordsize: usize,
    margin: usize,
}

impl<'i, 'a> Scanner<'i, 'a> {
    /// Create a scanner bound to an index and comparison policy
    pub fn new(
        index: &'i StsIndex<'a>,
        comparator: &'i Comparator,
        wordsize: usize,
        margin: usize,
    ) -> Self {
        Self {
            index,
            comparator,
            wordsize,
            margin,
        }
    }

    /// Scan a slice and append hits to `hits`
    ///
    /// `global_offset` is the slice's position within the whole target;
    /// `accept_len` bounds the slice-local leading-primer starts this
    /// worker owns. Scanning stops early when `cancel` is set.
    pub fn scan_slice(
        &self,
        seq: &[u8],
        global_offset: usize,
        accept_len: usize,
        cancel: &CancelToken,
        hits: &mut Vec<Hit>,
    ) {
        let w = self.wordsize;
        let len = seq.len();
        if len < w {
            return;
        }

        let mask: u32 = if 2 * w == 32 {
            u32::MAX
        } else {
            (1u32 << (2 * w)) - 1
        };

        let mut hash = 0u32;
        // Concrete bases still needed before the window is hashable
        let mut pending = 0usize;

        for end in 0..len {
            if cancel.is_cancelled() {
                return;
            }

            hash = (hash << 2) & mask;
            let code = code2(seq[end]);
            if code == AMBIG {
                pending = w;
            } else {
                hash |= code as u32;
                if pending > 0 {
                    pending -= 1;
                }
            }

            if end + 1 < w {
                continue;
            }
            let pos = end + 1 - w;

            if pending == 0 {
                for &record_id in self.index.bucket(hash) {
                    let record = &self.index.records()[record_id as usize];
                    if pos < record.hash_offset {
                        continue;
                    }
                    let start = pos - record.hash_offset;
                    if start + record.leading.len() <= len {
                        self.match_at(seq, start, record_id, global_offset, accept_len, hits);
                    }
                }
            }

            for &record_id in self.index.fallback() {
                let record = &self.index.records()[record_id as usize];
                if pos + record.leading.len() <= len {
                    self.match_at(seq, pos, record_id, global_offset, accept_len, hits);
                }
            }
        }
    }

    /// Verify a candidate record anchored at `start` and emit every
    /// admissible trailing-primer placement
    fn match_at(
        &self,
        seq: &[u8],
        start: usize,
        record_id: u32,
        global_offset: usize,
        accept_len: usize,
        hits: &mut Vec<Hit>,
    ) {
        if start >= accept_len {
            return;
        }

        let record = &self.index.records()[record_id as usize];
        let leading = record.leading;
        let len1 = leading.len();
        if !self
            .comparator
            .matches(&seq[start..start + len1], leading, Direction::Forward)
        {
            return;
        }

        let trailing = record.trailing();
        let len2 = trailing.len();
        let len = seq.len();

        let avail = len - (start + len1);
        if avail < len2 {
            return;
        }

        // Clamp the expected size when it overruns the slice; the high
        // margin collapses in that case. The size is never below the
        // primer-length sum (the loader enforces this; re-applied here
        // so hand-built libraries cannot underflow the arithmetic).
        let mut exp_size = record.sts.pcr_size.max(len1 + len2);
        let hi_margin = if exp_size > len - start {
            exp_size = len - start;
            0
        } else {
            self.margin.min(len - start - exp_size)
        };
        let lo_margin = self.margin.min(exp_size.saturating_sub(len1 + len2));

        let emit = |p2: usize, hits: &mut Vec<Hit>| {
            if self
                .comparator
                .matches(&seq[p2..p2 + len2], trailing, Direction::Reverse)
            {
                hits.push(Hit {
                    start: global_offset + start,
                    end: global_offset + p2 + len2 - 1,
                    record: record_id,
                });
            }
        };

        // Expected position first, then outward: nearer placements
        // before farther ones, low side before high side.
        let base = start + exp_size - len2;
        if start + len1 <= base && base + len2 <= len {
            emit(base, hits);
        }

        for dist in 1..=lo_margin.max(hi_margin) {
            if dist <= lo_margin {
                let p2 = base - dist;
                if start + len1 <= p2 && p2 + len2 <= len {
                    emit(p2, hits);
                }
            }
            if dist <= hi_margin {
                let p2 = base + dist;
                if p2 + len2 <= len {
                    emit(p2, hits);
                }
            }
        }
    }
}
