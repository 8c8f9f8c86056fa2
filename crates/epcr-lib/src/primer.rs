//! Primer preprocessing
//!
//! Each STS yields two search records, one per strand. A record is a
//! (leading primer, trailing primer) pair expressed in plus-strand
//! coordinates:
//!
//! - `+`: primer1 anchors the hit, primer2 closes it.
//! - `-`: the marker lies on the opposite strand, so primer2 appears
//!   first on the plus strand and the reverse complement of primer1
//!   closes the hit.
//!
//! The hash word is the leftmost window of the leading primer that is
//! free of ambiguity codes. A leading primer with no such window cannot
//! be indexed and is searched via the linear fallback list instead.

use std::borrow::Cow;
use std::fmt;

use crate::codec::{code2, is_ambiguous, reverse_complement, AMBIG};
use crate::sts::StsRecord;

/// Strand of a search record (and of the hits it produces)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// The primer pair matches the target as given
    Plus,
    /// The primer pair matches the reverse complement of the target
    Minus,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// One indexed search record derived from an STS
///
/// Borrows the source record; the STS library must outlive the index
/// built over it.
#[derive(Debug, Clone)]
pub struct PrimerRecord<'a> {
    /// The source STS
    pub sts: &'a StsRecord,
    /// Which strand this record searches
    pub strand: Strand,
    /// Primer expected first on the plus strand
    pub leading: &'a [u8],
    /// Primer expected at the far end of the product
    pub trailing: Cow<'a, [u8]>,
    /// Offset of the hash word within the leading primer
    pub hash_offset: usize,
    /// Hash value of the word, or `None` for fallback records
    pub hash_value: Option<u32>,
    /// Whether either primer of this record carries ambiguity codes
    pub ambiguous: bool,
}

impl<'a> PrimerRecord<'a> {
    /// Build the plus-strand record for an STS
    pub fn forward(sts: &'a StsRecord, wordsize: usize) -> Self {
        let site = hash_site(&sts.primer1, wordsize);
        Self {
            sts,
            strand: Strand::Plus,
            leading: &sts.primer1,
            trailing: Cow::Borrowed(sts.primer2.as_slice()),
            hash_offset: site.map_or(0, |(offset, _)| offset),
            hash_value: site.map(|(_, value)| value),
            ambiguous: has_ambiguity(&sts.primer1) || has_ambiguity(&sts.primer2),
        }
    }

    /// Build the minus-strand record for an STS
    pub fn reverse(sts: &'a StsRecord, wordsize: usize) -> Self {
        let site = hash_site(&sts.primer2, wordsize);
        let trailing = reverse_complement(&sts.primer1);
        let ambiguous = has_ambiguity(&sts.primer2) || has_ambiguity(&trailing);
        Self {
            sts,
            strand: Strand::Minus,
            leading: &sts.primer2,
            trailing: Cow::Owned(trailing),
            hash_offset: site.map_or(0, |(offset, _)| offset),
            hash_value: site.map(|(_, value)| value),
            ambiguous,
        }
    }

    /// The trailing primer as a slice
    #[inline]
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }
}

/// Find the leftmost unambiguous hash word in a primer
///
/// Returns `(offset, hash_value)` for the first length-`wordsize`
/// window containing only concrete bases, or `None` when the primer is
/// shorter than the word or every window is interrupted by ambiguity.
pub fn hash_site(primer: &[u8], wordsize: usize) -> Option<(usize, u32)> {
    if primer.len() < wordsize {
        return None;
    }

    'offsets: for offset in 0..=primer.len() - wordsize {
        let mut hash = 0u32;
        for i in 0..wordsize {
            let code = code2(primer[offset + i]);
            if code == AMBIG {
                continue 'offsets;
            }
            hash = (hash << 2) | code as u32;
        }
        return Some((offset, hash));
    }

    None
}

fn has_ambiguity(primer: &[u8]) -> bool {
    primer.iter().copied().any(is_ambiguous)
}
