//! Hash index over the STS library
//!
//! Maps every hash word value in `[0, 4^W)` to the search records
//! anchored at that word. Small word sizes use a dense bucket array;
//! larger ones switch to a hash map so the key space never has to be
//! materialized. Records whose leading primer has no unambiguous hash
//! word live in a separate fallback list, probed at every scan position.
//!
//! The index borrows the STS library and is immutable once built, so
//! workers share it by reference without locking.

use ahash::AHashMap;
use tracing::{debug, info, warn};

use crate::constants::DENSE_WORDSIZE_LIMIT;
use crate::error::{EpcrError, Result};
use crate::primer::PrimerRecord;
use crate::sts::StsLibrary;

#[derive(Debug)]
enum Buckets {
    Dense(Vec<Vec<u32>>),
    Sparse(AHashMap<u32, Vec<u32>>),
}

impl Buckets {
    fn new(wordsize: usize) -> Self {
        if wordsize <= DENSE_WORDSIZE_LIMIT {
            Buckets::Dense(vec![Vec::new(); 1usize << (2 * wordsize)])
        } else {
            Buckets::Sparse(AHashMap::new())
        }
    }

    fn push(&mut self, hash: u32, record_id: u32) {
        match self {
            Buckets::Dense(table) => table[hash as usize].push(record_id),
            Buckets::Sparse(map) => map.entry(hash).or_default().push(record_id),
        }
    }

    fn get(&self, hash: u32) -> &[u32] {
        match self {
            Buckets::Dense(table) => &table[hash as usize],
            Buckets::Sparse(map) => map.get(&hash).map_or(&[], Vec::as_slice),
        }
    }
}

/// Immutable k-mer index over a primer library
#[derive(Debug)]
pub struct StsIndex<'a> {
    wordsize: usize,
    records: Vec<PrimerRecord<'a>>,
    buckets: Buckets,
    fallback: Vec<u32>,
    max_pcr_size: usize,
    max_reach: usize,
    skipped_short: usize,
}

impl<'a> StsIndex<'a> {
    /// Build the index for a given word size
    ///
    /// STSs with a primer shorter than the word are reported and left
    /// out. Bucket order follows library order, so lookups are
    /// deterministic.
    ///
    /// # Errors
    /// Returns [`EpcrError::EmptyLibrary`] when nothing survives
    /// preprocessing.
    pub fn build(library: &'a StsLibrary, wordsize: usize) -> Result<Self> {
        let mut index = Self {
            wordsize,
            records: Vec::with_capacity(library.len() * 2),
            buckets: Buckets::new(wordsize),
            fallback: Vec::new(),
            max_pcr_size: 0,
            max_reach: 0,
            skipped_short: 0,
        };

        for sts in &library.records {
            if sts.primer1.len() < wordsize || sts.primer2.len() < wordsize {
                index.skipped_short += 1;
                continue;
            }

            let longest = sts.primer1.len().max(sts.primer2.len());
            index.max_pcr_size = index.max_pcr_size.max(sts.pcr_size);
            index.max_reach = index.max_reach.max(sts.pcr_size + longest);

            index.insert(PrimerRecord::forward(sts, wordsize));
            index.insert(PrimerRecord::reverse(sts, wordsize));
        }

        if index.skipped_short > 0 {
            warn!(
                "{} STSs have a primer shorter than the word size ({}): not included in search",
                index.skipped_short, wordsize
            );
        }
        if !index.fallback.is_empty() {
            info!(
                "{} primers have no unambiguous hash word: searched via the fallback list",
                index.fallback.len()
            );
        }
        if index.records.is_empty() {
            return Err(EpcrError::EmptyLibrary { wordsize });
        }

        debug!(
            "Indexed {} search records ({} fallback), max pcr size {}",
            index.records.len(),
            index.fallback.len(),
            index.max_pcr_size
        );
        Ok(index)
    }

    fn insert(&mut self, record: PrimerRecord<'a>) {
        let id = self.records.len() as u32;
        match record.hash_value {
            Some(hash) => self.buckets.push(hash, id),
            None => self.fallback.push(id),
        }
        self.records.push(record);
    }

    /// The records sharing a hash value, in insertion order
    #[inline]
    pub fn bucket(&self, hash: u32) -> &[u32] {
        self.buckets.get(hash)
    }

    /// Records with no hashable word, checked at every position
    #[inline]
    pub fn fallback(&self) -> &[u32] {
        &self.fallback
    }

    /// All indexed search records
    #[inline]
    pub fn records(&self) -> &[PrimerRecord<'a>] {
        &self.records
    }

    /// The word size the index was built for
    pub fn wordsize(&self) -> usize {
        self.wordsize
    }

    /// Largest expected PCR product size across the library
    pub fn max_pcr_size(&self) -> usize {
        self.max_pcr_size
    }

    /// Largest `pcr_size + longest primer` across the library; with the
    /// margin added this bounds how far a hit can extend past its start
    pub fn max_reach(&self) -> usize {
        self.max_reach
    }

    /// Number of indexed search records (two per usable STS)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
