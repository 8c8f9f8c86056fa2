//! Search orchestration: partitioning, worker pool, collection
//!
//! A target is split into T contiguous partitions, each extended to the
//! right by an overlap large enough that any hit starting inside a
//! partition fits entirely within the extended slice. A worker only
//! emits hits whose leading primer starts inside its own partition, so
//! every candidate start has exactly one owner and boundary hits are
//! never duplicated.
//!
//! Workers share the index, target, and configuration read-only and own
//! their hit buffers. Buffers are merged in worker order, stable-sorted
//! by start position, and deduplicated before formatting, which makes
//! the output byte-identical across runs and independent of the worker
//! count.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ahash::AHashSet;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::compare::Comparator;
use crate::config::SearchConfig;
use crate::constants::MIN_PAYLOAD_FOR_THREADING;
use crate::error::{EpcrError, Result};
use crate::fasta::FastaRecord;
use crate::index::StsIndex;
use crate::output::HitWriter;
use crate::scanner::{Hit, Scanner};
use crate::sts::StsLibrary;

/// Shared flag for cooperative cancellation
///
/// Workers poll the token at each scan position and drain promptly once
/// it is set. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One worker's share of a target sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Partition {
    /// Global start of the slice
    begin: usize,
    /// Bytes visible to the worker (own region plus overlap)
    scan_len: usize,
    /// Bytes of the own region; leading-primer starts beyond this
    /// belong to the next worker
    accept_len: usize,
}

/// Split a payload into `workers` partitions extended by `overlap`
fn partition(len: usize, workers: usize, overlap: usize) -> Vec<Partition> {
    if workers <= 1 || len == 0 {
        return vec![Partition { begin: 0, scan_len: len, accept_len: len }];
    }

    let chunk = len.div_ceil(workers);
    let mut partitions = Vec::with_capacity(workers);
    for worker in 0..workers {
        let begin = worker * chunk;
        if begin >= len {
            break;
        }
        partitions.push(Partition {
            begin,
            scan_len: (chunk + overlap).min(len - begin),
            accept_len: chunk.min(len - begin),
        });
    }
    partitions
}

/// The assembled search engine: frozen index plus comparison policy
///
/// Borrows the STS library; build the library first and keep it alive
/// for the engine's lifetime.
#[derive(Debug)]
pub struct SearchEngine<'a> {
    config: SearchConfig,
    index: StsIndex<'a>,
    comparator: Comparator,
    cancel: CancelToken,
}

impl<'a> SearchEngine<'a> {
    /// Validate the configuration and build the index
    ///
    /// # Errors
    /// Fails on an out-of-range option or a library with no usable STS.
    pub fn new(library: &'a StsLibrary, config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        config.print();

        let index = StsIndex::build(library, config.wordsize)?;
        let comparator = Comparator::new(config.mismatches, config.three_prime, config.iupac);

        Ok(Self {
            config: config.clone(),
            index,
            comparator,
            cancel: CancelToken::new(),
        })
    }

    /// The underlying index
    pub fn index(&self) -> &StsIndex<'a> {
        &self.index
    }

    /// A handle for cancelling this engine's scans
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Search one target and return its hits, merged and deduplicated
    ///
    /// Hits are ordered by ascending start position (ties keep worker
    /// order) and identical `(start, end, STS, strand)` tuples are
    /// emitted once.
    pub fn search_target(&self, target: &FastaRecord) -> Vec<Hit> {
        let seq = &target.seq;
        let workers = if seq.len() < MIN_PAYLOAD_FOR_THREADING {
            1
        } else {
            self.config.threads
        };
        let overlap = self.config.margin + self.index.max_reach();
        let partitions = partition(seq.len(), workers, overlap);
        debug!(
            "Scanning {} ({} bp) with {} partition(s)",
            target.label,
            seq.len(),
            partitions.len()
        );

        let scanner = Scanner::new(
            &self.index,
            &self.comparator,
            self.config.wordsize,
            self.config.margin,
        );

        let scan_one = |p: &Partition| {
            let mut buffer = Vec::new();
            scanner.scan_slice(
                &seq[p.begin..p.begin + p.scan_len],
                p.begin,
                p.accept_len,
                &self.cancel,
                &mut buffer,
            );
            buffer
        };

        let buffers: Vec<Vec<Hit>> = if partitions.len() == 1 {
            vec![scan_one(&partitions[0])]
        } else {
            partitions.par_iter().map(scan_one).collect()
        };

        let mut hits: Vec<Hit> = buffers.into_iter().flatten().collect();
        hits.sort_by_key(|hit| hit.start);

        let records = self.index.records();
        let mut seen = AHashSet::new();
        hits.retain(|hit| {
            let record = &records[hit.record as usize];
            seen.insert((hit.start, hit.end, record.sts.id.as_str(), record.strand))
        });

        hits
    }

    /// Search every target in order and write formatted hits
    ///
    /// Returns the total hit count. An output error cancels outstanding
    /// workers and propagates.
    ///
    /// # Errors
    /// Fails on configuration-level thread-pool problems or sink I/O
    /// errors.
    pub fn run<W: Write>(
        &self,
        targets: &[FastaRecord],
        writer: &mut HitWriter<W>,
    ) -> Result<u64> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| EpcrError::Internal(format!("failed to build thread pool: {e}")))?;

        let mut total = 0u64;
        for target in targets {
            info!("Processing sequence: {} ({} bp)", target.label, target.seq.len());

            let hits = pool.install(|| self.search_target(target));
            for hit in &hits {
                let record = &self.index.records()[hit.record as usize];
                if let Err(e) = writer.write_hit(&target.label, hit, record) {
                    self.cancel.cancel();
                    return Err(EpcrError::Io(e));
                }
            }
            total += hits.len() as u64;
        }

        writer.flush()?;
        info!("Total hits found: {}", total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: &[u8] = b"GCTAAAAATACACGGATGG";
    const P2: &[u8] = b"TGCAAGACTGCGTCTC";

    fn library(lines: &str) -> StsLibrary {
        StsLibrary::from_reader(std::io::Cursor::new(lines), 240).unwrap()
    }

    fn target(seq: Vec<u8>) -> FastaRecord {
        FastaRecord {
            label: "t1".to_string(),
            defline: ">t1".to_string(),
            seq,
        }
    }

    fn plant() -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(P1);
        p.extend(std::iter::repeat(b'C').take(25));
        p.extend_from_slice(P2);
        p
    }

    fn sts_line() -> String {
        format!(
            "S1\t{}\t{}\t60\n",
            std::str::from_utf8(P1).unwrap(),
            std::str::from_utf8(P2).unwrap()
        )
    }

    #[test]
    fn test_partition_single_worker() {
        let parts = partition(1000, 1, 100);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], Partition { begin: 0, scan_len: 1000, accept_len: 1000 });
    }

    #[test]
    fn test_partition_covers_everything_once() {
        let parts = partition(1003, 4, 50);
        // chunk = 251
        assert_eq!(parts.len(), 4);
        let mut covered = 0;
        for (i, p) in parts.iter().enumerate() {
            assert_eq!(p.begin, covered);
            covered += p.accept_len;
            // every slice but the last is extended by the overlap
            if i < parts.len() - 1 {
                assert_eq!(p.scan_len, (p.accept_len + 50).min(1003 - p.begin));
            } else {
                assert_eq!(p.scan_len, p.accept_len);
            }
        }
        assert_eq!(covered, 1003);
    }

    #[test]
    fn test_partition_more_workers_than_bases() {
        let parts = partition(3, 8, 10);
        let covered: usize = parts.iter().map(|p| p.accept_len).sum();
        assert_eq!(covered, 3);
        for p in &parts {
            assert!(p.begin < 3);
        }
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let lib = library(&sts_line());
        let config = SearchConfig { wordsize: 2, ..SearchConfig::default() };
        assert!(matches!(
            SearchEngine::new(&lib, &config).unwrap_err(),
            EpcrError::Config(_)
        ));
    }

    #[test]
    fn test_engine_rejects_unusable_library() {
        let lib = library("S1\tACGT\tTGCA\t100\n");
        let config = SearchConfig::default();
        assert!(matches!(
            SearchEngine::new(&lib, &config).unwrap_err(),
            EpcrError::EmptyLibrary { .. }
        ));
    }

    #[test]
    fn test_duplicate_sts_lines_deduplicated() {
        // The same marker listed twice yields one hit, not two
        let lib = library(&format!("{}{}", sts_line(), sts_line()));
        let config = SearchConfig { margin: 10, ..SearchConfig::default() };
        let engine = SearchEngine::new(&lib, &config).unwrap();

        let mut seq: Vec<u8> = b"AT".iter().copied().cycle().take(500).collect();
        seq[100..160].copy_from_slice(&plant());

        let hits = engine.search_target(&target(seq));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start, 100);
    }

    #[test]
    fn test_hit_multiset_independent_of_workers() {
        let lib = library(&sts_line());
        let plant = plant();

        // Large enough to engage threading, with a plant straddling the
        // first partition boundary (chunk = 62500 for 4 workers).
        let mut seq: Vec<u8> = b"AT".iter().copied().cycle().take(250_000).collect();
        for &pos in &[1_000usize, 62_480, 62_600, 180_000, 248_000] {
            seq[pos..pos + 60].copy_from_slice(&plant);
        }
        let target = target(seq);

        let single = SearchEngine::new(
            &lib,
            &SearchConfig { margin: 10, threads: 1, ..SearchConfig::default() },
        )
        .unwrap();
        let pooled = SearchEngine::new(
            &lib,
            &SearchConfig { margin: 10, threads: 4, ..SearchConfig::default() },
        )
        .unwrap();

        let hits1 = single.search_target(&target);
        let hits4 = pooled.search_target(&target);
        assert_eq!(hits1.len(), 5);
        assert_eq!(hits1, hits4);
        assert_eq!(
            hits1.iter().map(|h| h.start).collect::<Vec<_>>(),
            vec![1_000, 62_480, 62_600, 180_000, 248_000]
        );
    }

    #[test]
    fn test_run_writes_and_counts() {
        let lib = library(&sts_line());
        let config = SearchConfig { margin: 10, ..SearchConfig::default() };
        let engine = SearchEngine::new(&lib, &config).unwrap();

        let mut seq: Vec<u8> = b"AT".iter().copied().cycle().take(400).collect();
        seq[40..100].copy_from_slice(&plant());

        let mut writer = HitWriter::new(Vec::new(), false);
        let total = engine.run(&[target(seq)], &mut writer).unwrap();
        assert_eq!(total, 1);

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "t1\t41..100\tS1\t(+)\n");
    }

    #[test]
    fn test_run_is_deterministic() {
        let lib = library(&sts_line());
        let config = SearchConfig { margin: 10, threads: 2, ..SearchConfig::default() };
        let engine = SearchEngine::new(&lib, &config).unwrap();

        let mut seq: Vec<u8> = b"AT".iter().copied().cycle().take(400).collect();
        seq[40..100].copy_from_slice(&plant());
        let targets = vec![target(seq)];

        let mut first = HitWriter::new(Vec::new(), false);
        engine.run(&targets, &mut first).unwrap();
        let mut second = HitWriter::new(Vec::new(), false);
        engine.run(&targets, &mut second).unwrap();

        assert_eq!(
            first.into_inner().unwrap(),
            second.into_inner().unwrap()
        );
    }

    #[test]
    fn test_cancelled_engine_finds_nothing() {
        let lib = library(&sts_line());
        let config = SearchConfig { margin: 10, ..SearchConfig::default() };
        let engine = SearchEngine::new(&lib, &config).unwrap();
        engine.cancel_token().cancel();

        let mut seq: Vec<u8> = b"AT".iter().copied().cycle().take(400).collect();
        seq[40..100].copy_from_slice(&plant());
        assert!(engine.search_target(&target(seq)).is_empty());
    }
}
