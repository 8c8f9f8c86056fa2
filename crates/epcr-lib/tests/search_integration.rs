//! End-to-end tests: STS file + FASTA file in, formatted hits out.

use std::io::Write;

use tempfile::NamedTempFile;

use epcr_lib::{
    codec::reverse_complement, load_fasta_file, Comparator, Direction, HitWriter, SearchConfig,
    SearchEngine, Strand, StsLibrary,
};

const P1: &str = "GCTAAAAATACACGGATGG"; // 19 nt
const P2: &str = "TGCAAGACTGCGTCTC"; // 16 nt
const Q1: &str = "CAGGTCAGGTCA"; // 12 nt
const Q2: &str = "GTCCATGTCCAT"; // 12 nt

fn write_temp(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

fn sts_file() -> NamedTempFile {
    write_temp(&format!(
        "# test markers\n\
         S1\t{P1}\t{P2}\t60\n\
         S2\t{Q1}\t{Q2}\t40\tchrX marker\n"
    ))
}

/// Two targets: a plus-strand S1 hit plus an annotated S2 hit on the
/// first, a minus-strand S1 hit on the second.
fn fasta_file() -> NamedTempFile {
    let rc_p1 = String::from_utf8(reverse_complement(P1.as_bytes())).unwrap();
    let t1 = format!(
        "TTTTTTTTTTTT{P1}{spacer}{P2}GGGGGGGGGGGG{Q1}{qspacer}{Q2}GGGGGGGGGGGG",
        spacer = "C".repeat(25),
        qspacer = "ACACACACACACACAC",
    );
    let t2 = format!(
        "TTTTTTTTTTTT{P2}{spacer}{rc_p1}GGGGGGGGGGGG",
        spacer = "C".repeat(25),
    );
    write_temp(&format!(">t1 first target\n{t1}\n>t2 second target\n{t2}\n"))
}

fn config() -> SearchConfig {
    SearchConfig {
        wordsize: 11,
        margin: 10,
        ..SearchConfig::default()
    }
}

fn run_files(
    sts: &NamedTempFile,
    fasta: &NamedTempFile,
    config: &SearchConfig,
) -> (u64, String) {
    let library = StsLibrary::load(sts.path(), config.default_pcr_size).unwrap();
    let targets = load_fasta_file(fasta.path()).unwrap();
    let engine = SearchEngine::new(&library, config).unwrap();

    let mut writer = HitWriter::new(Vec::new(), false);
    let total = engine.run(&targets, &mut writer).unwrap();
    (total, String::from_utf8(writer.into_inner().unwrap()).unwrap())
}

#[test]
fn test_end_to_end_both_strands() {
    let (total, out) = run_files(&sts_file(), &fasta_file(), &config());
    assert_eq!(total, 3);
    assert_eq!(
        out,
        "t1\t13..72\tS1\t(+)\n\
         t1\t85..124\tS2\t(+)\tchrX marker\n\
         t2\t13..72\tS1\t(-)\n"
    );
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let sts = sts_file();
    let fasta = fasta_file();
    let config = SearchConfig { threads: 2, ..config() };
    let (_, first) = run_files(&sts, &fasta, &config);
    let (_, second) = run_files(&sts, &fasta, &config);
    assert_eq!(first, second);
}

#[test]
fn test_emitted_hits_reverify() {
    let sts = sts_file();
    let fasta = fasta_file();
    let config = config();

    let library = StsLibrary::load(sts.path(), config.default_pcr_size).unwrap();
    let targets = load_fasta_file(fasta.path()).unwrap();
    let engine = SearchEngine::new(&library, &config).unwrap();
    let comparator = Comparator::new(config.mismatches, config.three_prime, config.iupac);

    let mut seen_any = false;
    for target in &targets {
        for hit in engine.search_target(target) {
            seen_any = true;
            let record = &engine.index().records()[hit.record as usize];
            let span = hit.end - hit.start + 1;

            // Span stays within the declared size plus margin, inside
            // the target.
            assert!(span >= record.sts.pcr_size.saturating_sub(config.margin));
            assert!(span <= record.sts.pcr_size + config.margin);
            assert!(hit.end < target.seq.len());

            // Both primers re-verify at their reported positions.
            let leading = record.leading;
            let trailing = record.trailing();
            assert!(comparator.matches(
                &target.seq[hit.start..hit.start + leading.len()],
                leading,
                Direction::Forward,
            ));
            assert!(comparator.matches(
                &target.seq[hit.end + 1 - trailing.len()..hit.end + 1],
                trailing,
                Direction::Reverse,
            ));

            // Strand bookkeeping matches the record that fired.
            match record.strand {
                Strand::Plus => assert_eq!(leading, record.sts.primer1.as_slice()),
                Strand::Minus => assert_eq!(leading, record.sts.primer2.as_slice()),
            }
        }
    }
    assert!(seen_any);
}

#[test]
fn test_iupac_primer_end_to_end() {
    let sts = write_temp("S4\tACGTACGTACGNTACGT\tCCGGAATTCCGG\t50\n");
    let fasta = write_temp(&format!(
        ">t\nTTTTTTTTTT{occ}{spacer}CCGGAATTCCGGGGGGGGGGGG\n",
        occ = "ACGTACGTACGATACGT",
        spacer = "C".repeat(21),
    ));

    let iupac_on = SearchConfig { iupac: true, ..config() };
    let (total, out) = run_files(&sts, &fasta, &iupac_on);
    assert_eq!(total, 1);
    assert_eq!(out, "t\t11..60\tS4\t(+)\n");

    // Without IUPAC mode the N in the primer is a plain mismatch.
    let (total, out) = run_files(&sts, &fasta, &config());
    assert_eq!(total, 0);
    assert!(out.is_empty());
}

#[test]
fn test_empty_fasta_is_successful_empty_run() {
    let sts = sts_file();
    let fasta = write_temp("");
    let (total, out) = run_files(&sts, &fasta, &config());
    assert_eq!(total, 0);
    assert!(out.is_empty());
}

#[test]
fn test_fasta_payload_filtering() {
    // Digits and whitespace in the payload are stripped before
    // scanning, so coordinates refer to the cleaned sequence.
    let sts = sts_file();
    let fasta = write_temp(&format!(
        ">t numbered\n  1 TTTTTTTTTTTT{P1}\n  2 {spacer}{P2}GGGGGGGGGGGG\n",
        spacer = "C".repeat(25),
    ));
    let (total, out) = run_files(&sts, &fasta, &config());
    assert_eq!(total, 1);
    assert_eq!(out, "t\t13..72\tS1\t(+)\n");
}

#[test]
fn test_zero_record_sts_file_is_fatal() {
    let sts = write_temp("# nothing but comments\n");
    let err = StsLibrary::load(sts.path(), 240).unwrap_err();
    assert!(matches!(err, epcr_lib::EpcrError::InvalidInput { .. }));
}
