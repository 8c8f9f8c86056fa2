use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use epcr_lib::{load_fasta_file, HitWriter, SearchConfig, SearchEngine, StsLibrary};
use tracing::info;

#[derive(Parser)]
#[command(name = "epcr")]
#[command(version)]
#[command(about = "Search genomic sequences for STS markers", long_about = None)]
struct Cli {
    /// STS file (tab-delimited: id, primer1, primer2, size[, annotation])
    sts_file: PathBuf,

    /// FASTA sequence file
    fasta_file: PathBuf,

    /// Margin around the expected PCR product size
    #[arg(short = 'M', long, default_value_t = epcr_lib::constants::DEFAULT_MARGIN)]
    margin: usize,

    /// Number of mismatches allowed per primer outside the 3' protected region
    #[arg(short = 'N', long, default_value_t = epcr_lib::constants::DEFAULT_MISMATCHES)]
    mismatches: u32,

    /// Hash word size
    #[arg(short = 'W', long, default_value_t = epcr_lib::constants::DEFAULT_WORDSIZE)]
    wordsize: usize,

    /// Number of worker threads
    #[arg(short = 'T', long, default_value_t = epcr_lib::constants::DEFAULT_THREADS)]
    threads: usize,

    /// Number of 3'-ward bases in which to disallow mismatches
    #[arg(
        short = 'X',
        long = "three-prime-match",
        default_value_t = epcr_lib::constants::DEFAULT_THREE_PRIME
    )]
    three_prime_match: usize,

    /// Output file name ("stdout" or omitted for standard output)
    #[arg(short = 'O', long)]
    output: Option<String>,

    /// Quiet flag (0=verbose, 1=quiet)
    #[arg(short = 'Q', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    quiet: u8,

    /// Default PCR size for STS records that omit their amplicon size
    #[arg(
        short = 'Z',
        long = "default-pcr-size",
        default_value_t = epcr_lib::constants::DEFAULT_PCR_SIZE
    )]
    default_pcr_size: usize,

    /// IUPAC flag (0=ignore ambiguity codes, 1=honor them)
    #[arg(short = 'I', long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    iupac: u8,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: RUST_LOG wins, otherwise the quiet/debug
    // flags choose the default level.
    let default_level = if cli.debug {
        "debug"
    } else if cli.quiet == 0 {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        // Hits go to stdout; keep diagnostics out of the way
        .with_writer(std::io::stderr)
        .init();

    let config = SearchConfig {
        wordsize: cli.wordsize,
        margin: cli.margin,
        mismatches: cli.mismatches,
        three_prime: cli.three_prime_match,
        iupac: cli.iupac != 0,
        default_pcr_size: cli.default_pcr_size,
        threads: cli.threads,
    };
    config.validate()?;

    let library = StsLibrary::load(&cli.sts_file, config.default_pcr_size)
        .with_context(|| format!("failed to load STS file {}", cli.sts_file.display()))?;

    let targets = load_fasta_file(&cli.fasta_file)
        .with_context(|| format!("failed to load FASTA file {}", cli.fasta_file.display()))?;

    let engine = SearchEngine::new(&library, &config)?;

    let total = match cli.output.as_deref() {
        Some(path) if !path.eq_ignore_ascii_case("stdout") => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file {path}"))?;
            let mut writer = HitWriter::new(file, false);
            engine.run(&targets, &mut writer)?
        }
        _ => {
            let mut writer = HitWriter::new(io::stdout(), true);
            engine.run(&targets, &mut writer)?
        }
    };

    info!("Search complete: {} hits found", total);
    Ok(())
}
