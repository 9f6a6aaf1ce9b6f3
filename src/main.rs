use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sbwt::genomics::{CyclicIndex, CyclicSuffixSorter, IndexConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sbwt", about = "Cyclic suffix array construction for DNA search")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and persist the cyclic suffix array of a reference.
    BuildIndex {
        /// Reference genome (FASTA/FASTQ; the first record is indexed).
        reference: PathBuf,
        /// Sampling step (period) between compared positions.
        step: usize,
        /// Output prefix (defaults to the reference path).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Refine independent ranges in parallel.
        #[arg(long)]
        parallel: bool,
        /// Check the result against the direct rotation comparator.
        #[arg(long)]
        verify: bool,
    },
    /// Sort the rotations of a literal sequence over {$,A,C,G,T}.
    Sort {
        /// Sequence to sort.
        sequence: String,
        /// Sampling step (period) between compared positions.
        #[arg(long, default_value_t = 1)]
        step: usize,
        /// Refine independent ranges in parallel.
        #[arg(long)]
        parallel: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::BuildIndex {
            reference,
            step,
            output,
            parallel,
            verify,
        } => run_build_index(reference, step, output, parallel, verify)?,
        Commands::Sort {
            sequence,
            step,
            parallel,
        } => run_sort(&sequence, step, parallel)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_build_index(
    reference: PathBuf,
    step: usize,
    output: Option<PathBuf>,
    parallel: bool,
    verify: bool,
) -> Result<()> {
    let config = IndexConfig::with_step(step)?.with_parallel(parallel);
    let index = CyclicIndex::from_fasta(&reference, &config)
        .with_context(|| format!("failed to build index for {}", reference.display()))?;

    if verify && !index.verify() {
        bail!("suffix array failed verification against the rotation comparator");
    }

    let prefix = output.unwrap_or(reference);
    index
        .write_to(&prefix)
        .with_context(|| format!("failed to write index with prefix {}", prefix.display()))?;

    let stats = index.stats();
    info!(
        length = index.len(),
        step,
        rounds = stats.rounds,
        max_active_ranges = stats.max_active_ranges,
        unresolved_ties = stats.unresolved_ties,
        verified = verify,
        "done"
    );
    Ok(())
}

fn run_sort(sequence: &str, step: usize, parallel: bool) -> Result<()> {
    let sequence = sequence.to_ascii_uppercase().into_bytes();
    let sorter = CyclicSuffixSorter::new(&sequence, step)
        .context("invalid sort parameters")?
        .parallel(parallel);
    let (suffix_array, _) = sorter.build().context("suffix sort failed")?;

    let rendered: Vec<String> = suffix_array.iter().map(|s| s.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(())
}
