//! maple-tools CLI
//!
//! Usage: maple <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::process;

use maple_tools::commands::{Combine, ConvertCommand, MaskCommand};
use maple_tools::maple::MapleError;

#[derive(Parser)]
#[command(name = "maple")]
#[command(version)]
#[command(about = "Maple run-length variant encoding: BED masking and GVCF conversion", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Log per-file progress to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mask maple files against a BED region blacklist
    Mask {
        /// File listing the maple files to mask, one path per line
        #[arg(short = 'l', long)]
        list: PathBuf,

        /// BED file of mask regions (chromosome-matched to the inputs)
        #[arg(short = 'm', long)]
        mask: PathBuf,

        /// Directory for the masked maple files (same base names)
        #[arg(short = 'd', long)]
        output_dir: PathBuf,

        /// Process the listed files one at a time
        #[arg(long)]
        sequential: bool,

        /// Print masking statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Convert a haploid GVCF (.g.vcf or .g.vcf.gz) into a maple file
    Convert {
        /// Input GVCF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output maple file (default: input with the suffix replaced)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum read depth (DP) for a confident call
        #[arg(long, default_value = "20")]
        min_depth: u64,

        /// Minimum genotype quality (GQ) for a confident call
        #[arg(long, default_value = "99")]
        min_quality: u64,

        /// Require both thresholds ("and") or either one ("or")
        #[arg(long, default_value = "and", value_parser = ["and", "or"])]
        combine: String,

        /// Print conversion statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .expect("Failed to initialize thread pool");
    }

    let result = match cli.command {
        Commands::Mask {
            list,
            mask,
            output_dir,
            sequential,
            stats,
        } => run_mask(list, mask, output_dir, sequential, stats),

        Commands::Convert {
            input,
            output,
            min_depth,
            min_quality,
            combine,
            stats,
        } => run_convert(input, output, min_depth, min_quality, combine, stats),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_mask(
    list: PathBuf,
    mask: PathBuf,
    output_dir: PathBuf,
    sequential: bool,
    stats: bool,
) -> Result<(), MapleError> {
    let mut cmd = MaskCommand::new();
    cmd.parallel = !sequential;

    let result = cmd.run(&list, &mask, &output_dir)?;

    if stats {
        eprintln!("Mask stats: {}", result);
    }

    Ok(())
}

fn run_convert(
    input: PathBuf,
    output: Option<PathBuf>,
    min_depth: u64,
    min_quality: u64,
    combine: String,
    stats: bool,
) -> Result<(), MapleError> {
    let mut cmd = ConvertCommand::new();
    cmd.dp_min = min_depth;
    cmd.gq_min = min_quality;
    cmd.combine = match combine.as_str() {
        "or" => Combine::Or,
        _ => Combine::And,
    };

    let result = cmd.run(&input, output.as_deref())?;

    if stats {
        eprintln!("Convert stats: {}", result);
    }

    Ok(())
}
