use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use psylog::{batch_parse, print_summary, BatchOptions};

/// Batch-convert PsychoPy-style behavior logs into CSV tables.
#[derive(Parser)]
#[command(name = "psylog")]
#[command(version)]
#[command(about = "Batch-convert PsychoPy-style behavior logs into CSV tables")]
struct Cli {
    /// Directory containing log files (searched recursively)
    #[arg(short = 'i', long = "input-dir")]
    input_dir: PathBuf,

    /// Directory to write CSV outputs (created if missing)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: PathBuf,

    /// Glob pattern matched against log file names
    #[arg(long, default_value = BatchOptions::DEFAULT_PATTERN)]
    pattern: String,

    /// Rewrite CSVs even if they already exist
    #[arg(long)]
    overwrite: bool,

    /// List what would be done without writing files
    #[arg(long = "dry-run")]
    dry_run: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = BatchOptions {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        pattern: cli.pattern,
        overwrite: cli.overwrite,
        dry_run: cli.dry_run,
    };

    match batch_parse(&options) {
        Ok(summary) => {
            print_summary(&summary);
            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("psylog: {err}");
            ExitCode::from(2)
        }
    }
}
