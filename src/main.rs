//! mergedirs - Merge multiple source trees into one destination.
//!
//! Usage:
//!   mergedirs SRC DEST                 Merge everything matching SRC into DEST
//!   mergedirs --config merge.toml      Merge the targets listed in a TOML file
//!   mergedirs --help                   Show help

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tracing_subscriber::EnvFilter;

use mergedirs_core::{
    CancellationToken, ConflictResolution, MergeConfig, MergeDirsOptions, MergeError,
    MergeResult, MergeTarget,
};
use mergedirs_ops::merge_dirs;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MERGEDIRS_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "mergedirs",
    version,
    about = "Merge multiple source trees into one destination",
    long_about = "mergedirs selects files and directories with glob patterns and merges \
                  them into a destination directory, resolving conflicts with a policy.\n\n\
                  Pass SRC and DEST for a single target, or --config for a TOML file \
                  listing several targets."
)]
struct Cli {
    /// Glob pattern selecting sources, relative to the root
    #[arg(required_unless_present = "config")]
    src: Option<String>,

    /// Destination directory
    #[arg(required_unless_present = "config")]
    dest: Option<PathBuf>,

    /// What to do when a destination already exists
    #[arg(short = 'c', long, default_value = "overwrite")]
    conflict_resolution: ConflictPolicy,

    /// Record failures and keep going instead of aborting
    #[arg(short = 'f', long)]
    ignore_errors: bool,

    /// Skip directories that contain no files
    #[arg(short = 'i', long)]
    ignore_empty_folders: bool,

    /// Keep the directory structure below the first path segment
    #[arg(long)]
    no_flatten: bool,

    /// Replace existing destination directories instead of merging into them
    #[arg(long)]
    overwrite_directory: bool,

    /// Glob patterns to exclude (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,

    /// Directory patterns are resolved against (defaults to current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// TOML file with merge targets
    #[arg(long, value_name = "FILE", conflicts_with_all = ["src", "dest"])]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ConflictPolicy {
    #[default]
    Overwrite,
    Skip,
}

impl From<ConflictPolicy> for ConflictResolution {
    fn from(policy: ConflictPolicy) -> Self {
        match policy {
            ConflictPolicy::Overwrite => ConflictResolution::Overwrite,
            ConflictPolicy::Skip => ConflictResolution::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    let mut options = build_options(cli)?;

    let cancel = CancellationToken::new();
    options.cancel = Some(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping merge");
            cancel.cancel();
        }
    });

    match merge_dirs(options).await {
        Ok(result) => {
            print_report(&result, format)?;
            if !result.errors.is_empty() {
                eprintln!("{} item(s) failed", result.errors.len());
            }
            Ok(())
        }
        Err(err) => {
            if let Some(partial) = err.partial() {
                print_report(partial, format)?;
            }
            Err(eyre!(err))
        }
    }
}

/// Build merge options from a config file or the positional arguments.
fn build_options(cli: Cli) -> Result<MergeDirsOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let config = MergeConfig::from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            config.into_options()?
        }
        None => {
            let (Some(src), Some(dest)) = (cli.src, cli.dest) else {
                bail!("SRC and DEST are required without --config");
            };
            let target = MergeTarget::new(src, dest)
                .with_ignore(cli.ignore)
                .with_flatten(!cli.no_flatten)
                .with_overwrite_directory(cli.overwrite_directory)
                .with_conflict_resolution(cli.conflict_resolution);

            MergeDirsOptions::builder()
                .target(target)
                .build()
                .map_err(|e| MergeError::invalid_config(e.to_string()))?
        }
    };

    if let Some(root) = cli.root {
        options.root = Some(root);
    }
    options.ignore_errors |= cli.ignore_errors;
    options.ignore_empty_folders |= cli.ignore_empty_folders;

    Ok(options)
}

fn print_report(result: &MergeResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for record in &result.successes {
                println!(" {} -> {}", record.source.display(), record.dest.display());
            }
            for failure in &result.errors {
                println!(" ! {failure}");
            }
            if !result.successes.is_empty() || !result.errors.is_empty() {
                println!();
            }
            println!(
                " {} ({} copied)",
                result.summary(),
                format_size(result.bytes_copied)
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }

    Ok(())
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
