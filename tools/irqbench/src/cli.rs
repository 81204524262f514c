//! Command-line interface definitions for irqbench.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Reduce captured IRQ benchmark logs to overhead-corrected cycle statistics.
#[derive(Parser)]
#[command(name = "irqbench", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (tracepoint layout and reduction parameters).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Print only the results.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output with stage timings and pipeline diagnostics.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Reduce a kernel tracepoint log (HIRQLOG).
    Kernel(KernelArgs),
    /// Reduce user-level IRQ measurements (HIRQUSR).
    User(UserArgs),
}

/// Arguments shared by every report.
#[derive(Args)]
pub struct ReportArgs {
    /// Path to the captured serial data.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Leading trials to ignore per measurement (overrides the config file).
    #[arg(long)]
    pub ignored: Option<usize>,

    /// Print results as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Save the results as a baseline JSON file.
    #[arg(long)]
    pub save_baseline: Option<PathBuf>,

    /// Compare against a baseline JSON file and flag regressions.
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Mean increase, in percent, above which a metric is a regression.
    #[arg(long, default_value_t = 5)]
    pub threshold: u32,
}

/// Arguments for the `kernel` subcommand.
#[derive(Args)]
pub struct KernelArgs {
    /// Shared report arguments.
    #[command(flatten)]
    pub report: ReportArgs,

    /// Number of tracepoint overheads to subtract from each path trial
    /// (overrides the config file; defaults to the number of path tracepoints).
    #[arg(long)]
    pub scale: Option<u32>,
}

/// Arguments for the `user` subcommand.
#[derive(Args)]
pub struct UserArgs {
    /// Shared report arguments.
    #[command(flatten)]
    pub report: ReportArgs,
}
