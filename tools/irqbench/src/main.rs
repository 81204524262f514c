//! IRQ benchmark log reduction tool.
//!
//! Reads the binary data an IRQ benchmark captured over serial, reduces it
//! with `irqbench-reduce`, and reports overhead-corrected cycle statistics.
//!
//! Pipeline: read capture → parse wire format → reduce → table / JSON →
//!           optional baseline save and comparison.

mod analysis;
mod cli;
mod config;
mod output;
mod verbose;
mod wire;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use irqbench_reduce::{reduce_kernel_log, reduce_user_runs};

use crate::analysis::MetricStat;
use crate::cli::ReportArgs;
use crate::config::BenchConfig;
use crate::verbose::{Timer, dprintln, vprintln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let config = BenchConfig::load(cli.config.as_deref())?;

    match cli.command {
        cli::Command::Kernel(ref args) => cmd_kernel(&config, args),
        cli::Command::User(ref args) => cmd_user(&config, args),
    }
}

/// `irqbench kernel`: reduce a kernel tracepoint log.
fn cmd_kernel(config: &BenchConfig, args: &cli::KernelArgs) -> Result<()> {
    let data = read_capture(&args.report.input)?;
    let samples = {
        let _t = Timer::start("parse");
        wire::parse_kernel_log(&data)?
    };
    vprintln!("  {} tracepoint samples", samples.len());

    let layout = config.layout();
    let reduce_config = config.kernel_reduce_config(args.report.ignored, args.scale);
    let report = {
        let _t = Timer::start("reduction");
        reduce_kernel_log(samples, &layout, &reduce_config)
            .with_context(|| format!("reducing {}", args.report.input.display()))?
    };
    vprintln!(
        "  overhead {:.1} cycles subtracted {} times per trial",
        report.estimate.cycles(),
        report.scale
    );

    let metrics = analysis::kernel_metrics(&report);
    if args.report.json {
        print_json(&metrics)?;
    } else {
        let titles = [
            "Tracepoint Overhead",
            "IRQ Path Cycle Count (accounting for overhead)",
        ];
        for (title, metric) in titles.into_iter().zip(&metrics) {
            output::print_banner(title, metric.count);
            output::print_metric_table(std::slice::from_ref(metric));
        }
    }

    handle_baselines("kernel", &metrics, &args.report)
}

/// `irqbench user`: reduce user-level IRQ runs.
fn cmd_user(config: &BenchConfig, args: &cli::UserArgs) -> Result<()> {
    let data = read_capture(&args.report.input)?;
    let runs = {
        let _t = Timer::start("parse");
        wire::parse_user_runs(&data)?
    };
    vprintln!("  {} runs per measurement", runs.overheads.len());

    let reduce_config = config.user_reduce_config(args.report.ignored);
    let report = {
        let _t = Timer::start("reduction");
        reduce_user_runs(&runs, &reduce_config)
            .with_context(|| format!("reducing {}", args.report.input.display()))?
    };

    let metrics = analysis::user_metrics(&report);
    if args.report.json {
        print_json(&metrics)?;
    } else {
        output::print_banner(
            "IRQ Path Cycle Count (measured from user level)",
            report.thread.n,
        );
        output::print_metric_table(&metrics);
    }

    handle_baselines("user", &metrics, &args.report)
}

/// Read the captured serial data.
fn read_capture(path: &Path) -> Result<Vec<u8>> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read input '{}'", path.display()))?;
    dprintln!("Parsing {} ({} bytes)...", path.display(), data.len());
    Ok(data)
}

fn print_json(metrics: &[MetricStat]) -> Result<()> {
    let json = serde_json::to_string_pretty(metrics).context("serializing results to JSON")?;
    println!("{json}");
    Ok(())
}

/// Save and/or compare against a baseline, as requested.
fn handle_baselines(benchmark: &str, metrics: &[MetricStat], args: &ReportArgs) -> Result<()> {
    if let Some(ref path) = args.save_baseline {
        analysis::save_baseline(benchmark, metrics, path)?;
        dprintln!("  Baseline saved to {}", path.display());
    }

    if let Some(ref path) = args.baseline {
        let rows = analysis::compare_baseline(benchmark, metrics, path, args.threshold)?;
        let written = if args.json {
            output::print_comparison(&mut std::io::stderr().lock(), &rows, args.threshold)
        } else {
            output::print_comparison(&mut std::io::stdout().lock(), &rows, args.threshold)
        };
        written.context("writing baseline comparison")?;
    }

    Ok(())
}
