//! Terminal output formatting for reduced benchmark results.

use std::io::{self, Write};

use crate::analysis::{Comparison, MetricStat};

/// Print a titled banner with the number of trials behind the results.
pub fn print_banner(title: &str, trials: usize) {
    println!();
    println!("  {title}");
    println!("  {}", "=".repeat(title.len()));
    println!("  {trials} trials after warm-up");
}

/// Print metrics as a formatted table.
pub fn print_metric_table(metrics: &[MetricStat]) {
    if metrics.is_empty() {
        println!("  No results to display.");
        return;
    }

    let max_name = metrics
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!();
    println!(
        "  {:<width$}  {:>12}  {:>10}  {:>10}  {:>12}  {:>12}  {:>8}  {:>7}",
        "Type",
        "Mean (cy)",
        "Min (cy)",
        "Max (cy)",
        "Median (cy)",
        "Stddev (cy)",
        "Stddev%",
        "Samples",
        width = max_name
    );
    println!(
        "  {:-<width$}  {:->12}  {:->10}  {:->10}  {:->12}  {:->12}  {:->8}  {:->7}",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        width = max_name
    );

    for metric in metrics {
        println!(
            "  {:<width$}  {:>12.1}  {:>10}  {:>10}  {:>12.1}  {:>12.1}  {:>7.1}%  {:>7}",
            metric.name,
            metric.mean,
            metric.min,
            metric.max,
            metric.median,
            metric.stddev,
            metric.stddev_pct,
            metric.count,
            width = max_name
        );
    }
    println!();
}

/// Write a baseline comparison to `out`, flagging regressions.
///
/// Goes to stderr alongside `--json` so stdout stays a single document.
pub fn print_comparison(
    out: &mut dyn Write,
    rows: &[Comparison],
    threshold_pct: u32,
) -> io::Result<()> {
    writeln!(out, "\n  Baseline comparison (threshold: {threshold_pct}%):")?;

    let mut regressions = 0;
    for row in rows {
        match row.baseline_mean {
            Some(base) => {
                let direction = if row.change_pct > 0.0 { "slower" } else { "faster" };
                let flag = if row.regression {
                    regressions += 1;
                    " REGRESSION"
                } else {
                    ""
                };
                writeln!(
                    out,
                    "    {} : {base:.1} -> {:.1} ({:.1}% {direction}){flag}",
                    row.name,
                    row.current_mean,
                    row.change_pct.abs()
                )?;
            }
            None => writeln!(out, "    {} : new (no baseline)", row.name)?,
        }
    }

    if regressions > 0 {
        writeln!(out, "\n  {regressions} regression(s) detected!")
    } else {
        writeln!(out, "\n  No regressions detected.")
    }
}
