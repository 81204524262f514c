//! Reported metrics and baseline comparison.

use anyhow::{Context, Result, bail};
use irqbench_reduce::{CycleValue, KernelIrqReport, Summary, UserIrqReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Statistics for a single reported metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStat {
    /// Metric name.
    pub name: String,
    /// Number of trials.
    pub count: usize,
    /// Mean cycles.
    pub mean: f64,
    /// Minimum cycles.
    pub min: i64,
    /// Maximum cycles.
    pub max: i64,
    /// Median cycles.
    pub median: f64,
    /// First quartile.
    pub first_quartile: f64,
    /// Third quartile.
    pub third_quartile: f64,
    /// Standard deviation.
    pub stddev: f64,
    /// Standard deviation relative to the mean, in percent.
    pub stddev_pct: f64,
}

impl MetricStat {
    /// Flatten a summary into a reported metric.
    ///
    /// Extremes are clamped into `i64` here, at the reporting boundary.
    pub fn from_summary<T: CycleValue>(name: &str, summary: &Summary<T>) -> Self {
        Self {
            name: name.to_owned(),
            count: summary.n,
            mean: summary.mean,
            min: clamp_i64(summary.min.widen()),
            max: clamp_i64(summary.max.widen()),
            median: summary.median,
            first_quartile: summary.first_quartile,
            third_quartile: summary.third_quartile,
            stddev: summary.stddev,
            stddev_pct: summary.stddev_pct,
        }
    }
}

fn clamp_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Metrics of a kernel tracepoint log.
pub fn kernel_metrics(report: &KernelIrqReport) -> Vec<MetricStat> {
    vec![
        MetricStat::from_summary("Tracepoint overhead", &report.overhead),
        MetricStat::from_summary("IRQ path (accounting for overhead)", &report.path),
    ]
}

/// Metrics of user-level runs.
pub fn user_metrics(report: &UserIrqReport) -> Vec<MetricStat> {
    vec![
        MetricStat::from_summary("Measurement overhead", &report.overhead),
        MetricStat::from_summary("Without context switch", &report.thread),
        MetricStat::from_summary("With context switch", &report.process),
    ]
}

/// A baseline file containing metric statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct Baseline {
    /// Benchmark kind the baseline was taken from (`kernel` or `user`).
    pub benchmark: String,
    /// Metric statistics keyed by name.
    pub metrics: BTreeMap<String, MetricStat>,
}

/// Outcome of comparing one metric against a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Metric name.
    pub name: String,
    /// Baseline mean, if the baseline has this metric.
    pub baseline_mean: Option<f64>,
    /// Current mean.
    pub current_mean: f64,
    /// Relative change of the mean in percent (positive = slower).
    pub change_pct: f64,
    /// Whether the change exceeds the regression threshold.
    pub regression: bool,
}

/// Save metrics as a JSON baseline file.
pub fn save_baseline(benchmark: &str, metrics: &[MetricStat], path: &Path) -> Result<()> {
    let baseline = Baseline {
        benchmark: benchmark.to_owned(),
        metrics: metrics
            .iter()
            .map(|metric| (metric.name.clone(), metric.clone()))
            .collect(),
    };

    let json = serde_json::to_string_pretty(&baseline).context("serializing baseline to JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing baseline to {}", path.display()))?;
    Ok(())
}

/// Load a baseline file and compare `metrics` against it.
pub fn compare_baseline(
    benchmark: &str,
    metrics: &[MetricStat],
    path: &Path,
    threshold_pct: u32,
) -> Result<Vec<Comparison>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading baseline {}", path.display()))?;
    let baseline: Baseline = serde_json::from_str(&json).context("parsing baseline JSON")?;
    if baseline.benchmark != benchmark {
        bail!(
            "baseline {} was taken from a {} benchmark, not {benchmark}",
            path.display(),
            baseline.benchmark
        );
    }
    Ok(compare(&baseline, metrics, threshold_pct))
}

fn compare(baseline: &Baseline, metrics: &[MetricStat], threshold_pct: u32) -> Vec<Comparison> {
    metrics
        .iter()
        .map(|metric| {
            let base = baseline.metrics.get(&metric.name).map(|b| b.mean);
            let change_pct = match base {
                Some(base) if base != 0.0 => (metric.mean - base) / base.abs() * 100.0,
                _ => 0.0,
            };
            Comparison {
                name: metric.name.clone(),
                baseline_mean: base,
                current_mean: metric.mean,
                change_pct,
                regression: base.is_some() && change_pct > f64::from(threshold_pct),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use irqbench_reduce::reduce;

    fn metric(name: &str, values: &[u64]) -> MetricStat {
        MetricStat::from_summary(name, &reduce(values).unwrap())
    }

    fn baseline(metrics: &[MetricStat]) -> Baseline {
        Baseline {
            benchmark: "kernel".into(),
            metrics: metrics.iter().map(|m| (m.name.clone(), m.clone())).collect(),
        }
    }

    #[test]
    fn from_summary_flattens_signed_summary() {
        let stat = MetricStat::from_summary("path", &reduce(&[-3i64, 5]).unwrap());
        assert_eq!(stat.min, -3);
        assert_eq!(stat.max, 5);
        assert_eq!(stat.count, 2);
        assert_eq!(stat.mean, 1.0);
    }

    #[test]
    fn from_summary_clamps_huge_cycles() {
        let stat = metric("raw", &[u64::MAX]);
        assert_eq!(stat.max, i64::MAX);
    }

    #[test]
    fn compare_flags_regressions_above_threshold() {
        let base = baseline(&[metric("a", &[100]), metric("b", &[100])]);
        let current = [metric("a", &[104]), metric("b", &[110]), metric("c", &[1])];

        let rows = compare(&base, &current, 5);
        assert!(!rows[0].regression);
        assert_eq!(rows[0].change_pct, 4.0);
        assert!(rows[1].regression);
        assert_eq!(rows[2].baseline_mean, None);
        assert!(!rows[2].regression);
    }

    #[test]
    fn compare_faster_is_not_regression() {
        let base = baseline(&[metric("a", &[100])]);
        let rows = compare(&base, &[metric("a", &[50])], 5);
        assert_eq!(rows[0].change_pct, -50.0);
        assert!(!rows[0].regression);
    }

    #[test]
    fn baseline_round_trip_through_file() {
        let path =
            std::env::temp_dir().join(format!("irqbench-baseline-{}.json", std::process::id()));
        let metrics = [metric("a", &[10, 12])];
        save_baseline("user", &metrics, &path).unwrap();

        let rows = compare_baseline("user", &metrics, &path, 5).unwrap();
        assert_eq!(rows[0].change_pct, 0.0);
        assert!(compare_baseline("kernel", &metrics, &path, 5).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
