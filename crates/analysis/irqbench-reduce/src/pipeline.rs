//! End-to-end reduction of the two IRQ benchmark kinds.
//!
//! - The kernel benchmark logs tracepoint samples: an overhead tracepoint and
//!   the tracepoints bracketing the IRQ path. The path is rebuilt per trial
//!   and corrected for the overhead of every bracketing tracepoint.
//! - The user-level benchmark records three arrays of per-run cycle counts:
//!   measurement overhead, IRQ delivery to a thread in the same address
//!   space, and IRQ delivery to another process.

use alloc::vec::Vec;

use crate::error::{ReduceError, Result};
use crate::group::group;
use crate::overhead::{Estimator, OverheadEstimate, correct};
use crate::path::combine_all;
use crate::sample::{Cycles, Sample, SignedCycles, TagId};
use crate::scratch;
use crate::stats::{Summary, reduce};
use crate::warmup::{discard_leading, usable};

/// Default number of leading trials ignored per measurement.
pub const DEFAULT_IGNORED: usize = 10;

/// Which tracepoints of a kernel log measure what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracepointLayout {
    /// Number of tracepoints in the log.
    pub num_tags: usize,
    /// Tracepoint measuring an empty start/stop pair.
    pub overhead: TagId,
    /// Tracepoints whose per-trial sum is the IRQ path.
    pub path: Vec<TagId>,
}

impl Default for TracepointLayout {
    fn default() -> Self {
        Self {
            num_tags: 3,
            overhead: TagId(0),
            path: alloc::vec![TagId(1), TagId(2)],
        }
    }
}

/// Parameters of a reduction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceConfig {
    /// Leading trials dropped from every measurement.
    pub ignored: usize,
    /// Overhead multiplier. Defaults to the number of path tracepoints for
    /// kernel logs and to 1 for user-level runs.
    pub scale: Option<u32>,
    /// Overhead statistic. Defaults to the mean for kernel logs and to the
    /// minimum for user-level runs.
    pub estimator: Option<Estimator>,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            ignored: DEFAULT_IGNORED,
            scale: None,
            estimator: None,
        }
    }
}

/// Result of reducing a kernel tracepoint log.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelIrqReport {
    /// Overhead of a single tracepoint.
    pub overhead: Summary<Cycles>,
    /// Overhead value subtracted per tracepoint.
    pub estimate: OverheadEstimate,
    /// Number of times the overhead was subtracted from each path trial.
    pub scale: u32,
    /// IRQ path cycle counts with the overhead removed.
    pub path: Summary<SignedCycles>,
}

/// Reduce a kernel tracepoint log.
pub fn reduce_kernel_log(
    samples: Vec<Sample>,
    layout: &TracepointLayout,
    config: &ReduceConfig,
) -> Result<KernelIrqReport> {
    let log = group(samples, layout.num_tags)?;

    let overhead_range = usable(log.range(layout.overhead)?, config.ignored)?;
    let overhead = reduce(&log.cycles_in(overhead_range)?)?;
    let estimate =
        OverheadEstimate::from_summary(&overhead, config.estimator.unwrap_or(Estimator::Mean));

    let mut phases: Vec<Vec<Cycles>> = scratch(layout.path.len())?;
    for &tag in &layout.path {
        let range = usable(log.range(tag)?, config.ignored)?;
        phases.push(log.cycles_in(range)?);
    }
    let mut phase_refs: Vec<&[Cycles]> = scratch(phases.len())?;
    phase_refs.extend(phases.iter().map(Vec::as_slice));
    let combined = combine_all(&phase_refs)?;

    let scale = match config.scale {
        Some(scale) => scale,
        None => u32::try_from(layout.path.len()).map_err(|_| ReduceError::InvalidScale)?,
    };
    let corrected = correct(&combined, &estimate, scale)?;
    let path = reduce(&corrected)?;

    tracing::debug!(
        overhead = estimate.cycles(),
        trials = path.n,
        mean = path.mean,
        "reduced kernel IRQ log"
    );

    Ok(KernelIrqReport {
        overhead,
        estimate,
        scale,
        path,
    })
}

/// Per-run cycle counts of the user-level IRQ benchmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRuns {
    /// Cost of the measurement itself.
    pub overheads: Vec<Cycles>,
    /// IRQ delivered to a thread in the same address space.
    pub thread: Vec<Cycles>,
    /// IRQ delivered to a thread in another address space.
    pub process: Vec<Cycles>,
}

/// Result of reducing user-level runs.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIrqReport {
    /// Measurement overhead.
    pub overhead: Summary<Cycles>,
    /// Overhead value subtracted from every run.
    pub estimate: OverheadEstimate,
    /// Without context switch.
    pub thread: Summary<SignedCycles>,
    /// With context switch.
    pub process: Summary<SignedCycles>,
}

/// Reduce the user-level runs.
///
/// The overhead estimate is taken after the warm-up discount and then
/// removed from every run of the other two arrays before their own warm-up
/// discount.
pub fn reduce_user_runs(runs: &UserRuns, config: &ReduceConfig) -> Result<UserIrqReport> {
    for other in [&runs.thread, &runs.process] {
        if other.len() != runs.overheads.len() {
            return Err(ReduceError::LengthMismatch {
                left: runs.overheads.len(),
                right: other.len(),
            });
        }
    }

    let overhead = reduce(discard_leading(&runs.overheads, config.ignored, "overhead")?)?;
    let estimate =
        OverheadEstimate::from_summary(&overhead, config.estimator.unwrap_or(Estimator::Min));
    let scale = config.scale.unwrap_or(1);

    let thread = correct(&runs.thread, &estimate, scale)?;
    let thread = reduce(discard_leading(&thread, config.ignored, "thread irq")?)?;
    let process = correct(&runs.process, &estimate, scale)?;
    let process = reduce(discard_leading(&process, config.ignored, "process irq")?)?;

    tracing::debug!(
        runs = runs.overheads.len(),
        overhead = estimate.cycles(),
        "reduced user-level IRQ runs"
    );

    Ok(UserIrqReport {
        overhead,
        estimate,
        thread,
        process,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataSource;

    fn kernel_log() -> Vec<Sample> {
        // Interleaved in the order the trials ran.
        [
            (0, 50),
            (1, 900),
            (2, 800),
            (0, 12),
            (1, 400),
            (2, 300),
            (1, 410),
            (2, 290),
            (1, 420),
            (2, 310),
        ]
        .iter()
        .map(|&(tag, value)| Sample::new(TagId(tag), value))
        .collect()
    }

    fn config(ignored: usize) -> ReduceConfig {
        ReduceConfig {
            ignored,
            ..ReduceConfig::default()
        }
    }

    #[test]
    fn kernel_log_end_to_end() {
        let report =
            reduce_kernel_log(kernel_log(), &TracepointLayout::default(), &config(1)).unwrap();

        assert_eq!(report.overhead.n, 1);
        assert_eq!(report.overhead.mean, 12.0);
        assert_eq!(report.scale, 2);

        // Paths 700, 700, 730, each minus 2 * 12.
        assert_eq!(report.path.n, 3);
        assert_eq!(report.path.min, 676);
        assert_eq!(report.path.max, 706);
        assert_eq!(report.path.mean, 686.0);
        assert_eq!(report.path.median, 676.0);
    }

    #[test]
    fn kernel_log_explicit_scale_and_estimator() {
        let config = ReduceConfig {
            ignored: 0,
            scale: Some(1),
            estimator: Some(Estimator::Min),
        };
        let report =
            reduce_kernel_log(kernel_log(), &TracepointLayout::default(), &config).unwrap();
        assert_eq!(report.estimate.cycles(), 12.0);
        // Paths 1700, 700, 700, 730, each minus 12.
        assert_eq!(report.path.n, 4);
        assert_eq!(report.path.max, 1688);
        assert_eq!(report.path.min, 688);
    }

    #[test]
    fn kernel_log_missing_tracepoint() {
        let samples: Vec<Sample> = kernel_log()
            .into_iter()
            .filter(|s| s.tag != TagId(0))
            .collect();
        let err = reduce_kernel_log(samples, &TracepointLayout::default(), &config(1)).unwrap_err();
        assert_eq!(
            err,
            ReduceError::InsufficientData {
                source: DataSource::Tracepoint(TagId(0)),
                recorded: 0,
                ignored: 1,
            }
        );
    }

    #[test]
    fn kernel_log_unbalanced_path() {
        let mut samples = kernel_log();
        samples.push(Sample::new(TagId(1), 430));
        let err = reduce_kernel_log(samples, &TracepointLayout::default(), &config(1)).unwrap_err();
        assert_eq!(err, ReduceError::LengthMismatch { left: 4, right: 3 });
    }

    #[test]
    fn kernel_log_negative_path_is_kept() {
        let samples = vec![
            Sample::new(TagId(0), 100),
            Sample::new(TagId(1), 60),
            Sample::new(TagId(2), 60),
        ];
        let report = reduce_kernel_log(samples, &TracepointLayout::default(), &config(0)).unwrap();
        assert_eq!(report.path.min, -80);
    }

    #[test]
    fn user_runs_end_to_end() {
        let runs = UserRuns {
            overheads: vec![90, 20, 22, 21],
            thread: vec![900, 520, 540, 530],
            process: vec![1900, 1020, 1060, 1040],
        };
        let report = reduce_user_runs(&runs, &config(1)).unwrap();

        assert_eq!(report.overhead.min, 20);
        assert_eq!(report.estimate.estimator(), Estimator::Min);
        assert_eq!(report.thread.n, 3);
        assert_eq!(report.thread.min, 500);
        assert_eq!(report.thread.mean, 510.0);
        assert_eq!(report.process.min, 1000);
        assert_eq!(report.process.mean, 1020.0);
    }

    #[test]
    fn user_runs_length_mismatch() {
        let runs = UserRuns {
            overheads: vec![1, 2, 3],
            thread: vec![1, 2, 3],
            process: vec![1, 2],
        };
        assert_eq!(
            reduce_user_runs(&runs, &config(1)),
            Err(ReduceError::LengthMismatch { left: 3, right: 2 })
        );
    }

    #[test]
    fn user_runs_all_ignored() {
        let runs = UserRuns {
            overheads: vec![1, 2],
            thread: vec![1, 2],
            process: vec![1, 2],
        };
        assert!(matches!(
            reduce_user_runs(&runs, &config(2)),
            Err(ReduceError::InsufficientData {
                source: DataSource::Runs("overhead"),
                ..
            })
        ));
    }
}
