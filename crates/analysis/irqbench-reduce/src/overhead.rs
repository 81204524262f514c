//! Tracepoint overhead correction.
//!
//! A dedicated tracepoint measures the cost of starting a tracepoint and
//! stopping it immediately. That cost is treated as a constant bias for the
//! whole run and removed from every other measurement, once per tracepoint
//! that contributed to it.

use alloc::vec::Vec;

use crate::error::{ReduceError, Result};
use crate::sample::{Cycles, SignedCycles};
use crate::scratch;
use crate::stats::Summary;

/// Which statistic of the overhead measurement is taken as the overhead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Estimator {
    /// Mean overhead. Used for kernel tracepoints.
    #[default]
    Mean,
    /// Minimum overhead. Used for user-level measurements.
    Min,
}

/// Estimated measurement overhead, in cycles.
///
/// Only obtainable from an already computed [`Summary`], so a correction can
/// never run before the overhead measurement itself has been reduced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverheadEstimate {
    cycles: f64,
    estimator: Estimator,
}

impl OverheadEstimate {
    /// Take the overhead from the summary of the overhead measurement.
    pub fn from_summary(summary: &Summary<Cycles>, estimator: Estimator) -> Self {
        let cycles = match estimator {
            Estimator::Mean => summary.mean,
            Estimator::Min => summary.min as f64,
        };
        Self { cycles, estimator }
    }

    /// Estimated overhead of a single tracepoint, in cycles.
    pub fn cycles(&self) -> f64 {
        self.cycles
    }

    /// Statistic the estimate was taken from.
    pub fn estimator(&self) -> Estimator {
        self.estimator
    }
}

/// Subtract `scale` times the estimated overhead from every raw value.
///
/// `scale` is the number of tracepoints whose overhead is included in one
/// raw value (2 for a path bracketed by an entry and an exit tracepoint).
/// The scaled overhead is rounded to the nearest whole cycle once; raw
/// values are widened to signed before subtracting, so a sample smaller than
/// the overhead yields a negative result rather than wrapping.
pub fn correct(
    raw: &[Cycles],
    estimate: &OverheadEstimate,
    scale: u32,
) -> Result<Vec<SignedCycles>> {
    if scale == 0 {
        return Err(ReduceError::InvalidScale);
    }
    let overflow = || ReduceError::Overflow {
        stage: "overhead correction",
    };

    let scaled = (estimate.cycles * f64::from(scale) + 0.5) as u64;
    let overhead = SignedCycles::try_from(scaled).map_err(|_| overflow())?;

    let mut corrected = scratch(raw.len())?;
    for &value in raw {
        let value = SignedCycles::try_from(value).map_err(|_| overflow())?;
        corrected.push(value.checked_sub(overhead).ok_or_else(overflow)?);
    }

    tracing::debug!(
        values = corrected.len(),
        overhead = estimate.cycles,
        scale,
        "applied overhead correction"
    );
    Ok(corrected)
}
