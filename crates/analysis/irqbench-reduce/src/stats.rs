//! Summary statistics over cycle counts.
//!
//! Raw tracepoint data is unsigned; overhead-corrected data is signed. Both
//! go through the same reduction, generic over [`CycleValue`]. Sums are
//! accumulated in `i128`, which cannot overflow for any realistic log
//! length, and only converted to `f64` at the end.

use alloc::vec::Vec;

use crate::error::{ReduceError, Result};
use crate::sample::{Cycles, SignedCycles};
use crate::scratch;

/// An integer cycle count that can be summarised.
pub trait CycleValue: Copy + Ord + core::fmt::Debug {
    /// Widen to `i128` for overflow-free accumulation.
    fn widen(self) -> i128;

    /// Addition that reports overflow instead of wrapping.
    fn checked_add(self, other: Self) -> Option<Self>;
}

impl CycleValue for Cycles {
    #[inline]
    fn widen(self) -> i128 {
        i128::from(self)
    }

    #[inline]
    fn checked_add(self, other: Self) -> Option<Self> {
        u64::checked_add(self, other)
    }
}

impl CycleValue for SignedCycles {
    #[inline]
    fn widen(self) -> i128 {
        i128::from(self)
    }

    #[inline]
    fn checked_add(self, other: Self) -> Option<Self> {
        i64::checked_add(self, other)
    }
}

/// Statistics of one reduced measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary<T> {
    /// Number of values summarised.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Smallest value.
    pub min: T,
    /// Largest value.
    pub max: T,
    /// Median, interpolated for even counts.
    pub median: f64,
    /// 25th percentile.
    pub first_quartile: f64,
    /// 75th percentile.
    pub third_quartile: f64,
    /// Sample variance (`n - 1` denominator, zero for a single value).
    pub variance: f64,
    /// Standard deviation.
    pub stddev: f64,
    /// Standard deviation as a percentage of the mean's magnitude.
    pub stddev_pct: f64,
}

/// Summarise `values`.
///
/// The caller's slice is left untouched; order statistics are taken from a
/// sorted scratch copy. An empty slice is a caller bug (the warm-up discount
/// guarantees at least one value) and is reported as
/// [`ReduceError::NoSamples`].
pub fn reduce<T: CycleValue>(values: &[T]) -> Result<Summary<T>> {
    let n = values.len();
    if n == 0 {
        return Err(ReduceError::NoSamples);
    }

    let sum: i128 = values.iter().map(|v| v.widen()).sum();
    let mean = exact_mean(sum, n);

    // Linear scans for the extremes, the sorted copy is only for quantiles.
    let min = values.iter().copied().min().ok_or(ReduceError::NoSamples)?;
    let max = values.iter().copied().max().ok_or(ReduceError::NoSamples)?;

    let variance = if n > 1 {
        let squares: f64 = values
            .iter()
            .map(|v| {
                let diff = v.widen() as f64 - mean;
                diff * diff
            })
            .sum();
        squares / (n - 1) as f64
    } else {
        0.0
    };
    let stddev = libm::sqrt(variance);
    let magnitude = if mean < 0.0 { -mean } else { mean };
    let stddev_pct = if magnitude > 0.0 {
        stddev / magnitude * 100.0
    } else {
        0.0
    };

    let mut sorted: Vec<T> = scratch(n)?;
    sorted.extend_from_slice(values);
    sorted.sort_unstable();

    tracing::trace!(n, mean, "reduced sequence");

    Ok(Summary {
        n,
        mean,
        min,
        max,
        median: quantile(&sorted, 0.5),
        first_quartile: quantile(&sorted, 0.25),
        third_quartile: quantile(&sorted, 0.75),
        variance,
        stddev,
        stddev_pct,
    })
}

/// Mean of `n` values summing to `sum`, split into quotient and remainder
/// so the integer part is not rounded through `f64` before dividing.
fn exact_mean(sum: i128, n: usize) -> f64 {
    let n = n as i128;
    let quotient = sum / n;
    let remainder = sum % n;
    quotient as f64 + remainder as f64 / n as f64
}

/// Linearly interpolated quantile `q` (0..=1) of a non-empty sorted slice.
fn quantile<T: CycleValue>(sorted: &[T], q: f64) -> f64 {
    let max_index = sorted.len() - 1;
    let rank = q.clamp(0.0, 1.0) * max_index as f64;
    // `rank` is non-negative, so truncation is floor.
    let lower = (rank as usize).min(max_index);
    let fraction = rank - lower as f64;
    let lo = sorted[lower].widen() as f64;
    if fraction > 0.0 && lower < max_index {
        let hi = sorted[lower + 1].widen() as f64;
        lo + (hi - lo) * fraction
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn reduce_known_values() {
        let values = [100u64, 102, 98, 104, 96];
        let summary = reduce(&values).unwrap();
        assert_eq!(summary.n, 5);
        assert_close(summary.mean, 100.0);
        assert_eq!(summary.min, 96);
        assert_eq!(summary.max, 104);
        assert_close(summary.median, 100.0);
        assert_close(summary.first_quartile, 98.0);
        assert_close(summary.third_quartile, 102.0);
        assert_close(summary.variance, 10.0);
        assert_close(summary.stddev, 10f64.sqrt());
        // Caller's order untouched.
        assert_eq!(values, [100, 102, 98, 104, 96]);
    }

    #[test]
    fn reduce_single_value() {
        let summary = reduce(&[42u64]).unwrap();
        assert_eq!(summary.n, 1);
        assert_eq!(summary.min, 42);
        assert_eq!(summary.max, 42);
        assert_close(summary.mean, 42.0);
        assert_close(summary.median, 42.0);
        assert_close(summary.variance, 0.0);
        assert_close(summary.stddev_pct, 0.0);
    }

    #[test]
    fn reduce_even_count_interpolates_median() {
        let summary = reduce(&[10u64, 40, 20, 30]).unwrap();
        assert_close(summary.median, 25.0);
        assert_close(summary.first_quartile, 17.5);
        assert_close(summary.third_quartile, 32.5);
    }

    #[test]
    fn reduce_signed_values() {
        let summary = reduce(&[-4i64, 2, 8]).unwrap();
        assert_eq!(summary.min, -4);
        assert_eq!(summary.max, 8);
        assert_close(summary.mean, 2.0);
        assert_close(summary.stddev_pct, summary.stddev / 2.0 * 100.0);
    }

    #[test]
    fn reduce_zero_mean_has_zero_stddev_pct() {
        let summary = reduce(&[-5i64, 5]).unwrap();
        assert_close(summary.mean, 0.0);
        assert_close(summary.stddev_pct, 0.0);
    }

    #[test]
    fn reduce_large_values_do_not_overflow() {
        let summary = reduce(&[u64::MAX, u64::MAX, u64::MAX - 2]).unwrap();
        assert_eq!(summary.min, u64::MAX - 2);
        assert!(summary.mean > 1.8e19);
    }

    #[test]
    fn reduce_empty_is_error() {
        assert_eq!(reduce::<u64>(&[]), Err(ReduceError::NoSamples));
    }

    #[test]
    fn exact_mean_keeps_fraction() {
        assert_close(exact_mean(7, 2), 3.5);
        assert_close(exact_mean(-7, 2), -3.5);
    }
}
