//! Path reconstruction from per-phase measurements.
//!
//! A path measured by several tracepoints (e.g. entry-to-handler and
//! handler-to-exit) is rebuilt per trial by summing the phases trial by
//! trial. Pairing is strictly positional: the i-th retained sample of every
//! phase belongs to the same trial.

use alloc::vec::Vec;

use crate::error::{ReduceError, Result};
use crate::scratch;
use crate::stats::CycleValue;

/// Element-wise sum of two phase sequences of equal length.
pub fn combine<T: CycleValue>(phase_a: &[T], phase_b: &[T]) -> Result<Vec<T>> {
    combine_all(&[phase_a, phase_b])
}

/// Element-wise sum of any number of phase sequences of equal length.
///
/// A length difference means a tracepoint fired a different number of times
/// than the others and is reported as [`ReduceError::LengthMismatch`] with
/// the length of the first phase and of the offending one. No partial sum is
/// returned.
pub fn combine_all<T: CycleValue>(phases: &[&[T]]) -> Result<Vec<T>> {
    let (first, rest) = phases.split_first().ok_or(ReduceError::NoSamples)?;

    if let Some(other) = rest.iter().find(|phase| phase.len() != first.len()) {
        return Err(ReduceError::LengthMismatch {
            left: first.len(),
            right: other.len(),
        });
    }

    let mut total = scratch(first.len())?;
    total.extend_from_slice(first);
    for phase in rest {
        for (acc, &value) in total.iter_mut().zip(phase.iter()) {
            *acc = acc.checked_add(value).ok_or(ReduceError::Overflow {
                stage: "path combination",
            })?;
        }
    }

    tracing::debug!(phases = phases.len(), trials = total.len(), "combined path phases");
    Ok(total)
}
