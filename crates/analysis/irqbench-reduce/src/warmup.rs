//! Warm-up discount.
//!
//! The first trials of every measurement run with cold caches and untrained
//! branch predictors. They are dropped before any statistics are taken.

use crate::error::{DataSource, ReduceError, Result};
use crate::group::TagRange;

/// Drop the first `ignore` samples of `range`.
///
/// Fails with [`ReduceError::InsufficientData`] unless at least one sample
/// remains: a tracepoint that fired no more often than the warm-up count
/// means the log was not captured with the expected tracepoints.
pub fn usable(range: TagRange, ignore: usize) -> Result<TagRange> {
    match range.count.checked_sub(ignore) {
        Some(count) if count > 0 => {
            tracing::trace!(
                tag = range.tag.0,
                recorded = range.count,
                usable = count,
                "warm-up discounted"
            );
            Ok(TagRange {
                tag: range.tag,
                offset: range.offset + ignore,
                count,
            })
        }
        _ => Err(ReduceError::InsufficientData {
            source: DataSource::Tracepoint(range.tag),
            recorded: range.count,
            ignored: ignore,
        }),
    }
}

/// Drop the first `ignore` runs of a plain per-run array.
///
/// `label` names the measurement in the error if nothing remains.
pub fn discard_leading<'a, T>(
    values: &'a [T],
    ignore: usize,
    label: &'static str,
) -> Result<&'a [T]> {
    match values.get(ignore..) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(ReduceError::InsufficientData {
            source: DataSource::Runs(label),
            recorded: values.len(),
            ignored: ignore,
        }),
    }
}
