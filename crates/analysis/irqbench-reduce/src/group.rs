//! Stable grouping of a sample log by tracepoint.
//!
//! Samples of one tracepoint appear in the log in the order their trials
//! ran. Grouping has to keep that order, because the warm-up discount drops
//! the *earliest* trials and path reconstruction pairs trials by position.
//! The grouping is a counting sort: one pass to size each tracepoint's
//! block, one pass to scatter samples into their block in input order.

use alloc::vec::Vec;

use crate::error::{ReduceError, Result};
use crate::sample::{Cycles, MAX_TAGS, Sample, TagId};
use crate::scratch;

/// The contiguous block of a grouped log that belongs to one tracepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRange {
    /// Tracepoint the block belongs to.
    pub tag: TagId,
    /// Index of the first sample of the block.
    pub offset: usize,
    /// Number of samples in the block.
    pub count: usize,
}

impl TagRange {
    /// One past the index of the last sample of the block.
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.count
    }

    /// Returns `true` if the tracepoint never fired.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A sample log sorted by tracepoint, with the block of each tracepoint.
#[derive(Debug, Clone)]
pub struct GroupedLog {
    samples: Vec<Sample>,
    ranges: Vec<TagRange>,
}

impl GroupedLog {
    /// The sorted samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// One range per tracepoint, in tracepoint order.
    pub fn ranges(&self) -> &[TagRange] {
        &self.ranges
    }

    /// The range of a single tracepoint.
    pub fn range(&self, tag: TagId) -> Result<TagRange> {
        self.ranges
            .get(tag.index())
            .copied()
            .ok_or(ReduceError::TagOutOfRange {
                tag,
                num_tags: self.ranges.len(),
            })
    }

    /// The samples covered by `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` does not lie within this log. Ranges obtained from
    /// [`GroupedLog::range`] and narrowed by [`crate::usable`] always do.
    pub fn samples_in(&self, range: TagRange) -> &[Sample] {
        &self.samples[range.offset..range.end()]
    }

    /// Copy the cycle counts covered by `range` into a new buffer.
    pub fn cycles_in(&self, range: TagRange) -> Result<Vec<Cycles>> {
        let mut cycles = scratch(range.count)?;
        cycles.extend(self.samples_in(range).iter().map(|s| s.value));
        Ok(cycles)
    }
}

/// Sort `samples` by tracepoint, keeping the input order within each
/// tracepoint, and index the block of every tracepoint in `0..num_tags`.
///
/// Tracepoints that never fired get an empty range. A `num_tags` above
/// [`MAX_TAGS`] is rejected with [`ReduceError::TooManyTags`], and a sample
/// whose tracepoint is `>= num_tags` with [`ReduceError::TagOutOfRange`].
pub fn group(samples: Vec<Sample>, num_tags: usize) -> Result<GroupedLog> {
    if num_tags > MAX_TAGS {
        return Err(ReduceError::TooManyTags { num_tags });
    }

    let mut cursors: Vec<usize> = scratch(num_tags)?;
    cursors.resize(num_tags, 0);

    for sample in &samples {
        let slot = cursors
            .get_mut(sample.tag.index())
            .ok_or(ReduceError::TagOutOfRange {
                tag: sample.tag,
                num_tags,
            })?;
        *slot += 1;
    }

    let mut ranges = scratch(num_tags)?;
    let mut offset = 0;
    for (cursor, id) in cursors.iter_mut().zip(0..=u16::MAX) {
        let count = *cursor;
        ranges.push(TagRange {
            tag: TagId(id),
            offset,
            count,
        });
        *cursor = offset;
        offset += count;
    }

    let mut sorted = scratch(samples.len())?;
    sorted.resize(samples.len(), Sample::new(TagId(0), 0));
    for sample in samples {
        let cursor = &mut cursors[sample.tag.index()];
        sorted[*cursor] = sample;
        *cursor += 1;
    }

    tracing::debug!(samples = sorted.len(), num_tags, "grouped sample log");

    Ok(GroupedLog {
        samples: sorted,
        ranges,
    })
}
