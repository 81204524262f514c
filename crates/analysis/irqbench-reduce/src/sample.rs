//! Tagged timestamp samples.

use core::fmt;

/// Raw cycle count read from the cycle counter.
pub type Cycles = u64;

/// Cycle count after overhead correction. May be negative when the overhead
/// estimate exceeds a noisy raw sample.
pub type SignedCycles = i64;

/// Identifier of the tracepoint that produced a sample.
///
/// Tracepoint ids are small and dense: a log with `n` tracepoints uses the
/// ids `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagId(pub u16);

/// Largest tag space a log can have: every `u16` value names a tracepoint.
pub const MAX_TAGS: usize = u16::MAX as usize + 1;

impl TagId {
    /// Returns the id as an index into per-tag tables.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tracepoint {}", self.0)
    }
}

/// One tracepoint firing: which tracepoint, and how many cycles it recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Tracepoint that produced the sample.
    pub tag: TagId,
    /// Recorded cycle count.
    pub value: Cycles,
}

impl Sample {
    /// Create a sample.
    pub const fn new(tag: TagId, value: Cycles) -> Self {
        Self { tag, value }
    }
}
