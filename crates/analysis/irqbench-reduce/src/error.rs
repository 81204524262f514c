//! Errors raised by the reduction pipeline.
//!
//! None of these are recoverable by retrying the reduction: they mean the
//! captured log is missing tracepoints or the measured path misbehaved, and
//! the capture has to be redone.

use core::fmt;

use crate::sample::{MAX_TAGS, TagId};

/// Origin of a sample sequence, used to name it in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Samples of one tracepoint in a tagged kernel log.
    Tracepoint(TagId),
    /// A named per-run array, e.g. the user-level measurements.
    Runs(&'static str),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tracepoint(tag) => write!(f, "{tag}"),
            Self::Runs(label) => write!(f, "{label}"),
        }
    }
}

/// Errors that can occur while reducing a benchmark log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// A sample carries a tracepoint id outside the configured tag space.
    TagOutOfRange {
        /// Offending tracepoint id.
        tag: TagId,
        /// Number of tracepoints the log was configured with.
        num_tags: usize,
    },
    /// More tracepoints were configured than `u16` tracepoint ids can name.
    TooManyTags {
        /// Number of tracepoints requested.
        num_tags: usize,
    },
    /// Not enough samples remain once the warm-up samples are dropped.
    InsufficientData {
        /// Where the samples came from.
        source: DataSource,
        /// Number of samples recorded.
        recorded: usize,
        /// Number of leading samples that were to be ignored.
        ignored: usize,
    },
    /// Two phase sequences that are paired by trial have different lengths.
    LengthMismatch {
        /// Length of the first sequence.
        left: usize,
        /// Length of the second sequence.
        right: usize,
    },
    /// A reduction was asked to summarise an empty sequence.
    NoSamples,
    /// A scratch buffer could not be allocated.
    AllocationFailure {
        /// Number of elements requested.
        requested: usize,
    },
    /// A cycle count does not fit the arithmetic of the current stage.
    Overflow {
        /// Name of the stage that overflowed.
        stage: &'static str,
    },
    /// The overhead scale factor was zero.
    InvalidScale,
}

impl fmt::Display for ReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagOutOfRange { tag, num_tags } => {
                write!(f, "{tag} is outside the configured {num_tags} tracepoints")
            }
            Self::TooManyTags { num_tags } => write!(
                f,
                "{num_tags} tracepoints configured, at most {MAX_TAGS} can be named"
            ),
            Self::InsufficientData {
                source: source @ DataSource::Tracepoint(_),
                recorded,
                ignored,
            } => write!(
                f,
                "insufficient data for {source}: {recorded} samples recorded, {ignored} \
                 ignored; was the kernel built with the relevant tracepoints?"
            ),
            Self::InsufficientData {
                source,
                recorded,
                ignored,
            } => write!(
                f,
                "insufficient data for {source}: {recorded} runs recorded, {ignored} ignored"
            ),
            Self::LengthMismatch { left, right } => write!(
                f,
                "paired phase sequences differ in length ({left} vs {right})"
            ),
            Self::NoSamples => write!(f, "cannot summarise an empty sample sequence"),
            Self::AllocationFailure { requested } => {
                write!(f, "failed to allocate scratch buffer for {requested} samples")
            }
            Self::Overflow { stage } => write!(f, "cycle count overflow during {stage}"),
            Self::InvalidScale => write!(f, "overhead scale factor must be non-zero"),
        }
    }
}

impl core::error::Error for ReduceError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ReduceError>;
