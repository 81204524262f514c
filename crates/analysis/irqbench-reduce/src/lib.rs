//! Log reduction for IRQ path latency benchmarks.
//!
//! Turns an interleaved log of tracepoint samples into per-phase statistics
//! corrected for the cost of the tracepoints themselves. The pipeline is a
//! single batch pass over an owned log:
//!
//! ```text
//! samples -> group -> usable (warm-up discount) -> reduce overhead
//!         -> combine path phases -> correct -> reduce path
//! ```
//!
//! Every stage is a plain function over owned or borrowed slices; scratch
//! buffers are allocated with `try_reserve` so that allocation failure is
//! reported as [`ReduceError::AllocationFailure`] instead of aborting.
//!
//! # Usage
//!
//! ```
//! use irqbench_reduce::{ReduceConfig, Sample, TagId, TracepointLayout, reduce_kernel_log};
//!
//! let log = vec![
//!     Sample::new(TagId(0), 12),
//!     Sample::new(TagId(1), 400),
//!     Sample::new(TagId(2), 300),
//! ];
//! let config = ReduceConfig { ignored: 0, ..ReduceConfig::default() };
//! let report = reduce_kernel_log(log, &TracepointLayout::default(), &config).unwrap();
//! assert_eq!(report.path.min, 700 - 24);
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

use alloc::vec::Vec;

pub mod error;
pub mod group;
pub mod overhead;
pub mod path;
pub mod pipeline;
pub mod sample;
pub mod stats;
pub mod warmup;

pub use error::{DataSource, ReduceError, Result};
pub use group::{GroupedLog, TagRange, group};
pub use overhead::{Estimator, OverheadEstimate, correct};
pub use path::{combine, combine_all};
pub use pipeline::{
    KernelIrqReport, ReduceConfig, TracepointLayout, UserIrqReport, UserRuns, reduce_kernel_log,
    reduce_user_runs,
};
pub use sample::{Cycles, MAX_TAGS, Sample, SignedCycles, TagId};
pub use stats::{CycleValue, Summary, reduce};
pub use warmup::{discard_leading, usable};

/// Allocate an empty buffer with room for exactly `len` elements.
pub(crate) fn scratch<T>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ReduceError::AllocationFailure { requested: len })?;
    Ok(buf)
}
