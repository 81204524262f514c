//! Output verbosity and diagnostic logging.
//!
//! Stdout carries only the report (table or JSON). Progress lines, stage
//! timings and `tracing` events all go to stderr, so `--json` output stays
//! parseable at every verbosity level:
//! - **Quiet** (`-q`): errors only on stderr
//! - **Default** (no flag): progress lines and warnings
//! - **Verbose** (`-v`): stage timings and the debug events emitted by the
//!   reduction pipeline as well

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use tracing_subscriber::EnvFilter;

/// Output verbosity level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet = 0,
    Default = 1,
    Verbose = 2,
}

/// Global verbosity level, set once at startup.
static VERBOSITY: AtomicU8 = AtomicU8::new(1); // Default

/// Initialize the verbosity level and the diagnostic subscriber.
///
/// `RUST_LOG` takes precedence over the level derived from the flags.
pub fn init(quiet: bool, verbose: bool) {
    let level = if quiet {
        Verbosity::Quiet
    } else if verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Default
    };
    VERBOSITY.store(level as u8, Ordering::Relaxed);

    let directives = match level {
        Verbosity::Quiet => "error",
        Verbosity::Default => "warn",
        Verbosity::Verbose => "irqbench=debug,irqbench_reduce=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Returns the current verbosity level.
pub fn verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Default,
    }
}

/// Returns `true` if verbose mode is active.
pub fn is_verbose() -> bool {
    verbosity() == Verbosity::Verbose
}

/// Returns `true` if quiet mode is active.
pub fn is_quiet() -> bool {
    verbosity() == Verbosity::Quiet
}

/// Print a diagnostic line to stderr only when verbose mode is enabled.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// Print a progress line to stderr unless quiet mode is active.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Times a pipeline stage and reports it to stderr on drop in verbose mode.
///
/// ```ignore
/// let _t = Timer::start("reduction");
/// // prints "  reduction: 42µs" when `_t` goes out of scope
/// ```
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Begin timing a labeled operation.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if is_verbose() {
            let elapsed = self.start.elapsed();
            eprintln!("  {}: {:.1?}", self.label, elapsed);
        }
    }
}
