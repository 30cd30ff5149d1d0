//! Tracing setup and helpers for geometry extraction
//!
//! Library code only emits events; a binary calls [`install`] once to get
//! them on stderr. `RUST_LOG` always wins over the configured filter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use tracing::Span;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// How log output is filtered and decorated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    /// Print the event target (module path)
    pub targets: bool,
    /// Print file and line of the event
    pub source_locations: bool,
    /// Print the emitting thread id
    pub thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn,wrlglb=info".to_string(),
            targets: true,
            source_locations: false,
            thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Config for a CLI `-v` count: none = warn, then info, debug, trace
    pub fn for_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        Self {
            filter: level.to_string(),
            targets: verbosity >= 2,
            source_locations: verbosity >= 3,
            thread_ids: verbosity >= 3,
        }
    }
}

/// Install a stderr subscriber. Returns `false` if this process already
/// installed one, in which case `config` is ignored.
pub fn install(config: &LogConfig) -> bool {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.targets)
        .with_file(config.source_locations)
        .with_line_number(config.source_locations)
        .with_thread_ids(config.thread_ids);

    // A test harness may have set a global subscriber first
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
    true
}

/// [`install`] with [`LogConfig::default`]
pub fn install_default() -> bool {
    install(&LogConfig::default())
}

/// Extraction of one input is starting
#[macro_export]
macro_rules! log_extract_start {
    ($parser:expr, $path:expr) => {
        tracing::debug!(parser = %$parser, path = %$path.display(), "Extracting geometry");
    };
}

/// Extraction finished with a mesh
#[macro_export]
macro_rules! log_extract_done {
    ($parser:expr, $elapsed:expr, $vertices:expr, $triangles:expr) => {
        tracing::debug!(
            parser = %$parser,
            elapsed_ms = $elapsed.as_millis() as u64,
            vertices = $vertices,
            triangles = $triangles,
            "Geometry extracted"
        );
    };
}

/// Extraction failed for a reason other than missing geometry
#[macro_export]
macro_rules! log_extract_failed {
    ($parser:expr, $error:expr) => {
        tracing::error!(parser = %$parser, error = %$error, "Extraction failed");
    };
}

/// Run `f` inside an `extract` span and log how long it took
pub fn timed_extract<T>(parser: &str, f: impl FnOnce() -> T) -> T {
    let span = tracing::debug_span!("extract", parser);
    let _entered = span.enter();

    let started = Instant::now();
    let out = f();
    tracing::trace!(elapsed_us = started.elapsed().as_micros() as u64, "Extract finished");
    out
}

/// Shared progress counter for a batch of files; safe to advance from
/// worker threads.
#[derive(Debug)]
pub struct BatchProgress {
    total: usize,
    done: AtomicUsize,
    span: Span,
}

impl BatchProgress {
    /// Report every this many files
    const STEP: usize = 100;

    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            span: tracing::info_span!("batch", total),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Count one finished file and return the new count. Logs at every
    /// step and on the last file.
    pub fn advance(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % Self::STEP == 0 || done == self.total {
            let percent = (done * 100).checked_div(self.total).unwrap_or(100);
            tracing::info!(parent: &self.span, done, total = self.total, percent, "Batch progress");
        }
        done
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}
