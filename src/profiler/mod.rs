//! Profiler module for timing calls through wrapped capabilities
//!
//! This module provides:
//! - `ProfilingState`: cumulative elapsed time per (type, method)
//! - `ProfilingInterceptor`: routes calls to a delegate and times profiled methods
//! - `Profiler`: wraps delegates into stand-ins and writes the timing report
//! - Stand-ins for the crate's `WebCrawler` and `PageParser` capabilities
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sumi_census::clock::SystemClock;
//! use sumi_census::profiler::{ProfiledWebCrawler, Profiler};
//! use sumi_census::{Coordinator, WebCrawler};
//!
//! # async fn example(coordinator: Coordinator) -> Result<(), Box<dyn std::error::Error>> {
//! let profiler = Profiler::new(Arc::new(SystemClock));
//! let crawler: ProfiledWebCrawler<_> = profiler.wrap(coordinator)?;
//!
//! crawler.crawl(&["https://example.com/".to_string()]).await?;
//! profiler.write_report(&mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

mod interceptor;
mod stand_ins;
mod state;

pub use interceptor::{InterceptionError, Instrumented, MethodSpec, ProfilingInterceptor};
pub use stand_ins::{ProfiledPageParser, ProfiledWebCrawler, ProfilingPageParserFactory};
pub use state::{format_duration, MethodKey, MethodTiming, ProfilingState};

use crate::clock::Clock;
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Fixed wire format of the report header timestamp (RFC 1123)
const RUN_AT_FORMAT: &str = "%a, %-d %b %Y %H:%M:%S GMT";

/// Wraps delegates for profiling and reports what was recorded
///
/// Clones share the same state, so parsers wrapped on worker tasks land in the
/// same report as the crawler wrapped by the driver.
#[derive(Clone)]
pub struct Profiler {
    clock: Arc<dyn Clock>,
    state: Arc<ProfilingState>,
    started_at: DateTime<Utc>,
}

impl Profiler {
    /// Creates a profiler; its report header carries the creation time
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self {
            clock,
            state: Arc::new(ProfilingState::new()),
            started_at,
        }
    }

    /// Wraps `delegate` in the stand-in `S`
    ///
    /// # Returns
    ///
    /// * `Ok(S)` - The stand-in; calls through it are timed per its method table
    /// * `Err(ConfigError::NoProfiledMethods)` - `S` declares no profiled method;
    ///   no stand-in is built and `delegate` is dropped
    pub fn wrap<S, D>(&self, delegate: D) -> ConfigResult<S>
    where
        S: Instrumented<D>,
    {
        Self::ensure_profiled::<S, D>()?;
        Ok(self.instrument(delegate))
    }

    /// Checks that stand-in `S` has at least one profiled method
    pub fn ensure_profiled<S, D>() -> ConfigResult<()>
    where
        S: Instrumented<D>,
    {
        if S::METHODS.iter().any(|spec| spec.profiled) {
            Ok(())
        } else {
            Err(ConfigError::NoProfiledMethods {
                capability: S::CAPABILITY,
            })
        }
    }

    /// Builds the stand-in without the precondition check
    pub(crate) fn instrument<S, D>(&self, delegate: D) -> S
    where
        S: Instrumented<D>,
    {
        S::from_interceptor(ProfilingInterceptor::new::<S>(
            delegate,
            Arc::clone(&self.clock),
            Arc::clone(&self.state),
        ))
    }

    /// Timings recorded so far
    pub fn state(&self) -> &ProfilingState {
        &self.state
    }

    /// Writes the report: header, one line per timed method, blank line
    pub fn write_report<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "Run at {}", self.started_at.format(RUN_AT_FORMAT))?;
        self.state.write(writer)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Appends the report to the file at `path`, creating it if needed
    pub fn write_report_to_path(&self, path: &Path) -> crate::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.write_report(&mut writer)?;
        writer.flush()?;
        tracing::debug!("Profiling report appended to {}", path.display());
        Ok(())
    }
}
