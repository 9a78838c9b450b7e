//! Cumulative per-method timings
//!
//! Keys are (concrete delegate type, method name). Every completed profiled
//! call adds its elapsed time to its key, whether the call succeeded or not.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// Identifies a profiled method on a concrete type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodKey {
    /// Fully qualified name of the delegate's concrete type
    pub type_name: &'static str,

    /// Method name as registered in the capability's method table
    pub method: &'static str,
}

/// Accumulated timing for one method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodTiming {
    /// Sum of elapsed time over all calls
    pub total: Duration,

    /// Number of completed calls
    pub calls: u64,
}

/// Thread-safe accumulator of method timings
#[derive(Debug, Default)]
pub struct ProfilingState {
    timings: DashMap<MethodKey, MethodTiming>,
}

impl ProfilingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one call's elapsed time to the running total for its key
    pub fn record(&self, type_name: &'static str, method: &'static str, elapsed: Duration) {
        let mut timing = self
            .timings
            .entry(MethodKey { type_name, method })
            .or_default();
        timing.total += elapsed;
        timing.calls += 1;
    }

    /// Timing recorded so far for a key, if any call completed
    pub fn get(&self, type_name: &'static str, method: &'static str) -> Option<MethodTiming> {
        self.timings
            .get(&MethodKey { type_name, method })
            .map(|timing| *timing)
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Copy of all timings, ordered by type then method
    pub fn snapshot(&self) -> BTreeMap<MethodKey, MethodTiming> {
        self.timings
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Writes one line per key, in key order
    ///
    /// Line format: `<type>#<method> took <m>m <s>s <ms>ms (<n> calls)`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (key, timing) in self.snapshot() {
            writeln!(
                writer,
                "{}#{} took {} ({} {})",
                key.type_name,
                key.method,
                format_duration(timing.total),
                timing.calls,
                if timing.calls == 1 { "call" } else { "calls" }
            )?;
        }
        Ok(())
    }
}

/// Formats a duration as `<m>m <s>s <ms>ms`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{}m {}s {}ms",
        secs / 60,
        secs % 60,
        duration.subsec_millis()
    )
}
