//! Method-call interception
//!
//! A capability is described by a fixed method table ([`MethodSpec`]s). A
//! stand-in type implements the capability trait by routing every call through
//! a [`ProfilingInterceptor`], which times the methods marked as profiled and
//! forwards everything else untouched.

use crate::clock::{elapsed_between, Clock};
use crate::profiler::ProfilingState;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// A call routed through a method missing from the capability's method table
///
/// Only the interceptor builds these, so a delegate can never pass one off as
/// its own failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Interception failed for {capability}::{method}: method is not registered")]
pub struct InterceptionError {
    capability: &'static str,
    method: &'static str,
}

impl InterceptionError {
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    pub fn method(&self) -> &'static str {
        self.method
    }
}

/// One entry of a capability's method table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub profiled: bool,
}

impl MethodSpec {
    /// A method whose calls are timed
    pub const fn profiled(name: &'static str) -> Self {
        Self {
            name,
            profiled: true,
        }
    }

    /// A method forwarded without timing
    pub const fn passthrough(name: &'static str) -> Self {
        Self {
            name,
            profiled: false,
        }
    }
}

/// A stand-in that exposes capability `Self` over a delegate of type `D`
///
/// Implementors declare the capability's method table and build themselves
/// around an interceptor; the [`Profiler`](crate::profiler::Profiler) does the rest.
pub trait Instrumented<D>: Sized {
    /// Capability name, used in error messages
    const CAPABILITY: &'static str;

    /// Every method of the capability, with its profiling attribute
    const METHODS: &'static [MethodSpec];

    /// Concrete type name recorded for `delegate`
    fn delegate_type(_delegate: &D) -> &'static str {
        std::any::type_name::<D>()
    }

    /// Builds the stand-in around a ready interceptor
    fn from_interceptor(interceptor: ProfilingInterceptor<D>) -> Self;
}

/// Routes calls to a delegate, timing the profiled ones
pub struct ProfilingInterceptor<D> {
    delegate: D,
    delegate_type: &'static str,
    capability: &'static str,
    methods: HashMap<&'static str, bool>,
    clock: Arc<dyn Clock>,
    state: Arc<ProfilingState>,
}

impl<D> ProfilingInterceptor<D> {
    pub(crate) fn new<S: Instrumented<D>>(
        delegate: D,
        clock: Arc<dyn Clock>,
        state: Arc<ProfilingState>,
    ) -> Self {
        let methods = S::METHODS
            .iter()
            .map(|spec| (spec.name, spec.profiled))
            .collect();

        Self {
            delegate_type: S::delegate_type(&delegate),
            delegate,
            capability: S::CAPABILITY,
            methods,
            clock,
            state,
        }
    }

    /// The wrapped delegate, for untimed forwarding
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Concrete type name timings are recorded under
    pub fn delegate_type(&self) -> &'static str {
        self.delegate_type
    }

    /// Whether `method` is profiled; `None` if it is not in the method table
    pub fn is_profiled(&self, method: &str) -> Option<bool> {
        self.methods.get(method).copied()
    }

    /// Calls `call` on the delegate as method `method`
    ///
    /// The delegate's own return value, failures included, comes back
    /// unchanged inside `Ok`. `Err` means the call never reached the delegate
    /// because `method` is not in the capability's method table.
    pub fn invoke<R>(
        &self,
        method: &'static str,
        call: impl FnOnce(&D) -> R,
    ) -> Result<R, InterceptionError> {
        let timer = self.start(method)?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(&self.delegate)));
        finish(timer, outcome)
    }

    /// Async counterpart of [`invoke`](Self::invoke)
    ///
    /// Timing spans until the delegate's future completes. A future dropped
    /// before completion records nothing.
    pub async fn invoke_async<'a, F, Fut, R>(
        &'a self,
        method: &'static str,
        call: F,
    ) -> Result<R, InterceptionError>
    where
        F: FnOnce(&'a D) -> Fut,
        Fut: Future<Output = R>,
    {
        let timer = self.start(method)?;
        let outcome = AssertUnwindSafe(call(&self.delegate)).catch_unwind().await;
        finish(timer, outcome)
    }

    fn start(&self, method: &'static str) -> Result<Option<CallTimer<'_>>, InterceptionError> {
        let profiled = self.is_profiled(method).ok_or(InterceptionError {
            capability: self.capability,
            method,
        })?;

        Ok(profiled.then(|| CallTimer {
            state: &self.state,
            clock: self.clock.as_ref(),
            type_name: self.delegate_type,
            method,
            started: self.clock.now(),
        }))
    }
}

/// Records a finished call, then hands back its value or resumes its panic
fn finish<R>(
    timer: Option<CallTimer<'_>>,
    outcome: std::thread::Result<R>,
) -> Result<R, InterceptionError> {
    if let Some(timer) = timer {
        timer.record();
    }
    match outcome {
        Ok(value) => Ok(value),
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Start of one timed call
///
/// Only [`CallTimer::record`] writes to the state; a timer dropped without it
/// (the caller abandoned the call) leaves no trace.
struct CallTimer<'a> {
    state: &'a ProfilingState,
    clock: &'a dyn Clock,
    type_name: &'static str,
    method: &'static str,
    started: DateTime<Utc>,
}

impl CallTimer<'_> {
    fn record(self) {
        let elapsed = elapsed_between(self.started, self.clock.now());
        self.state.record(self.type_name, self.method, elapsed);
    }
}
