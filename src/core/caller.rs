//! Call-site capture
//!
//! Public logging entry points are `#[track_caller]`, so the compiler hands
//! them the location of the user's call. When tracking is enabled that
//! location is stamped into the event context as a [`CallSite`] and the
//! tracking decorator turns it into a [`Caller`] for the layers below.
//! When tracking is disabled neither step happens.

use super::context::{Context, ContextKey};
use super::logger::{Logger, LoggerDecorator};
use super::value::Value;
use serde::Serialize;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Function name reported when the call site carries none.
pub const UNKNOWN_FUNCTION: &str = "???";

/// File, line and function that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
    /// Enclosing function path when logged through the macros, else
    /// [`UNKNOWN_FUNCTION`].
    pub func_name: &'static str,
}

impl Caller {
    /// File name without its directories.
    #[must_use]
    pub fn short_file(&self) -> &'static str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// Unresolved location of a logging call.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    location: &'static Location<'static>,
    function: Option<&'static str>,
}

impl CallSite {
    /// The location of whoever called the enclosing `#[track_caller]` fn.
    #[track_caller]
    #[must_use]
    pub fn here() -> Self {
        Self {
            location: Location::caller(),
            function: None,
        }
    }

    /// Attaches the enclosing function, given the type name of a marker
    /// item `f` declared inside it (see [`marker_function`]).
    #[must_use]
    pub fn with_function(mut self, marker: &'static str) -> Self {
        self.function = Some(marker_function(marker));
        self
    }

    #[must_use]
    pub fn resolve(&self) -> Caller {
        Caller {
            file: self.location.file(),
            line: self.location.line(),
            func_name: self.function.unwrap_or(UNKNOWN_FUNCTION),
        }
    }
}

/// Strips the marker item from `path::to::function::f`, leaving the path
/// of the function the marker was declared in.
#[must_use]
pub fn marker_function(marker: &'static str) -> &'static str {
    marker.strip_suffix("::f").unwrap_or(marker)
}

struct CallSiteKey;

impl ContextKey for CallSiteKey {
    type Value = CallSite;
}

struct CallerKey;

impl ContextKey for CallerKey {
    type Value = Caller;
}

/// Records where the current event was logged from.
#[must_use]
pub fn stamp(ctx: &Context, site: CallSite) -> Context {
    ctx.with_value::<CallSiteKey>(site)
}

#[must_use]
pub fn call_site(ctx: &Context) -> Option<CallSite> {
    ctx.value::<CallSiteKey>()
}

#[must_use]
pub fn new_context(ctx: &Context, caller: Caller) -> Context {
    ctx.with_value::<CallerKey>(caller)
}

#[must_use]
pub fn from_context(ctx: &Context) -> Option<Caller> {
    ctx.value::<CallerKey>()
}

/// Caller tracking settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallerTracking {
    pub enabled: bool,
}

impl CallerTracking {
    pub const ENABLED: CallerTracking = CallerTracking { enabled: true };
    pub const DISABLED: CallerTracking = CallerTracking { enabled: false };

    /// Logger decorator that resolves the stamped call site into a
    /// [`Caller`]. Identity when tracking is disabled.
    #[must_use]
    pub fn decorator(self) -> Arc<dyn LoggerDecorator> {
        if !self.enabled {
            return super::logger::no_decorator();
        }
        Arc::new(|inner: Arc<dyn Logger>| -> Arc<dyn Logger> {
            Arc::new(TrackingLogger { inner })
        })
    }
}

struct TrackingLogger {
    inner: Arc<dyn Logger>,
}

impl Logger for TrackingLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        match call_site(ctx) {
            Some(site) => self
                .inner
                .logf(&new_context(ctx, site.resolve()), message, args),
            None => self.inner.logf(ctx, message, args),
        }
    }
}
