//! Loggers and logger decorators
//!
//! A [`Logger`] consumes one event: a context, a message and its args. It
//! never returns an error; failures are either dropped or delivered to an
//! error channel supplied when the logger was built (see [`with_stream`]).

use super::context::{Context, ContextDecorator};
use super::encoding::Marshaler;
use super::error::LoggerError;
use super::format;
use super::stream::SharedStream;
use super::value::Value;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub trait Logger: Send + Sync {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]);
}

impl<F> Logger for F
where
    F: Fn(&Context, &str, &[Value]) + Send + Sync,
{
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        self(ctx, message, args)
    }
}

/// Wraps a logger, typically adding behaviour around it.
pub trait LoggerDecorator: Send + Sync {
    fn decorate(&self, inner: Arc<dyn Logger>) -> Arc<dyn Logger>;
}

impl<F> LoggerDecorator for F
where
    F: Fn(Arc<dyn Logger>) -> Arc<dyn Logger> + Send + Sync,
{
    fn decorate(&self, inner: Arc<dyn Logger>) -> Arc<dyn Logger> {
        self(inner)
    }
}

/// Decorator that returns the logger unmodified.
#[must_use]
pub fn no_decorator() -> Arc<dyn LoggerDecorator> {
    Arc::new(|inner: Arc<dyn Logger>| inner)
}

struct NullLogger;

impl Logger for NullLogger {
    fn logf(&self, _ctx: &Context, _message: &str, _args: &[Value]) {}
}

/// Discards every event.
#[must_use]
pub fn null() -> Arc<dyn Logger> {
    Arc::new(NullLogger)
}

struct MultiLogger {
    loggers: Vec<Arc<dyn Logger>>,
}

impl Logger for MultiLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        for (idx, logs) in self.loggers.iter().enumerate() {
            // isolate each member so one failure cannot starve the rest
            let outcome = catch_unwind(AssertUnwindSafe(|| logs.logf(ctx, message, args)));
            if let Err(panic_info) = outcome {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[LOGGER CRITICAL] Logger #{} panicked: {}. \
                     Other loggers continue to function.",
                    idx, panic_msg
                );
            }
        }
    }
}

/// Fans every event out to `loggers`, synchronously and in order.
///
/// Delivery is best effort: a member that panics is reported on stderr and
/// the remaining members still receive the event.
#[must_use]
pub fn multi(loggers: Vec<Arc<dyn Logger>>) -> Arc<dyn Logger> {
    Arc::new(MultiLogger { loggers })
}

/// Error sink that drops every error; reads better at call sites than `None`.
#[must_use]
pub fn ignore_errors() -> Option<Sender<LoggerError>> {
    None
}

struct StreamLogger {
    stream: SharedStream,
    marshaler: Arc<dyn Marshaler>,
    errors: Option<Sender<LoggerError>>,
}

impl Logger for StreamLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        let result = {
            let mut stream = self.stream.lock();
            self.marshaler.marshal(ctx, &mut *stream, message, args)
        };
        let (Err(err), Some(errors)) = (result, self.errors.as_ref()) else {
            return;
        };
        let done = ctx.done();
        crossbeam_channel::select! {
            send(errors, err) -> _ => {}
            recv(done) -> _ => {}
        }
    }
}

/// Adapts a stream and marshaler into a logger.
///
/// The marshaler runs while holding the stream lock. If it fails and
/// `errors` is set, the error is sent there unless the event context is
/// done first, so a cancelled caller is never blocked on error delivery.
#[must_use]
pub fn with_stream(
    stream: SharedStream,
    marshaler: Arc<dyn Marshaler>,
    errors: Option<Sender<LoggerError>>,
) -> Arc<dyn Logger> {
    Arc::new(StreamLogger {
        stream,
        marshaler,
        errors,
    })
}

struct ContextLogger {
    decorator: Arc<dyn ContextDecorator>,
    inner: Arc<dyn Logger>,
}

impl Logger for ContextLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        self.inner.logf(&self.decorator.decorate(ctx), message, args)
    }
}

/// Decorator that rewrites every event's context before delegating.
#[must_use]
pub fn with_context(decorator: Arc<dyn ContextDecorator>) -> Arc<dyn LoggerDecorator> {
    Arc::new(move |inner: Arc<dyn Logger>| -> Arc<dyn Logger> {
        Arc::new(ContextLogger {
            decorator: Arc::clone(&decorator),
            inner,
        })
    })
}

struct LockedLogger {
    guard: Arc<Mutex<()>>,
    inner: Arc<dyn Logger>,
}

impl Logger for LockedLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        let _lock = self.guard.lock();
        self.inner.logf(ctx, message, args)
    }
}

/// Decorator that serializes events through `guard`. The lock is held for
/// exactly one `logf` call. Loggers sharing a guard are ordered relative to
/// each other.
#[must_use]
pub fn locked(guard: Arc<Mutex<()>>) -> Arc<dyn LoggerDecorator> {
    Arc::new(move |inner: Arc<dyn Logger>| -> Arc<dyn Logger> {
        Arc::new(LockedLogger {
            guard: Arc::clone(&guard),
            inner,
        })
    })
}

struct SystemLogger;

impl Logger for SystemLogger {
    fn logf(&self, _ctx: &Context, message: &str, args: &[Value]) {
        let line = format::render(message, args);
        if let Err(e) = crate::streams::system::output(line.as_bytes()) {
            eprintln!("[LOGGER ERROR] System logger failed: {}", e);
        }
    }
}

/// Formats events and forwards them to the process-wide system sink.
#[must_use]
pub fn system_logger() -> Arc<dyn Logger> {
    Arc::new(SystemLogger)
}
