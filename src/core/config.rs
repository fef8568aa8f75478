//! Configuration, reversible options and the leveled interface
//!
//! This module provides:
//! - `Config`: a plain value describing where and how events are logged
//! - `ConfigOption`: a change to a `Config` that, once applied, hands back
//!   the option undoing it
//! - `Interface`: the six per-level loggers built from a `Config`
//! - `Action`: what a Fatal or Panic call asks its caller to do once the
//!   configured hook has returned
//!
//! # Example
//!
//! ```
//! use rust_log_facade::core::config::{Config, ConfigOption};
//! use rust_log_facade::core::{Context, Logger, Value};
//! use std::sync::{Arc, Mutex};
//!
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&lines);
//! let capture: Arc<dyn Logger> = Arc::new(move |_: &Context, m: &str, a: &[Value]| {
//!     sink.lock().unwrap().push(rust_log_facade::core::format::render(m, a));
//! });
//!
//! let (logs, _undo) = Config::default().with([ConfigOption::logger(capture)]);
//! logs.debugf("I can count 1 2 %d", &[Value::from(3)]);
//! logs.infof("and more 4 5 %d", &[Value::from(6)]);
//! assert_eq!(*lines.lock().unwrap(), vec!["and more 4 5 6"]);
//! ```

use super::caller::{self, CallSite, CallerTracking};
use super::context::{Context, ContextDecorator, ContextDecorators, Getter};
use super::encoding::{self, Marshaler, MarshalerDecorator, MarshalerDecorators};
use super::error::LoggerError;
use super::format;
use super::level::{self, Level, TransformOp, TransformOps};
use super::logger::{self, Logger};
use super::redact;
use super::stream::{self, SharedStream, Stream};
use super::value::Value;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Exit code handed to the exit hook by Fatal events, unless configured.
pub const DEFAULT_EXIT_CODE: i32 = 1;

/// Invoked with the exit code after a Fatal event has been logged.
pub type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

/// Invoked with the rendered message after a Panic event has been logged.
pub type PanicFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Exit hook that returns instead of exiting.
#[must_use]
pub fn no_exit() -> ExitFn {
    Arc::new(|_: i32| {})
}

/// Panic hook that returns instead of panicking.
#[must_use]
pub fn no_panic() -> PanicFn {
    Arc::new(|_: &str| {})
}

fn process_exit() -> ExitFn {
    Arc::new(|code: i32| std::process::exit(code))
}

fn language_panic() -> PanicFn {
    Arc::new(|message: &str| panic!("{}", message))
}

/// Event destination. When both are set the stream wins.
#[derive(Clone, Default)]
pub struct StreamOrLogger {
    pub stream: Option<SharedStream>,
    pub logger: Option<Arc<dyn Logger>>,
}

impl fmt::Debug for StreamOrLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOrLogger")
            .field("stream", &self.stream.is_some())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    /// Events below this level are discarded.
    pub level: Level,
    pub sink: StreamOrLogger,
    /// Defaults to `std::process::exit` when unset.
    pub exit: Option<ExitFn>,
    pub exit_code: i32,
    /// Defaults to a real panic when unset.
    pub panic: Option<PanicFn>,
    pub caller: CallerTracking,
    /// Stream sinks only; defaults to [`encoding::format`].
    pub marshaler: Option<Arc<dyn Marshaler>>,
    /// Stream sinks only; wrapped around the marshaler.
    pub decorators: MarshalerDecorators,
    pub transforms: TransformOps,
    pub context: ContextDecorators,
    /// Marshaling errors go here when set, otherwise they are dropped.
    pub errors: Option<Sender<LoggerError>>,
    /// Prefix stream output with the level code.
    pub annotate: bool,
    /// Replace sensitive arguments with their redacted form. When false,
    /// sensitive arguments are revealed to every logger.
    pub redact: bool,
    pub getter: Getter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::Info,
            sink: StreamOrLogger::default(),
            exit: None,
            exit_code: DEFAULT_EXIT_CODE,
            panic: None,
            caller: CallerTracking::default(),
            marshaler: None,
            decorators: MarshalerDecorators::new(),
            transforms: TransformOps::new(),
            context: ContextDecorators::new(),
            errors: None,
            annotate: true,
            redact: true,
            getter: super::context::background_getter(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("level", &self.level)
            .field("sink", &self.sink)
            .field("exit", &self.exit.is_some())
            .field("exit_code", &self.exit_code)
            .field("panic", &self.panic.is_some())
            .field("caller", &self.caller)
            .field("marshaler", &self.marshaler.is_some())
            .field("decorators", &self.decorators)
            .field("transforms", &self.transforms)
            .field("context", &self.context)
            .field("errors", &self.errors.is_some())
            .field("annotate", &self.annotate)
            .field("redact", &self.redact)
            .finish()
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `opts` in order and returns the option that reverts all of
    /// them.
    pub fn apply(&mut self, opts: impl IntoIterator<Item = ConfigOption>) -> ConfigOption {
        ConfigOption::Batch(opts.into_iter().collect()).apply(self)
    }

    /// Builds an interface from a copy of this config with `opts` applied.
    ///
    /// `self` is left untouched. The returned option reverts `opts`;
    /// applying it to the derived config yields this one again.
    #[must_use]
    pub fn with(&self, opts: impl IntoIterator<Item = ConfigOption>) -> (Interface, ConfigOption) {
        let mut cfg = self.clone();
        let undo = cfg.apply(opts);
        (cfg.build(), undo)
    }

    /// Wires the six per-level loggers.
    #[must_use]
    pub fn build(&self) -> Interface {
        let guard = Arc::new(Mutex::new(()));
        let seed = self.seed();
        let loggers = Level::ALL.map(|l| self.build_level(l, Arc::clone(&seed), &guard));
        Interface {
            loggers,
            getter: Arc::clone(&self.getter),
            track_caller: self.caller.enabled,
            exit_code: self.exit_code,
            redact: self.redact,
        }
    }

    fn seed(&self) -> Arc<dyn Logger> {
        if let Some(stream) = &self.sink.stream {
            let base = self
                .marshaler
                .clone()
                .unwrap_or_else(|| encoding::format(MarshalerDecorators::new()));
            let mut marshaler = self.decorators.decorate(base);
            if self.annotate {
                marshaler = level::annotator().decorate(marshaler);
            }
            return logger::with_stream(Arc::clone(stream), marshaler, self.errors.clone());
        }
        match &self.sink.logger {
            Some(logs) => Arc::clone(logs),
            None => logger::system_logger(),
        }
    }

    fn build_level(
        &self,
        at: Level,
        seed: Arc<dyn Logger>,
        guard: &Arc<Mutex<()>>,
    ) -> Arc<dyn Logger> {
        let mut logs = seed;
        if !self.context.is_empty() {
            let user = self.context.clone();
            logs = logger::with_context(Arc::new(move |c: &Context| user.decorate(c)))
                .decorate(logs);
        }
        logs = logger::with_context(Arc::new(move |c: &Context| level::new_context(c, at)))
            .decorate(logs);
        logs = logger::locked(Arc::clone(guard)).decorate(logs);
        logs = self.caller.decorator().decorate(logs);

        let (_, logs) = level::min_transform(self.level).apply(at, logs);
        let (_, logs) = self.transforms.apply(at, logs);

        // outermost, so transforms and broadcast copies never see raw args
        let logs = if self.redact {
            redact::redacting().decorate(logs)
        } else {
            redact::revealing().decorate(logs)
        };

        match at {
            Level::Fatal => Arc::new(ExitLogger {
                inner: logs,
                exit: self.exit.clone().unwrap_or_else(process_exit),
                code: self.exit_code,
            }),
            Level::Panic => Arc::new(PanicLogger {
                inner: logs,
                panic: self.panic.clone().unwrap_or_else(language_panic),
                redact: self.redact,
            }),
            _ => logs,
        }
    }
}

struct ExitLogger {
    inner: Arc<dyn Logger>,
    exit: ExitFn,
    code: i32,
}

impl Logger for ExitLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        self.inner.logf(ctx, message, args);
        (self.exit)(self.code);
    }
}

struct PanicLogger {
    inner: Arc<dyn Logger>,
    panic: PanicFn,
    redact: bool,
}

impl Logger for PanicLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        self.inner.logf(ctx, message, args);
        (self.panic)(&render_sensitive(self.redact, message, args));
    }
}

/// Renders the event the same way the per-level logger sees it.
fn render_sensitive(redact: bool, message: &str, args: &[Value]) -> String {
    let replaced = if redact {
        redact::redact_args(args)
    } else {
        redact::reveal_args(args)
    };
    match replaced {
        Some(args) => format::render(message, &args),
        None => format::render(message, args),
    }
}

/// A reversible change to a [`Config`].
///
/// [`apply`](ConfigOption::apply) mutates the config and returns the
/// option that restores exactly what was changed.
#[derive(Clone)]
pub enum ConfigOption {
    NoOp,
    Level(Level),
    Sink(StreamOrLogger),
    Marshaler(Option<Arc<dyn Marshaler>>),
    /// Appends marshaler decorators.
    Decorate(Vec<Arc<dyn MarshalerDecorator>>),
    SetDecorators(MarshalerDecorators),
    Exit(Option<ExitFn>),
    ExitCode(i32),
    Panic(Option<PanicFn>),
    Caller(CallerTracking),
    Errors(Option<Sender<LoggerError>>),
    /// Appends per-level transform operators.
    Transform(Vec<Arc<dyn TransformOp>>),
    SetTransforms(TransformOps),
    /// Appends context decorators.
    ContextDecorate(Vec<Arc<dyn ContextDecorator>>),
    SetContextDecorators(ContextDecorators),
    Annotate(bool),
    Redact(bool),
    Getter(Getter),
    /// Applies each option in order; reverts them in reverse order.
    Batch(Vec<ConfigOption>),
}

impl ConfigOption {
    /// Sink option for a stream.
    pub fn stream<S: Stream + 'static>(s: S) -> Self {
        Self::shared_stream(stream::shared(s))
    }

    pub fn shared_stream(s: SharedStream) -> Self {
        ConfigOption::Sink(StreamOrLogger {
            stream: Some(s),
            logger: None,
        })
    }

    /// Sink option for a logger.
    pub fn logger(logs: Arc<dyn Logger>) -> Self {
        ConfigOption::Sink(StreamOrLogger {
            stream: None,
            logger: Some(logs),
        })
    }

    pub fn exit<F: Fn(i32) + Send + Sync + 'static>(f: F) -> Self {
        ConfigOption::Exit(Some(Arc::new(f)))
    }

    pub fn panic<F: Fn(&str) + Send + Sync + 'static>(f: F) -> Self {
        ConfigOption::Panic(Some(Arc::new(f)))
    }

    pub fn decorate(d: Arc<dyn MarshalerDecorator>) -> Self {
        ConfigOption::Decorate(vec![d])
    }

    pub fn transform(op: Arc<dyn TransformOp>) -> Self {
        ConfigOption::Transform(vec![op])
    }

    pub fn context(d: Arc<dyn ContextDecorator>) -> Self {
        ConfigOption::ContextDecorate(vec![d])
    }

    /// Applies this option to `cfg`, returning its inverse.
    pub fn apply(self, cfg: &mut Config) -> ConfigOption {
        use std::mem::replace;

        match self {
            ConfigOption::NoOp => ConfigOption::NoOp,
            ConfigOption::Level(l) => ConfigOption::Level(replace(&mut cfg.level, l)),
            ConfigOption::Sink(s) => ConfigOption::Sink(replace(&mut cfg.sink, s)),
            ConfigOption::Marshaler(m) => ConfigOption::Marshaler(replace(&mut cfg.marshaler, m)),
            ConfigOption::Decorate(dd) => {
                let old = cfg.decorators.clone();
                cfg.decorators.extend(dd);
                ConfigOption::SetDecorators(old)
            }
            ConfigOption::SetDecorators(dd) => {
                ConfigOption::SetDecorators(replace(&mut cfg.decorators, dd))
            }
            ConfigOption::Exit(f) => ConfigOption::Exit(replace(&mut cfg.exit, f)),
            ConfigOption::ExitCode(c) => ConfigOption::ExitCode(replace(&mut cfg.exit_code, c)),
            ConfigOption::Panic(f) => ConfigOption::Panic(replace(&mut cfg.panic, f)),
            ConfigOption::Caller(t) => ConfigOption::Caller(replace(&mut cfg.caller, t)),
            ConfigOption::Errors(e) => ConfigOption::Errors(replace(&mut cfg.errors, e)),
            ConfigOption::Transform(ops) => {
                let old = cfg.transforms.clone();
                cfg.transforms.extend(ops);
                ConfigOption::SetTransforms(old)
            }
            ConfigOption::SetTransforms(ops) => {
                ConfigOption::SetTransforms(replace(&mut cfg.transforms, ops))
            }
            ConfigOption::ContextDecorate(dd) => {
                let old = cfg.context.clone();
                cfg.context.extend(dd);
                ConfigOption::SetContextDecorators(old)
            }
            ConfigOption::SetContextDecorators(dd) => {
                ConfigOption::SetContextDecorators(replace(&mut cfg.context, dd))
            }
            ConfigOption::Annotate(b) => ConfigOption::Annotate(replace(&mut cfg.annotate, b)),
            ConfigOption::Redact(b) => ConfigOption::Redact(replace(&mut cfg.redact, b)),
            ConfigOption::Getter(g) => ConfigOption::Getter(replace(&mut cfg.getter, g)),
            ConfigOption::Batch(opts) => {
                let mut undo: Vec<ConfigOption> = opts.into_iter().map(|o| o.apply(cfg)).collect();
                undo.reverse();
                ConfigOption::Batch(undo)
            }
        }
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOption::NoOp => f.write_str("NoOp"),
            ConfigOption::Level(l) => write!(f, "Level({:?})", l),
            ConfigOption::Sink(s) => write!(f, "Sink({:?})", s),
            ConfigOption::Marshaler(m) => write!(f, "Marshaler({})", m.is_some()),
            ConfigOption::Decorate(dd) => write!(f, "Decorate({})", dd.len()),
            ConfigOption::SetDecorators(dd) => write!(f, "SetDecorators({})", dd.len()),
            ConfigOption::Exit(e) => write!(f, "Exit({})", e.is_some()),
            ConfigOption::ExitCode(c) => write!(f, "ExitCode({})", c),
            ConfigOption::Panic(p) => write!(f, "Panic({})", p.is_some()),
            ConfigOption::Caller(t) => write!(f, "Caller({:?})", t),
            ConfigOption::Errors(e) => write!(f, "Errors({})", e.is_some()),
            ConfigOption::Transform(ops) => write!(f, "Transform({})", ops.len()),
            ConfigOption::SetTransforms(ops) => write!(f, "SetTransforms({})", ops.len()),
            ConfigOption::ContextDecorate(dd) => write!(f, "ContextDecorate({})", dd.len()),
            ConfigOption::SetContextDecorators(dd) => {
                write!(f, "SetContextDecorators({})", dd.len())
            }
            ConfigOption::Annotate(b) => write!(f, "Annotate({})", b),
            ConfigOption::Redact(b) => write!(f, "Redact({})", b),
            ConfigOption::Getter(_) => f.write_str("Getter"),
            ConfigOption::Batch(opts) => f.debug_tuple("Batch").field(opts).finish(),
        }
    }
}

/// Outcome of a logging call.
///
/// Fatal and Panic events normally never return: their hooks exit or
/// panic. When a hook has been replaced by one that returns, the caller
/// receives the action the default hook would have taken.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Fatal and Panic calls report the termination they request"]
pub enum Action {
    Continue,
    Exit(i32),
    Abort(String),
}

/// Six per-level loggers plus the context getter that feeds them.
#[derive(Clone)]
pub struct Interface {
    loggers: [Arc<dyn Logger>; 6],
    getter: Getter,
    track_caller: bool,
    exit_code: i32,
    redact: bool,
}

impl Default for Interface {
    fn default() -> Self {
        Config::default().build()
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("track_caller", &self.track_caller)
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

impl Interface {
    /// The logger serving `level`.
    #[must_use]
    pub fn logger(&self, level: Level) -> Arc<dyn Logger> {
        Arc::clone(&self.loggers[level.index()])
    }

    /// Logs through the `level` logger, recording `site` as the call site.
    pub fn logf_at(
        &self,
        level: Level,
        ctx: &Context,
        site: CallSite,
        message: &str,
        args: &[Value],
    ) -> Action {
        let logs = &self.loggers[level.index()];
        if self.track_caller {
            logs.logf(&caller::stamp(ctx, site), message, args);
        } else {
            logs.logf(ctx, message, args);
        }
        match level {
            Level::Fatal => Action::Exit(self.exit_code),
            Level::Panic => Action::Abort(render_sensitive(self.redact, message, args)),
            _ => Action::Continue,
        }
    }

    /// Logs with a fresh context from the configured getter.
    pub fn logf_site(&self, level: Level, site: CallSite, message: &str, args: &[Value]) -> Action {
        self.logf_at(level, &(self.getter)(), site, message, args)
    }

    #[track_caller]
    pub fn logf_ctx(&self, level: Level, ctx: &Context, message: &str, args: &[Value]) -> Action {
        self.logf_at(level, ctx, CallSite::here(), message, args)
    }

    #[track_caller]
    pub fn logf(&self, level: Level, message: &str, args: &[Value]) -> Action {
        self.logf_site(level, CallSite::here(), message, args)
    }

    #[track_caller]
    pub fn debugf(&self, message: &str, args: &[Value]) {
        let _ = self.logf(Level::Debug, message, args);
    }

    #[track_caller]
    pub fn infof(&self, message: &str, args: &[Value]) {
        let _ = self.logf(Level::Info, message, args);
    }

    #[track_caller]
    pub fn warnf(&self, message: &str, args: &[Value]) {
        let _ = self.logf(Level::Warn, message, args);
    }

    #[track_caller]
    pub fn errorf(&self, message: &str, args: &[Value]) {
        let _ = self.logf(Level::Error, message, args);
    }

    /// Logs, then invokes the exit hook.
    #[track_caller]
    pub fn fatalf(&self, message: &str, args: &[Value]) -> Action {
        self.logf(Level::Fatal, message, args)
    }

    /// Logs, then invokes the panic hook with the rendered message.
    #[track_caller]
    pub fn panicf(&self, message: &str, args: &[Value]) -> Action {
        self.logf(Level::Panic, message, args)
    }

    #[track_caller]
    pub fn debug(&self, args: &[Value]) {
        self.debugf("", args)
    }

    #[track_caller]
    pub fn info(&self, args: &[Value]) {
        self.infof("", args)
    }

    #[track_caller]
    pub fn warn(&self, args: &[Value]) {
        self.warnf("", args)
    }

    #[track_caller]
    pub fn error(&self, args: &[Value]) {
        self.errorf("", args)
    }

    #[track_caller]
    pub fn fatal(&self, args: &[Value]) -> Action {
        self.fatalf("", args)
    }

    #[track_caller]
    pub fn panic(&self, args: &[Value]) -> Action {
        self.panicf("", args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::caller::Caller;
    use crate::core::redact::Sensitive;
    use crate::streams::BufferedStream;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn Logger>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logs: Arc<dyn Logger> = Arc::new(move |_: &Context, m: &str, a: &[Value]| {
            sink.lock().push(format::render(m, a));
        });
        (lines, logs)
    }

    fn buffered() -> (Arc<Mutex<Vec<String>>>, ConfigOption) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let s = BufferedStream::with_callback(move |buf, status| {
            status?;
            sink.lock().push(buf.to_string());
            Ok(())
        });
        (lines, ConfigOption::stream(s))
    }

    fn quiet() -> Vec<ConfigOption> {
        vec![ConfigOption::Exit(Some(no_exit())), ConfigOption::Panic(Some(no_panic()))]
    }

    #[test]
    fn test_default_threshold_is_info() {
        let (lines, capture) = recorder();
        let (logs, _) = Config::default().with([ConfigOption::logger(capture)]);
        logs.debugf("I can count 1 2 %d", &[Value::from(3)]);
        logs.infof("and more 4 5 %d", &[Value::from(6)]);
        assert_eq!(*lines.lock(), vec!["and more 4 5 6"]);
    }

    #[test]
    fn test_stream_sink_annotates_level() {
        let (lines, sink) = buffered();
        let (logs, _) = Config::default().with([sink]);
        logs.warnf("x=%d", &[Value::from(7)]);
        assert_eq!(*lines.lock(), vec!["Wx=7"]);
    }

    #[test]
    fn test_annotation_can_be_disabled() {
        let (lines, sink) = buffered();
        let (logs, _) = Config::default().with([sink, ConfigOption::Annotate(false)]);
        logs.errorf("plain", &[]);
        assert_eq!(*lines.lock(), vec!["plain"]);
    }

    #[test]
    fn test_stream_wins_over_logger() {
        let stream_lines = Arc::new(Mutex::new(Vec::new()));
        let (logger_lines, capture) = recorder();
        let stream_sink = {
            let sink = Arc::clone(&stream_lines);
            stream::shared(BufferedStream::with_callback(move |buf, status| {
                sink.lock().push(buf.to_string());
                status
            }))
        };
        let both = StreamOrLogger {
            stream: Some(stream_sink),
            logger: Some(capture),
        };
        let (logs, _) = Config::default().with([ConfigOption::Sink(both)]);
        logs.infof("where", &[]);
        assert_eq!(*stream_lines.lock(), vec!["Iwhere"]);
        assert!(logger_lines.lock().is_empty());
    }

    #[test]
    fn test_fatal_invokes_exit_hook_with_code() {
        let (lines, capture) = recorder();
        let codes = Arc::new(Mutex::new(Vec::new()));
        let spy = Arc::clone(&codes);
        let (logs, _) = Config::default().with([
            ConfigOption::logger(capture),
            ConfigOption::ExitCode(3),
            ConfigOption::exit(move |code| spy.lock().push(code)),
        ]);
        assert_eq!(logs.fatalf("bye %s", &[Value::from("now")]), Action::Exit(3));
        assert_eq!(*lines.lock(), vec!["bye now"]);
        assert_eq!(*codes.lock(), vec![3]);
    }

    #[test]
    fn test_panic_hook_receives_rendered_message() {
        let (_, capture) = recorder();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let spy = Arc::clone(&seen);
        let (logs, _) = Config::default().with([
            ConfigOption::logger(capture),
            ConfigOption::panic(move |m| spy.lock().push(m.to_string())),
        ]);
        let action = logs.panicf("pin %v", &[Value::sensitive(Sensitive::new(1234))]);
        assert_eq!(action, Action::Abort("pin ****".to_string()));
        assert_eq!(*seen.lock(), vec!["pin ****"]);
    }

    #[test]
    fn test_transforms_see_redacted_args() {
        let (lines, capture) = recorder();
        let (copies, copy) = recorder();
        let tapped = Arc::clone(&copies);
        let tap = move |at: Level, inner: Arc<dyn Logger>| -> (Level, Arc<dyn Logger>) {
            let tapped = Arc::clone(&tapped);
            let logs: Arc<dyn Logger> = Arc::new(move |c: &Context, m: &str, a: &[Value]| {
                tapped.lock().push(format!("tap {}", format::render(m, a)));
                inner.logf(c, m, a);
            });
            (at, logs)
        };
        let (logs, _) = Config::default().with([
            ConfigOption::logger(capture),
            ConfigOption::transform(Arc::new(tap)),
            ConfigOption::transform(level::broadcast(level::match_exact(Level::Info), false, vec![copy])),
        ]);
        logs.infof("pin %v", &[Value::sensitive(Sensitive::new(1234))]);

        assert_eq!(*lines.lock(), vec!["pin ****"]);
        assert!(copies.lock().iter().all(|l| !l.contains("1234")));
        assert!(copies.lock().contains(&"pin ****".to_string()));
        assert!(copies.lock().contains(&"tap pin ****".to_string()));
    }

    #[test]
    fn test_direct_level_logger_redacts() {
        let (lines, capture) = recorder();
        let (logs, _) = Config::default().with([ConfigOption::logger(capture)]);
        logs.logger(Level::Error)
            .logf(&Context::background(), "pin %v", &[Value::sensitive(Sensitive::new(1234))]);
        assert_eq!(*lines.lock(), vec!["pin ****"]);
    }

    #[test]
    fn test_default_panic_hook_panics() {
        let (_, capture) = recorder();
        let (logs, _) = Config::default().with([ConfigOption::logger(capture)]);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = logs.panicf("really %s", &[Value::from("bad")]);
        }));
        let payload = outcome.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("really bad"));
    }

    #[test]
    fn test_exit_fires_even_when_fatal_is_filtered() {
        let (lines, capture) = recorder();
        let codes = Arc::new(Mutex::new(0));
        let spy = Arc::clone(&codes);
        let (logs, _) = Config::default().with([
            ConfigOption::logger(capture),
            ConfigOption::Level(Level::Panic),
            ConfigOption::exit(move |_| *spy.lock() += 1),
        ]);
        let _ = logs.fatalf("dropped", &[]);
        assert!(lines.lock().is_empty());
        assert_eq!(*codes.lock(), 1);
    }

    #[test]
    fn test_option_inverse_restores_config() {
        let mut cfg = Config::default();
        let (_, capture) = recorder();
        let undo = cfg.apply([
            ConfigOption::Level(Level::Debug),
            ConfigOption::logger(capture),
            ConfigOption::ExitCode(9),
            ConfigOption::decorate(encoding::no_decorator()),
            ConfigOption::transform(level::min_transform(Level::Error)),
            ConfigOption::context(crate::core::context::no_decorator()),
            ConfigOption::Caller(CallerTracking::ENABLED),
            ConfigOption::Redact(false),
            ConfigOption::NoOp,
        ]);
        assert_eq!(cfg.level, Level::Debug);
        assert_eq!(cfg.exit_code, 9);
        assert_eq!(cfg.decorators.len(), 1);
        assert_eq!(cfg.transforms.len(), 1);
        assert_eq!(cfg.context.len(), 1);
        assert!(cfg.sink.logger.is_some());

        let redo = undo.apply(&mut cfg);
        assert_eq!(cfg.level, Level::Info);
        assert_eq!(cfg.exit_code, DEFAULT_EXIT_CODE);
        assert!(cfg.decorators.is_empty());
        assert!(cfg.transforms.is_empty());
        assert!(cfg.context.is_empty());
        assert!(cfg.sink.logger.is_none());
        assert!(!cfg.caller.enabled);
        assert!(cfg.redact);

        let _ = redo.apply(&mut cfg);
        assert_eq!(cfg.level, Level::Debug);
        assert_eq!(cfg.decorators.len(), 1);
    }

    #[test]
    fn test_with_leaves_receiver_untouched() {
        let cfg = Config::default();
        let (_, undo) = cfg.with([ConfigOption::Level(Level::Error)]);
        assert_eq!(cfg.level, Level::Info);

        let mut derived = cfg.clone();
        let _ = ConfigOption::Level(Level::Error).apply(&mut derived);
        let _ = undo.apply(&mut derived);
        assert_eq!(derived.level, Level::Info);
    }

    #[test]
    fn test_user_transforms_run_after_threshold() {
        let (lines, capture) = recorder();
        let (extra, extra_logs) = recorder();
        let mut opts = quiet();
        opts.push(ConfigOption::logger(capture));
        opts.push(ConfigOption::transform(level::broadcast(
            level::match_at_or_above(Level::Error),
            false,
            vec![extra_logs],
        )));
        let (logs, _) = Config::default().with(opts);
        logs.debugf("hidden", &[]);
        logs.errorf("boom", &[]);
        assert_eq!(*lines.lock(), vec!["boom"]);
        // the broadcast copy bypasses the level-stamping chain
        assert_eq!(*extra.lock(), vec!["boom"]);
    }

    #[test]
    fn test_context_decorators_see_level() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let capture: Arc<dyn Logger> = Arc::new(move |c: &Context, _: &str, _: &[Value]| {
            sink.lock().push(level::from_context(c));
        });
        let (logs, _) = Config::default().with([
            ConfigOption::logger(capture),
            ConfigOption::context(Arc::new(|c: &Context| c.clone())),
        ]);
        logs.warnf("", &[]);
        assert_eq!(*seen.lock(), vec![Some(Level::Warn)]);
    }

    #[test]
    fn test_caller_tracking_records_call_site() {
        let seen = Arc::new(Mutex::new(None::<Caller>));
        let sink = Arc::clone(&seen);
        let capture: Arc<dyn Logger> = Arc::new(move |c: &Context, _: &str, _: &[Value]| {
            *sink.lock() = caller::from_context(c);
        });
        let (logs, _) = Config::default().with([
            ConfigOption::logger(capture),
            ConfigOption::Caller(CallerTracking::ENABLED),
        ]);
        let line = line!() + 1;
        logs.infof("where am i", &[]);
        let c = (*seen.lock()).expect("caller recorded");
        assert_eq!(c.line, line);
        assert_eq!(c.short_file(), "config.rs");
    }

    #[test]
    fn test_errors_are_delivered() {
        struct Failing;
        impl Stream for Failing {
            fn write(&mut self, _buf: &[u8]) -> crate::core::Result<usize> {
                Err(LoggerError::other("disk gone"))
            }
            fn eom(&mut self, status: crate::core::Result<()>) -> crate::core::Result<()> {
                status
            }
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let (logs, _) = Config::default().with([
            ConfigOption::stream(Failing),
            ConfigOption::Errors(Some(tx)),
        ]);
        logs.errorf("lost", &[]);
        assert_eq!(rx.try_recv().unwrap().to_string(), "disk gone");
    }

    #[test]
    fn test_formatless_variants() {
        let (lines, capture) = recorder();
        let (logs, _) = Config::default().with([ConfigOption::logger(capture)]);
        logs.info(&[Value::from("a"), Value::from(1), Value::from(2)]);
        logs.warn(&[Value::from(true)]);
        assert_eq!(*lines.lock(), vec!["a1 2", "true"]);
    }
}
