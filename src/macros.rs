//! Logging macros
//!
//! Each leveled macro takes a printf-style template followed by its
//! arguments. Arguments are converted with `Value::from`, and the macro
//! records its own location and enclosing function as the call site.
//!
//! Without a leading interface the macros log through the process-wide
//! interface; pass one first to log through it instead.
//!
//! # Examples
//!
//! ```
//! use rust_log_facade::core::config::{Config, ConfigOption};
//! use rust_log_facade::streams::NullStream;
//! use rust_log_facade::{infof, warnf};
//!
//! // process-wide interface
//! infof!("Server listening on port %d", 8080);
//!
//! // explicit interface
//! let (logs, _) = Config::default().with([ConfigOption::stream(NullStream::new())]);
//! warnf!(logs, "User %s performed action: %s", "alice", "login");
//! ```
//!
//! The formatless macros take a bare argument list; use `target:` to pick
//! an interface.
//!
//! ```
//! # use rust_log_facade::core::config::{Config, ConfigOption};
//! # use rust_log_facade::streams::NullStream;
//! use rust_log_facade::info;
//!
//! # let (logs, _) = Config::default().with([ConfigOption::stream(NullStream::new())]);
//! info!("ready", 3, "workers");
//! info!(target: logs; "ready", 3, "workers");
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __call_site {
    () => {{
        fn f() {}
        $crate::core::caller::CallSite::here().with_function(::core::any::type_name_of_val(&f))
    }};
}

/// Log at an explicit level, returning the resulting [`Action`](crate::core::Action).
///
/// # Examples
///
/// ```
/// use rust_log_facade::core::Level;
/// use rust_log_facade::logf;
///
/// let _ = logf!(Level::Info, "%d workers started", 4);
/// ```
#[macro_export]
macro_rules! logf {
    ($level:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::core::global::logf_at(
            $level,
            $crate::__call_site!(),
            $fmt,
            &[$($crate::core::Value::from($arg)),*],
        )
    };
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $logger.logf_site(
            $level,
            $crate::__call_site!(),
            $fmt,
            &[$($crate::core::Value::from($arg)),*],
        )
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// use rust_log_facade::debugf;
/// debugf!("Counter value: %d", 10);
/// ```
#[macro_export]
macro_rules! debugf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($crate::core::Level::Debug, $fmt $(, $arg)*);
    }};
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($logger, $crate::core::Level::Debug, $fmt $(, $arg)*);
    }};
}

/// Log an info-level message.
#[macro_export]
macro_rules! infof {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($crate::core::Level::Info, $fmt $(, $arg)*);
    }};
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($logger, $crate::core::Level::Info, $fmt $(, $arg)*);
    }};
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warnf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($crate::core::Level::Warn, $fmt $(, $arg)*);
    }};
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($logger, $crate::core::Level::Warn, $fmt $(, $arg)*);
    }};
}

/// Log an error-level message.
#[macro_export]
macro_rules! errorf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($crate::core::Level::Error, $fmt $(, $arg)*);
    }};
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $crate::logf!($logger, $crate::core::Level::Error, $fmt $(, $arg)*);
    }};
}

/// Log a fatal-level message, then invoke the exit hook.
///
/// Evaluates to the [`Action`](crate::core::Action) requested when the
/// hook returns.
///
/// # Examples
///
/// ```
/// use rust_log_facade::core::config::{no_exit, Config, ConfigOption};
/// use rust_log_facade::core::Action;
/// use rust_log_facade::streams::NullStream;
/// use rust_log_facade::fatalf;
///
/// let (logs, _) = Config::default().with([
///     ConfigOption::stream(NullStream::new()),
///     ConfigOption::Exit(Some(no_exit())),
/// ]);
/// assert_eq!(fatalf!(logs, "disk %s is gone", "sda"), Action::Exit(1));
/// ```
#[macro_export]
macro_rules! fatalf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::logf!($crate::core::Level::Fatal, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::logf!($logger, $crate::core::Level::Fatal, $fmt $(, $arg)*)
    };
}

/// Log a panic-level message, then invoke the panic hook.
#[macro_export]
macro_rules! panicf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::logf!($crate::core::Level::Panic, $fmt $(, $arg)*)
    };
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::logf!($logger, $crate::core::Level::Panic, $fmt $(, $arg)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_bare {
    ($level:expr; target: $logger:expr; $($arg:expr),* $(,)?) => {
        $logger.logf_site(
            $level,
            $crate::__call_site!(),
            "",
            &[$($crate::core::Value::from($arg)),*],
        )
    };
    ($level:expr; $($arg:expr),* $(,)?) => {
        $crate::core::global::logf_at(
            $level,
            $crate::__call_site!(),
            "",
            &[$($crate::core::Value::from($arg)),*],
        )
    };
}

/// Log bare values at debug level.
#[macro_export]
macro_rules! debug {
    ($($tt:tt)*) => {{
        let _ = $crate::__log_bare!($crate::core::Level::Debug; $($tt)*);
    }};
}

/// Log bare values at info level.
#[macro_export]
macro_rules! info {
    ($($tt:tt)*) => {{
        let _ = $crate::__log_bare!($crate::core::Level::Info; $($tt)*);
    }};
}

/// Log bare values at warning level.
#[macro_export]
macro_rules! warn {
    ($($tt:tt)*) => {{
        let _ = $crate::__log_bare!($crate::core::Level::Warn; $($tt)*);
    }};
}

/// Log bare values at error level.
#[macro_export]
macro_rules! error {
    ($($tt:tt)*) => {{
        let _ = $crate::__log_bare!($crate::core::Level::Error; $($tt)*);
    }};
}

/// Log bare values at fatal level, then invoke the exit hook.
#[macro_export]
macro_rules! fatal {
    ($($tt:tt)*) => {
        $crate::__log_bare!($crate::core::Level::Fatal; $($tt)*)
    };
}
