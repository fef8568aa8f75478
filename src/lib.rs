//! # Rust Log Facade
//!
//! A composable logging facade. A leveled interface (`debugf` through
//! `panicf`) sits in front of a pipeline assembled from decorators, so
//! that formatting, destinations and cross-cutting behaviour can all be
//! swapped without touching call sites.
//!
//! ## Features
//!
//! - **Pluggable sinks**: any [`Stream`](core::Stream) or
//!   [`Logger`](core::Logger), framed per event
//! - **Decorators**: level codes, timestamps, call sites and custom
//!   prefixes around any marshaler
//! - **Redaction**: sensitive arguments are masked before they are rendered
//! - **Reversible configuration**: every option hands back its own undo
//! - **Testable termination**: Fatal and Panic hooks can be swapped out
//!
//! ## Example
//!
//! ```
//! use rust_log_facade::prelude::*;
//! use rust_log_facade::streams::BufferedStream;
//! use std::sync::{Arc, Mutex};
//!
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&lines);
//! let stream = BufferedStream::with_callback(move |buf, status| {
//!     sink.lock().unwrap().push(buf.to_string());
//!     status
//! });
//!
//! let (logs, _undo) = Config::default().with([ConfigOption::stream(stream)]);
//! logs.warnf("x=%d", &[Value::from(7)]);
//! assert_eq!(*lines.lock().unwrap(), vec!["Wx=7"]);
//! ```

pub mod core;
pub mod macros;
pub mod streams;

pub mod prelude {
    pub use crate::core::config::{no_exit, no_panic};
    pub use crate::core::{
        Action, CallerTracking, Config, ConfigOption, Context, Interface, Level, Logger,
        LoggerError, Marshaler, Redact, Result, Sensitive, Stream, Value,
    };
}

pub use crate::core::global::{
    debug, debugf, error, errorf, fatal, fatalf, info, infof, panic, panicf, warn, warnf,
};
pub use crate::core::{
    Action, Config, ConfigOption, Context, Interface, Level, Logger, LoggerError, Result, Value,
};
