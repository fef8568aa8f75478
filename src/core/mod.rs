//! Core pipeline types and traits

pub mod caller;
pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod format;
pub mod global;
pub mod json;
pub mod level;
pub mod logger;
pub mod prefixes;
pub mod redact;
pub mod stream;
pub mod timestamp;
pub mod value;

pub use caller::{CallSite, Caller, CallerTracking};
pub use config::{Action, Config, ConfigOption, Interface, StreamOrLogger};
pub use context::{CancelHandle, Context, ContextDecorator, ContextDecorators, ContextKey, Getter};
pub use encoding::{Marshaler, MarshalerDecorator, MarshalerDecorators};
pub use error::{LoggerError, Result, WritePhase};
pub use level::{Filter, Level, LevelMask, Transform, TransformOp, TransformOps};
pub use logger::{Logger, LoggerDecorator};
pub use redact::{Redact, Sensitive};
pub use stream::{shared, SharedStream, Stream};
pub use timestamp::{Clock, TimestampFormat};
pub use value::Value;
