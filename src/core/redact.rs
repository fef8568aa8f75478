//! Capability-based redaction
//!
//! Types that may carry secrets implement [`Redact`]. The interface
//! replaces every [`Value::Sensitive`] argument with its redacted rendering
//! at the entry point, before any transform, broadcast copy or custom
//! logger runs. Revealing the raw form takes an explicit opt-in
//! ([`reveal_args`], or `Redact(false)` in the configuration).
//!
//! [`redacting`] applies the same rewrite as a logger decorator, for
//! loggers driven directly rather than through an interface.

use super::context::Context;
use super::logger::{Logger, LoggerDecorator};
use super::value::Value;
use std::fmt;
use std::sync::Arc;

/// Character substituted for every masked character.
pub const MASK_CHAR: char = '*';

/// Capability of a value to render itself without exposing secrets.
pub trait Redact: Send + Sync {
    /// The raw rendering.
    fn reveal(&self) -> String;

    /// The rendering safe for log output. Defaults to masking all of
    /// [`reveal`](Redact::reveal).
    fn redacted(&self) -> String {
        mask(&self.reveal())
    }
}

/// Masks alphanumeric characters, keeping separators so the value keeps
/// its shape (`4111-1111` becomes `****-****`).
#[must_use]
pub fn mask(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { MASK_CHAR } else { c })
        .collect()
}

/// Wraps any displayable value as fully sensitive.
#[derive(Clone)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Display + Send + Sync> Redact for Sensitive<T> {
    fn reveal(&self) -> String {
        self.0.to_string()
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive(..)")
    }
}

/// Replaces sensitive arguments with their redacted form.
///
/// Returns `None` when no argument is sensitive, so callers can keep
/// borrowing the original slice.
#[must_use]
pub fn redact_args(args: &[Value]) -> Option<Vec<Value>> {
    replace_sensitive(args, |s| s.redacted())
}

/// Replaces sensitive arguments with their raw form.
#[must_use]
pub fn reveal_args(args: &[Value]) -> Option<Vec<Value>> {
    replace_sensitive(args, |s| s.reveal())
}

fn replace_sensitive(
    args: &[Value],
    render: impl Fn(&dyn Redact) -> String,
) -> Option<Vec<Value>> {
    if !args.iter().any(|a| matches!(a, Value::Sensitive(_))) {
        return None;
    }
    Some(
        args.iter()
            .map(|a| match a {
                Value::Sensitive(s) => Value::Str(render(s.as_ref())),
                other => other.clone(),
            })
            .collect(),
    )
}

struct RedactingLogger {
    inner: Arc<dyn Logger>,
    reveal: bool,
}

impl Logger for RedactingLogger {
    fn logf(&self, ctx: &Context, message: &str, args: &[Value]) {
        let replaced = if self.reveal {
            reveal_args(args)
        } else {
            redact_args(args)
        };
        match replaced {
            Some(args) => self.inner.logf(ctx, message, &args),
            None => self.inner.logf(ctx, message, args),
        }
    }
}

/// Logger decorator that redacts sensitive arguments.
#[must_use]
pub fn redacting() -> Arc<dyn LoggerDecorator> {
    Arc::new(|inner: Arc<dyn Logger>| -> Arc<dyn Logger> {
        Arc::new(RedactingLogger {
            inner,
            reveal: false,
        })
    })
}

/// Logger decorator that replaces sensitive arguments with their raw form.
#[must_use]
pub fn revealing() -> Arc<dyn LoggerDecorator> {
    Arc::new(|inner: Arc<dyn Logger>| -> Arc<dyn Logger> {
        Arc::new(RedactingLogger {
            inner,
            reveal: true,
        })
    })
}
