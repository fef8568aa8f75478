//! Marshalers and marshaler decorators
//!
//! A [`Marshaler`] renders one event onto a [`Stream`] and frames it with
//! exactly one [`Stream::eom`] call. Decorators wrap marshalers to inject
//! prefixes or rewrite the context for the layers below them.
//!
//! Decorator lists fold onto a base marshaler so that the LAST decorator in
//! the list wraps outermost and runs first. Context decorators compose the
//! other way around (see [`ContextDecorators`]).

use super::context::{Context, ContextDecorator, ContextDecorators};
use super::error::Result;
use super::format;
use super::stream::Stream;
use super::value::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Writes one log event to a stream.
pub trait Marshaler: Send + Sync {
    fn marshal(
        &self,
        ctx: &Context,
        stream: &mut dyn Stream,
        message: &str,
        args: &[Value],
    ) -> Result<()>;
}

impl<F> Marshaler for F
where
    F: Fn(&Context, &mut dyn Stream, &str, &[Value]) -> Result<()> + Send + Sync,
{
    fn marshal(
        &self,
        ctx: &Context,
        stream: &mut dyn Stream,
        message: &str,
        args: &[Value],
    ) -> Result<()> {
        self(ctx, stream, message, args)
    }
}

/// Marshaler that discards every event without touching the stream.
#[must_use]
pub fn null_marshaler() -> Arc<dyn Marshaler> {
    Arc::new(|_: &Context, _: &mut dyn Stream, _: &str, _: &[Value]| -> Result<()> { Ok(()) })
}

/// Wraps a marshaler, typically adding behaviour around it.
pub trait MarshalerDecorator: Send + Sync {
    fn decorate(&self, next: Arc<dyn Marshaler>) -> Arc<dyn Marshaler>;
}

impl<F> MarshalerDecorator for F
where
    F: Fn(Arc<dyn Marshaler>) -> Arc<dyn Marshaler> + Send + Sync,
{
    fn decorate(&self, next: Arc<dyn Marshaler>) -> Arc<dyn Marshaler> {
        self(next)
    }
}

/// Decorator that returns the marshaler unmodified.
#[must_use]
pub fn no_decorator() -> Arc<dyn MarshalerDecorator> {
    Arc::new(|m: Arc<dyn Marshaler>| m)
}

/// Ordered list of marshaler decorators.
#[derive(Clone, Default)]
pub struct MarshalerDecorators(Vec<Arc<dyn MarshalerDecorator>>);

impl MarshalerDecorators {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, d: Arc<dyn MarshalerDecorator>) {
        self.0.push(d);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Arc<dyn MarshalerDecorator>>) {
        self.0.extend(other);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds every decorator onto `base`, in order. The last decorator in
    /// the list is the first one invoked by the returned marshaler.
    #[must_use]
    pub fn decorate(&self, base: Arc<dyn Marshaler>) -> Arc<dyn Marshaler> {
        self.0.iter().fold(base, |m, d| d.decorate(m))
    }
}

impl From<Vec<Arc<dyn MarshalerDecorator>>> for MarshalerDecorators {
    fn from(v: Vec<Arc<dyn MarshalerDecorator>>) -> Self {
        Self(v)
    }
}

impl fmt::Debug for MarshalerDecorators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarshalerDecorators({})", self.0.len())
    }
}

struct FormatMarshaler;

impl Marshaler for FormatMarshaler {
    fn marshal(
        &self,
        _ctx: &Context,
        stream: &mut dyn Stream,
        message: &str,
        args: &[Value],
    ) -> Result<()> {
        let text = format::render(message, args);
        let status = stream.write_all(text.as_bytes());
        stream.eom(status)
    }
}

/// The default marshaler.
///
/// A non-empty message is expanded as a printf-style template over `args`;
/// an empty message renders the args alone, separated by spaces where
/// neither neighbour is a string. Every event ends with one EOM carrying
/// the write status.
#[must_use]
pub fn format(decorators: MarshalerDecorators) -> Arc<dyn Marshaler> {
    decorators.decorate(Arc::new(FormatMarshaler))
}

/// One piece of a prefix.
pub type Chunk = Cow<'static, [u8]>;

/// Lazily produced prefix chunks.
pub type Chunks = Box<dyn Iterator<Item = Chunk> + Send>;

/// No chunks at all.
#[must_use]
pub fn empty() -> Chunks {
    Box::new(std::iter::empty())
}

/// A single chunk; an empty buffer yields no chunks.
#[must_use]
pub fn singular(bytes: impl Into<Chunk>) -> Chunks {
    let bytes = bytes.into();
    if bytes.is_empty() {
        return empty();
    }
    Box::new(std::iter::once(bytes))
}

/// Yields each buffer in order.
#[must_use]
pub fn chunks(parts: Vec<Chunk>) -> Chunks {
    Box::new(parts.into_iter())
}

/// Produces the prefix chunks for one event.
pub type PrefixFn = Arc<dyn Fn(&Context) -> Chunks + Send + Sync>;

struct PrefixMarshaler {
    prefix: PrefixFn,
    next: Arc<dyn Marshaler>,
}

impl Marshaler for PrefixMarshaler {
    fn marshal(
        &self,
        ctx: &Context,
        stream: &mut dyn Stream,
        message: &str,
        args: &[Value],
    ) -> Result<()> {
        for chunk in (self.prefix)(ctx) {
            if chunk.is_empty() {
                continue;
            }
            if let Err(e) = stream.write_all(&chunk) {
                // the wrapped marshaler never runs, so frame the event here
                return stream.eom(Err(e));
            }
        }
        self.next.marshal(ctx, stream, message, args)
    }
}

/// Decorator that writes the chunks produced by `f` before delegating.
///
/// A failed prefix write aborts the event: the wrapped marshaler is not
/// invoked and the stream receives `eom` with the write error.
#[must_use]
pub fn prefix<F>(f: F) -> Arc<dyn MarshalerDecorator>
where
    F: Fn(&Context) -> Chunks + Send + Sync + 'static,
{
    let prefix: PrefixFn = Arc::new(f);
    Arc::new(move |next: Arc<dyn Marshaler>| -> Arc<dyn Marshaler> {
        Arc::new(PrefixMarshaler {
            prefix: Arc::clone(&prefix),
            next,
        })
    })
}

struct ContextMarshaler {
    decorator: Arc<dyn ContextDecorator>,
    next: Arc<dyn Marshaler>,
}

impl Marshaler for ContextMarshaler {
    fn marshal(
        &self,
        ctx: &Context,
        stream: &mut dyn Stream,
        message: &str,
        args: &[Value],
    ) -> Result<()> {
        let ctx = self.decorator.decorate(ctx);
        self.next.marshal(&ctx, stream, message, args)
    }
}

/// Decorator that rewrites the context seen by the wrapped marshaler.
#[must_use]
pub fn with_context(decorator: Arc<dyn ContextDecorator>) -> Arc<dyn MarshalerDecorator> {
    Arc::new(move |next: Arc<dyn Marshaler>| -> Arc<dyn Marshaler> {
        Arc::new(ContextMarshaler {
            decorator: Arc::clone(&decorator),
            next,
        })
    })
}

/// Like [`with_context`] for a whole decorator list.
#[must_use]
pub fn with_contexts(decorators: ContextDecorators) -> Arc<dyn MarshalerDecorator> {
    with_context(Arc::new(move |c: &Context| decorators.decorate(c)))
}
