//! Immutable, chainable logging context
//!
//! This module provides:
//! - `Context`: a read-only chain of typed key/value bindings with a
//!   cancellation signal
//! - `ContextKey`: typed tokens used to bind and look up values
//! - `ContextDecorator` / `ContextDecorators`: context rewriting, applied
//!   first-to-last
//! - `Getter`: a factory producing a fresh context per log event

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Weak};

/// A typed key for values stored in a [`Context`].
///
/// Keys are usually private zero-sized types, so that two modules can never
/// collide on a binding even if they store equal values.
///
/// # Example
///
/// ```
/// use rust_log_facade::core::context::{Context, ContextKey};
///
/// struct RequestId;
/// impl ContextKey for RequestId {
///     type Value = String;
/// }
///
/// let ctx = Context::background().with_value::<RequestId>("abc-123".to_string());
/// assert_eq!(ctx.value::<RequestId>().as_deref(), Some("abc-123"));
/// ```
pub trait ContextKey: 'static {
    type Value: Clone + Send + Sync + 'static;
}

#[derive(Clone)]
pub struct Context {
    node: Arc<Node>,
}

struct Node {
    kind: Kind,
    /// nearest cancellation scope in the chain, copied at construction
    scope: Option<Arc<Scope>>,
}

/// One cancellation scope. The sender lives as long as any context or
/// handle referencing the scope; taking it disconnects `done`.
struct Scope {
    sender: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    children: Mutex<Vec<Weak<Scope>>>,
}

impl Scope {
    fn new() -> Arc<Self> {
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        Arc::new(Self {
            sender: Mutex::new(Some(tx)),
            done: rx,
            children: Mutex::new(Vec::new()),
        })
    }

    fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Links `child` under `self`, cancelling it at once if `self` is
    /// already cancelled.
    fn adopt(&self, child: &Arc<Scope>) {
        let mut children = self.children.lock();
        if self.is_cancelled() {
            drop(children);
            child.cancel();
            return;
        }
        children.retain(|w| w.strong_count() > 0);
        children.push(Arc::downgrade(child));
    }

    fn cancel(&self) {
        if self.sender.lock().take().is_none() {
            return;
        }
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

enum Kind {
    Root { todo: bool },
    Value {
        parent: Context,
        key: TypeId,
        value: Arc<dyn Any + Send + Sync>,
    },
    Cancel { parent: Context },
}

impl Context {
    /// A blank context whose done signal never fires.
    #[must_use]
    pub fn background() -> Self {
        Self {
            node: Arc::new(Node {
                kind: Kind::Root { todo: false },
                scope: None,
            }),
        }
    }

    /// Identical to [`Context::background`]; marks a call site still waiting
    /// for a real context to be threaded through.
    #[must_use]
    pub fn todo() -> Self {
        Self {
            node: Arc::new(Node {
                kind: Kind::Root { todo: true },
                scope: None,
            }),
        }
    }

    /// Returns a new context binding `value` under `K`; `self` is untouched.
    #[must_use]
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            node: Arc::new(Node {
                kind: Kind::Value {
                    parent: self.clone(),
                    key: TypeId::of::<K>(),
                    value: Arc::new(value),
                },
                scope: self.node.scope.clone(),
            }),
        }
    }

    /// Looks up the nearest binding for `K`, walking towards the root.
    #[must_use]
    pub fn value<K: ContextKey>(&self) -> Option<K::Value> {
        let wanted = TypeId::of::<K>();
        let mut cursor = self;
        loop {
            match &cursor.node.kind {
                Kind::Root { .. } => return None,
                Kind::Value { parent, key, value } => {
                    if *key == wanted {
                        return value.downcast_ref::<K::Value>().cloned();
                    }
                    cursor = parent;
                }
                Kind::Cancel { parent } => cursor = parent,
            }
        }
    }

    /// Derives a cancellable child context.
    ///
    /// The child's [`done`](Context::done) signal fires once
    /// [`CancelHandle::cancel`] is called on its handle or on the handle of
    /// any enclosing cancellable context. Dropping the handle without
    /// cancelling leaves the context live.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let scope = Scope::new();
        if let Some(parent) = &self.node.scope {
            parent.adopt(&scope);
        }
        let ctx = Self {
            node: Arc::new(Node {
                kind: Kind::Cancel {
                    parent: self.clone(),
                },
                scope: Some(Arc::clone(&scope)),
            }),
        };
        (ctx, CancelHandle { scope })
    }

    /// Receiver that becomes ready (disconnected) once this context is done.
    ///
    /// Background contexts return a receiver that never becomes ready.
    /// Cancelling an enclosing scope cancels every scope derived from it, so
    /// the receiver also fires when an ancestor is cancelled.
    #[must_use]
    pub fn done(&self) -> Receiver<()> {
        match &self.node.scope {
            Some(scope) => scope.done.clone(),
            None => crossbeam_channel::never(),
        }
    }

    /// True once this context or any ancestor has been cancelled.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.node
            .scope
            .as_ref()
            .is_some_and(|scope| scope.is_cancelled())
    }

    /// True for contexts rooted in [`Context::todo`].
    #[must_use]
    pub fn is_todo(&self) -> bool {
        let mut cursor = self;
        loop {
            match &cursor.node.kind {
                Kind::Root { todo } => return *todo,
                Kind::Value { parent, .. } | Kind::Cancel { parent } => cursor = parent,
            }
        }
    }

    fn depth(&self) -> usize {
        let mut n = 0;
        let mut cursor = self;
        while let Kind::Value { parent, .. } | Kind::Cancel { parent } = &cursor.node.kind {
            n += 1;
            cursor = parent;
        }
        n
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("todo", &self.is_todo())
            .field("bindings", &self.depth())
            .field("cancellable", &self.node.scope.is_some())
            .finish()
    }
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Clone)]
pub struct CancelHandle {
    scope: Arc<Scope>,
}

impl CancelHandle {
    /// Closes the done signal of this scope and of every scope derived from
    /// it. Idempotent.
    pub fn cancel(&self) {
        self.scope.cancel();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.scope.is_cancelled())
            .finish()
    }
}

/// Rewrites a context, usually by binding additional values.
pub trait ContextDecorator: Send + Sync {
    fn decorate(&self, ctx: &Context) -> Context;
}

impl<F> ContextDecorator for F
where
    F: Fn(&Context) -> Context + Send + Sync,
{
    fn decorate(&self, ctx: &Context) -> Context {
        self(ctx)
    }
}

/// Ordered list of context decorators.
///
/// Decorators are applied first-to-last, each one receiving the output of
/// the previous one. Note that marshaler decorators compose the other way
/// around (see [`crate::core::encoding::MarshalerDecorators`]).
#[derive(Clone, Default)]
pub struct ContextDecorators(Vec<Arc<dyn ContextDecorator>>);

impl ContextDecorators {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, d: Arc<dyn ContextDecorator>) {
        self.0.push(d);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Arc<dyn ContextDecorator>>) {
        self.0.extend(other);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ContextDecorator>> {
        self.0.iter()
    }

    /// Applies every decorator in order.
    #[must_use]
    pub fn decorate(&self, ctx: &Context) -> Context {
        let mut ctx = ctx.clone();
        for d in &self.0 {
            ctx = d.decorate(&ctx);
        }
        ctx
    }
}

impl From<Vec<Arc<dyn ContextDecorator>>> for ContextDecorators {
    fn from(v: Vec<Arc<dyn ContextDecorator>>) -> Self {
        Self(v)
    }
}

impl fmt::Debug for ContextDecorators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextDecorators({})", self.0.len())
    }
}

/// Decorator that returns the context unmodified.
#[must_use]
pub fn no_decorator() -> Arc<dyn ContextDecorator> {
    Arc::new(|c: &Context| c.clone())
}

/// Decorator that binds `value` under `K`.
#[must_use]
pub fn new_decorator<K: ContextKey>(value: K::Value) -> Arc<dyn ContextDecorator> {
    Arc::new(move |c: &Context| c.with_value::<K>(value.clone()))
}

/// Produces a fresh context per log event. Must be safe to call
/// concurrently and never fails.
pub type Getter = Arc<dyn Fn() -> Context + Send + Sync>;

/// The default getter: a background context per call.
#[must_use]
pub fn background_getter() -> Getter {
    Arc::new(Context::background)
}

/// Wraps `getter` so that every produced context is run through `decorators`.
#[must_use]
pub fn new_getter(getter: Getter, decorators: ContextDecorators) -> Getter {
    if decorators.is_empty() {
        return getter;
    }
    Arc::new(move || decorators.decorate(&getter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Foo;
    impl ContextKey for Foo {
        type Value = String;
    }

    struct Bar;
    impl ContextKey for Bar {
        type Value = String;
    }

    struct Count;
    impl ContextKey for Count {
        type Value = u32;
    }

    #[test]
    fn test_background_has_no_values() {
        let ctx = Context::background();
        assert!(ctx.value::<Foo>().is_none());
        assert!(!ctx.is_done());
        assert!(!ctx.is_todo());
        assert!(Context::todo().is_todo());
    }

    #[test]
    fn test_with_value_does_not_modify_parent() {
        let root = Context::background();
        let a = root.with_value::<Foo>("foo".into());
        let b = a.with_value::<Bar>("bar".into());

        assert_eq!(b.value::<Foo>().as_deref(), Some("foo"));
        assert_eq!(b.value::<Bar>().as_deref(), Some("bar"));
        assert!(a.value::<Bar>().is_none());
        assert!(root.value::<Foo>().is_none());
    }

    #[test]
    fn test_distinct_keys_with_equal_values() {
        let ctx = Context::background().with_value::<Foo>("same".into());
        assert!(ctx.value::<Bar>().is_none());
    }

    #[test]
    fn test_nearest_binding_wins() {
        let ctx = Context::background()
            .with_value::<Count>(1)
            .with_value::<Count>(2);
        assert_eq!(ctx.value::<Count>(), Some(2));
    }

    #[test]
    fn test_cancel_signals_done() {
        let (ctx, cancel) = Context::background().with_cancel();
        let child = ctx.with_value::<Count>(7);
        assert!(!child.is_done());
        assert!(child.done().try_recv().is_err());

        cancel.cancel();
        assert!(child.is_done());
        assert!(matches!(
            child.done().try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        ));
        // value lookups still cross the cancel scope
        assert_eq!(child.value::<Count>(), Some(7));
    }

    #[test]
    fn test_dropping_handle_does_not_cancel() {
        let (ctx, cancel) = Context::background().with_cancel();
        drop(cancel);
        assert!(!ctx.is_done());
        assert!(matches!(
            ctx.done().try_recv(),
            Err(crossbeam_channel::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_cancel_reaches_nested_scopes() {
        let (parent, cancel) = Context::background().with_cancel();
        let (child, _child_cancel) = parent.with_value::<Count>(1).with_cancel();
        let (grandchild, _grandchild_cancel) = child.with_cancel();

        cancel.cancel();
        for ctx in [&parent, &child, &grandchild] {
            assert!(ctx.is_done());
            assert!(matches!(
                ctx.done().try_recv(),
                Err(crossbeam_channel::TryRecvError::Disconnected)
            ));
        }
    }

    #[test]
    fn test_cancel_child_leaves_parent_live() {
        let (parent, _cancel) = Context::background().with_cancel();
        let (child, child_cancel) = parent.with_cancel();

        child_cancel.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[test]
    fn test_deriving_from_cancelled_scope_is_done() {
        let (parent, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let (child, _child_cancel) = parent.with_cancel();
        assert!(child.is_done());
        assert!(matches!(
            child.done().try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_decorators_apply_in_order() {
        let mut dd = ContextDecorators::new();
        dd.push(new_decorator::<Count>(1));
        dd.push(Arc::new(|c: &Context| {
            let n = c.value::<Count>().unwrap_or(0);
            c.with_value::<Count>(n * 10)
        }));
        dd.push(no_decorator());

        let ctx = dd.decorate(&Context::background());
        assert_eq!(ctx.value::<Count>(), Some(10));
    }

    #[test]
    fn test_new_getter_decorates_each_context() {
        let mut dd = ContextDecorators::new();
        dd.push(new_decorator::<Foo>("foo".into()));
        let getter = new_getter(background_getter(), dd);
        assert_eq!(getter().value::<Foo>().as_deref(), Some("foo"));
        assert_eq!(getter().value::<Foo>().as_deref(), Some("foo"));
    }
}
