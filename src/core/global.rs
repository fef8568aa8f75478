//! Process-wide logging interface
//!
//! The top-level logging functions and macros dispatch to the interface
//! held here. It starts out built from [`Config::default`] and can be
//! replaced wholesale, reconfigured through [`configure`], or temporarily
//! overridden with an [`OverrideGuard`] that restores the previous state
//! when dropped.
//!
//! # Example
//!
//! ```
//! use rust_log_facade::core::config::ConfigOption;
//! use rust_log_facade::core::{global, Level};
//!
//! {
//!     let _guard = global::override_with([ConfigOption::Level(Level::Error)]);
//!     global::infof("suppressed", &[]);
//! }
//! // the previous configuration is back in effect here
//! ```

use super::caller::CallSite;
use super::config::{Action, Config, ConfigOption, Interface};
use super::context::Context;
use super::level::Level;
use super::value::Value;
use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};

struct Global {
    config: Config,
    current: Arc<Interface>,
}

static GLOBAL: LazyLock<RwLock<Global>> = LazyLock::new(|| {
    let config = Config::default();
    let current = Arc::new(config.build());
    RwLock::new(Global { config, current })
});

/// The interface currently serving the top-level calls.
#[must_use]
pub fn current() -> Arc<Interface> {
    Arc::clone(&GLOBAL.read().current)
}

/// Installs `iface` directly, returning the previous one. The default
/// config is not consulted or changed.
pub fn replace(iface: Interface) -> Arc<Interface> {
    std::mem::replace(&mut GLOBAL.write().current, Arc::new(iface))
}

/// A copy of the process-wide default config.
#[must_use]
pub fn config() -> Config {
    GLOBAL.read().config.clone()
}

/// Applies `opts` to the process-wide config, rebuilds the current
/// interface from it and returns the option that reverts the change.
pub fn configure(opts: impl IntoIterator<Item = ConfigOption>) -> ConfigOption {
    let mut global = GLOBAL.write();
    let undo = global.config.apply(opts);
    global.current = Arc::new(global.config.build());
    undo
}

/// Restores the process-wide config when dropped.
///
/// # Example
///
/// ```
/// use rust_log_facade::core::config::{no_exit, ConfigOption};
/// use rust_log_facade::core::global;
///
/// let _guard = global::override_with([ConfigOption::Exit(Some(no_exit()))]);
/// let _ = global::fatalf("not exiting in this scope", &[]);
/// ```
#[must_use = "the override is reverted as soon as the guard is dropped"]
pub struct OverrideGuard {
    undo: Option<ConfigOption>,
}

impl OverrideGuard {
    /// Keeps the override in place permanently.
    pub fn forget(mut self) {
        self.undo = None;
    }
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            let _ = configure([undo]);
        }
    }
}

/// Like [`configure`], reverting once the returned guard drops.
pub fn override_with(opts: impl IntoIterator<Item = ConfigOption>) -> OverrideGuard {
    OverrideGuard {
        undo: Some(configure(opts)),
    }
}

#[track_caller]
pub fn logf(level: Level, message: &str, args: &[Value]) -> Action {
    current().logf(level, message, args)
}

#[track_caller]
pub fn logf_ctx(level: Level, ctx: &Context, message: &str, args: &[Value]) -> Action {
    current().logf_ctx(level, ctx, message, args)
}

/// Entry point for the logging macros, which supply their own call site.
#[doc(hidden)]
pub fn logf_at(level: Level, site: CallSite, message: &str, args: &[Value]) -> Action {
    current().logf_site(level, site, message, args)
}

#[track_caller]
pub fn debugf(message: &str, args: &[Value]) {
    current().debugf(message, args)
}

#[track_caller]
pub fn infof(message: &str, args: &[Value]) {
    current().infof(message, args)
}

#[track_caller]
pub fn warnf(message: &str, args: &[Value]) {
    current().warnf(message, args)
}

#[track_caller]
pub fn errorf(message: &str, args: &[Value]) {
    current().errorf(message, args)
}

#[track_caller]
pub fn fatalf(message: &str, args: &[Value]) -> Action {
    current().fatalf(message, args)
}

#[track_caller]
pub fn panicf(message: &str, args: &[Value]) -> Action {
    current().panicf(message, args)
}

#[track_caller]
pub fn debug(args: &[Value]) {
    current().debug(args)
}

#[track_caller]
pub fn info(args: &[Value]) {
    current().info(args)
}

#[track_caller]
pub fn warn(args: &[Value]) {
    current().warn(args)
}

#[track_caller]
pub fn error(args: &[Value]) {
    current().error(args)
}

#[track_caller]
pub fn fatal(args: &[Value]) -> Action {
    current().fatal(args)
}

#[track_caller]
pub fn panic(args: &[Value]) -> Action {
    current().panic(args)
}
