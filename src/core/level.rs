//! Log levels, level filters and per-level logger transforms

use super::context::{Context, ContextKey};
use super::encoding::{self, MarshalerDecorator};
use super::logger::{self, Logger, LoggerDecorator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use std::sync::Arc;

/// Event severity.
///
/// Each discriminant is a distinct bit, and the bits increase with
/// severity, so the derived ordering, `index()` and `mask()` all agree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[repr(u8)]
pub enum Level {
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 4,
    Error = 8,
    Fatal = 16,
    Panic = 32,
}

impl Level {
    /// Every level, least severe first.
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Panic,
    ];

    /// Ordinal position, 0 for Debug through 5 for Panic.
    #[must_use]
    pub fn index(self) -> usize {
        (self as u8).trailing_zeros() as usize
    }

    #[must_use]
    pub fn mask(self) -> LevelMask {
        LevelMask(self as u8)
    }

    /// One-letter code written by the level annotator.
    #[must_use]
    pub fn code(self) -> &'static [u8] {
        match self {
            Level::Debug => b"D",
            Level::Info => b"I",
            Level::Warn => b"W",
            Level::Error => b"E",
            Level::Fatal => b"F",
            Level::Panic => b"P",
        }
    }

    pub fn to_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Panic => "PANIC",
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Debug => Blue,
            Level::Info => Green,
            Level::Warn => Yellow,
            Level::Error => Red,
            Level::Fatal => BrightRed,
            Level::Panic => Magenta,
        }
    }

    /// Prefix decorator that writes this level's code, whatever level the
    /// event context carries.
    #[must_use]
    pub fn annotated(self) -> Arc<dyn MarshalerDecorator> {
        let code = self.code();
        encoding::prefix(move |_| encoding::singular(code))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "FATAL" => Ok(Level::Fatal),
            "PANIC" => Ok(Level::Panic),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// A set of levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LevelMask(u8);

impl LevelMask {
    pub const NONE: LevelMask = LevelMask(0);
    pub const ALL: LevelMask = LevelMask(0b11_1111);

    #[must_use]
    pub fn contains(self, level: Level) -> bool {
        self.0 & level as u8 != 0
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl From<Level> for LevelMask {
    fn from(level: Level) -> Self {
        level.mask()
    }
}

impl BitOr for Level {
    type Output = LevelMask;

    fn bitor(self, rhs: Level) -> LevelMask {
        LevelMask(self as u8 | rhs as u8)
    }
}

impl BitOr<Level> for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: Level) -> LevelMask {
        LevelMask(self.0 | rhs as u8)
    }
}

impl BitOr for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LevelMask) -> LevelMask {
        LevelMask(self.0 | rhs.0)
    }
}

/// Level predicate.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(Level) -> bool + Send + Sync>);

impl Filter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Level) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    #[must_use]
    pub fn matches(&self, level: Level) -> bool {
        (self.0)(level)
    }

    #[must_use]
    pub fn or(self, other: Filter) -> Filter {
        or(Some(self), Some(other))
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Filter {
        and(Some(self), Some(other))
    }

    #[must_use]
    pub fn xor(self, other: Filter) -> Filter {
        xor(Some(self), Some(other))
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter")
    }
}

/// Collapses a combination where one side is absent: both absent accepts
/// everything, one absent yields the other.
fn reduce(a: Option<Filter>, b: Option<Filter>) -> Result<Filter, (Filter, Filter)> {
    match (a, b) {
        (None, None) => Ok(Filter::accept_all()),
        (Some(f), None) | (None, Some(f)) => Ok(f),
        (Some(a), Some(b)) => Err((a, b)),
    }
}

pub fn or(a: Option<Filter>, b: Option<Filter>) -> Filter {
    reduce(a, b).unwrap_or_else(|(a, b)| Filter::new(move |l| a.matches(l) || b.matches(l)))
}

pub fn and(a: Option<Filter>, b: Option<Filter>) -> Filter {
    reduce(a, b).unwrap_or_else(|(a, b)| Filter::new(move |l| a.matches(l) && b.matches(l)))
}

pub fn xor(a: Option<Filter>, b: Option<Filter>) -> Filter {
    reduce(a, b).unwrap_or_else(|(a, b)| Filter::new(move |l| a.matches(l) != b.matches(l)))
}

/// Accepts levels contained in `mask`.
pub fn match_any(mask: impl Into<LevelMask>) -> Filter {
    let mask = mask.into();
    Filter::new(move |l| mask.contains(l))
}

pub fn match_exact(level: Level) -> Filter {
    Filter::new(move |l| l == level)
}

pub fn match_at_or_above(level: Level) -> Filter {
    Filter::new(move |l| l >= level)
}

/// Rewrites the logger built for a level.
pub trait TransformOp: Send + Sync {
    fn apply(&self, level: Level, logs: Arc<dyn Logger>) -> (Level, Arc<dyn Logger>);
}

impl<F> TransformOp for F
where
    F: Fn(Level, Arc<dyn Logger>) -> (Level, Arc<dyn Logger>) + Send + Sync,
{
    fn apply(&self, level: Level, logs: Arc<dyn Logger>) -> (Level, Arc<dyn Logger>) {
        self(level, logs)
    }
}

/// Ordered list of transform operators, applied first to last.
#[derive(Clone, Default)]
pub struct TransformOps(Vec<Arc<dyn TransformOp>>);

impl TransformOps {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, op: Arc<dyn TransformOp>) {
        self.0.push(op);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Arc<dyn TransformOp>>) {
        self.0.extend(other);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn apply(&self, level: Level, logs: Arc<dyn Logger>) -> (Level, Arc<dyn Logger>) {
        self.0
            .iter()
            .fold((level, logs), |(level, logs), op| op.apply(level, logs))
    }
}

impl From<Vec<Arc<dyn TransformOp>>> for TransformOps {
    fn from(v: Vec<Arc<dyn TransformOp>>) -> Self {
        Self(v)
    }
}

impl fmt::Debug for TransformOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransformOps({})", self.0.len())
    }
}

/// Per-level logger decorators. Levels without an entry pass through.
#[derive(Clone, Default)]
pub struct Transform(HashMap<Level, Arc<dyn LoggerDecorator>>);

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, level: Level, d: Arc<dyn LoggerDecorator>) -> Self {
        self.0.insert(level, d);
        self
    }
}

impl TransformOp for Transform {
    fn apply(&self, level: Level, logs: Arc<dyn Logger>) -> (Level, Arc<dyn Logger>) {
        match self.0.get(&level) {
            Some(d) => (level, d.decorate(logs)),
            None => (level, logs),
        }
    }
}

/// Replaces the logger of every level below `min` with the null logger.
/// The decision is made once, when the per-level loggers are built.
pub fn min_transform(min: Level) -> Arc<dyn TransformOp> {
    accept(match_at_or_above(min))
}

/// Drops events of levels rejected by `filter`.
pub fn accept(filter: Filter) -> Arc<dyn TransformOp> {
    Arc::new(move |level: Level, logs: Arc<dyn Logger>| {
        if filter.matches(level) {
            (level, logs)
        } else {
            (level, logger::null())
        }
    })
}

/// Copies events of accepted levels to every logger in `loggers`.
///
/// With `replace` the original logger no longer receives those events; if
/// `loggers` is empty as well, accepted events are dropped. Rejected levels
/// pass through untouched.
pub fn broadcast(filter: Filter, replace: bool, loggers: Vec<Arc<dyn Logger>>) -> Arc<dyn TransformOp> {
    Arc::new(move |level: Level, logs: Arc<dyn Logger>| {
        if !filter.matches(level) {
            return (level, logs);
        }
        if replace {
            if loggers.is_empty() {
                return (level, logger::null());
            }
            return (level, logger::multi(loggers.clone()));
        }
        if loggers.is_empty() {
            return (level, logs);
        }
        let mut all = loggers.clone();
        all.push(logs);
        (level, logger::multi(all))
    })
}

/// Looks up the logger for a level.
pub trait Indexer {
    fn logger(&self, level: Level) -> Option<Arc<dyn Logger>>;
}

impl<F> Indexer for F
where
    F: Fn(Level) -> Option<Arc<dyn Logger>>,
{
    fn logger(&self, level: Level) -> Option<Arc<dyn Logger>> {
        self(level)
    }
}

/// Loggers keyed by level.
#[derive(Clone, Default)]
pub struct LevelMap(HashMap<Level, Arc<dyn Logger>>);

impl LevelMap {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Indexer for LevelMap {
    fn logger(&self, level: Level) -> Option<Arc<dyn Logger>> {
        self.0.get(&level).cloned()
    }
}

/// Builds a logger for each of `levels` (all levels when `None`), starting
/// from the logger `idx` provides and running it through `ops`. Levels the
/// indexer has no logger for are skipped.
pub fn new_indexer(idx: &dyn Indexer, levels: Option<&[Level]>, ops: &TransformOps) -> LevelMap {
    let levels = levels.unwrap_or(&Level::ALL);
    let mut map = HashMap::with_capacity(levels.len());
    for &level in levels {
        let Some(logs) = idx.logger(level) else {
            continue;
        };
        let (level, logs) = ops.apply(level, logs);
        map.insert(level, logs);
    }
    LevelMap(map)
}

/// Code written when an event carries no level.
pub const UNKNOWN_CODE: &[u8] = b"?";

/// Prefix decorator that writes the one-letter code of the event's level.
#[must_use]
pub fn annotator() -> Arc<dyn MarshalerDecorator> {
    encoding::prefix(|c| {
        encoding::singular(from_context(c).map_or(UNKNOWN_CODE, Level::code))
    })
}

struct LevelKey;

impl ContextKey for LevelKey {
    type Value = Level;
}

#[must_use]
pub fn new_context(ctx: &Context, level: Level) -> Context {
    ctx.with_value::<LevelKey>(level)
}

#[must_use]
pub fn from_context(ctx: &Context) -> Option<Level> {
    ctx.value::<LevelKey>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use parking_lot::Mutex;

    fn counter() -> (Arc<Mutex<usize>>, Arc<dyn Logger>) {
        let n = Arc::new(Mutex::new(0));
        let hits = Arc::clone(&n);
        let logs: Arc<dyn Logger> = Arc::new(move |_: &Context, _: &str, _: &[Value]| {
            *hits.lock() += 1;
        });
        (n, logs)
    }

    fn fire(logs: &Arc<dyn Logger>) {
        logs.logf(&Context::background(), "x", &[]);
    }

    #[test]
    fn test_bits_preserve_severity_order() {
        for pair in Level::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!((pair[0] as u8) < (pair[1] as u8));
            assert!(pair[0].index() < pair[1].index());
            assert!(pair[0].mask().bits() < pair[1].mask().bits());
        }
        for (i, l) in Level::ALL.iter().enumerate() {
            assert_eq!(l.index(), i);
            assert_eq!(l.mask().bits(), 1 << i);
        }
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes: std::collections::HashSet<_> = Level::ALL.iter().map(|l| l.code()).collect();
        assert_eq!(codes.len(), Level::ALL.len());
        assert_eq!(Level::Warn.code(), b"W");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("Panic".parse::<Level>().unwrap(), Level::Panic);
        assert!("trace".parse::<Level>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&Level::Error).unwrap();
        assert_eq!(json, "\"Error\"");
        assert_eq!(serde_json::from_str::<Level>(&json).unwrap(), Level::Error);
    }

    #[test]
    fn test_mask_filters() {
        let f = match_any(Level::Debug | Level::Error);
        assert!(f.matches(Level::Debug));
        assert!(f.matches(Level::Error));
        assert!(!f.matches(Level::Info));

        assert!(match_exact(Level::Warn).matches(Level::Warn));
        assert!(!match_exact(Level::Warn).matches(Level::Error));

        let above = match_at_or_above(Level::Error);
        assert!(!above.matches(Level::Warn));
        assert!(above.matches(Level::Error));
        assert!(above.matches(Level::Panic));
    }

    #[test]
    fn test_filter_combinators() {
        let debug = match_exact(Level::Debug);
        let low = match_any(Level::Debug | Level::Info);

        assert!(debug.clone().xor(low.clone()).matches(Level::Info));
        assert!(!debug.clone().xor(low.clone()).matches(Level::Debug));
        assert!(debug.clone().and(low.clone()).matches(Level::Debug));
        assert!(!debug.clone().and(low.clone()).matches(Level::Info));
        assert!(debug.clone().or(match_exact(Level::Panic)).matches(Level::Panic));

        assert!(or(None, None).matches(Level::Fatal));
        assert!(!and(Some(debug.clone()), None).matches(Level::Info));
        assert!(xor(None, Some(debug)).matches(Level::Debug));
    }

    #[test]
    fn test_min_transform_is_a_threshold() {
        let ops = TransformOps::from(vec![min_transform(Level::Warn)]);
        for level in Level::ALL {
            let (n, logs) = counter();
            let (out, logs) = ops.apply(level, logs);
            assert_eq!(out, level);
            fire(&logs);
            assert_eq!(*n.lock(), usize::from(level >= Level::Warn), "{level}");
        }
    }

    #[test]
    fn test_broadcast() {
        let (orig, orig_logs) = counter();
        let (copy, copy_logs) = counter();
        let op = broadcast(match_exact(Level::Error), false, vec![copy_logs.clone()]);

        let (_, logs) = op.apply(Level::Error, orig_logs.clone());
        fire(&logs);
        assert_eq!((*orig.lock(), *copy.lock()), (1, 1));

        let (_, logs) = op.apply(Level::Info, orig_logs.clone());
        fire(&logs);
        assert_eq!((*orig.lock(), *copy.lock()), (2, 1));

        let replace = broadcast(match_exact(Level::Error), true, vec![copy_logs]);
        let (_, logs) = replace.apply(Level::Error, orig_logs.clone());
        fire(&logs);
        assert_eq!((*orig.lock(), *copy.lock()), (2, 2));

        let drop_all = broadcast(match_exact(Level::Error), true, Vec::new());
        let (_, logs) = drop_all.apply(Level::Error, orig_logs);
        fire(&logs);
        assert_eq!(*orig.lock(), 2);
    }

    #[test]
    fn test_transform_map_and_indexer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = {
            let seen = Arc::clone(&seen);
            move |level: Level| -> Option<Arc<dyn Logger>> {
                if level == Level::Panic {
                    return None;
                }
                let seen = Arc::clone(&seen);
                Some(Arc::new(move |_: &Context, m: &str, _: &[Value]| {
                    seen.lock().push(format!("{level}:{m}"));
                }))
            }
        };

        let shout = Transform::new().with(
            Level::Error,
            Arc::new(|inner: Arc<dyn Logger>| -> Arc<dyn Logger> {
                Arc::new(move |c: &Context, m: &str, a: &[Value]| {
                    inner.logf(c, &m.to_uppercase(), a)
                })
            }),
        );
        let ops = TransformOps::from(vec![Arc::new(shout) as Arc<dyn TransformOp>]);
        let idx = new_indexer(&base, None, &ops);
        assert_eq!(idx.len(), 5);
        assert!(idx.logger(Level::Panic).is_none());

        idx.logger(Level::Info).unwrap().logf(&Context::background(), "hi", &[]);
        idx.logger(Level::Error).unwrap().logf(&Context::background(), "oops", &[]);
        assert_eq!(*seen.lock(), vec!["INFO:hi", "ERROR:OOPS"]);

        let subset = new_indexer(&base, Some(&[Level::Debug]), &TransformOps::new());
        assert_eq!(subset.len(), 1);
    }

    #[test]
    fn test_level_context() {
        let ctx = new_context(&Context::background(), Level::Fatal);
        assert_eq!(from_context(&ctx), Some(Level::Fatal));
        assert_eq!(from_context(&Context::background()), None);
    }
}
