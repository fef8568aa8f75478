//! Property-based tests for rust_log_facade using proptest

use parking_lot::Mutex;
use proptest::prelude::*;
use rust_log_facade::core::context::ContextKey;
use rust_log_facade::core::format;
use rust_log_facade::core::redact;
use rust_log_facade::prelude::*;
use rust_log_facade::streams::{read_record, BufferedStream, RecordStream};
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warn),
        Just(Level::Error),
        Just(Level::Fatal),
        Just(Level::Panic),
    ]
}

struct Slot;

impl ContextKey for Slot {
    type Value = i64;
}

struct OtherSlot;

impl ContextKey for OtherSlot {
    type Value = i64;
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Parsing the canonical name yields the same level
    #[test]
    fn test_level_str_roundtrip(level in any_level()) {
        let parsed: Level = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        let lower: Level = level.to_str().to_lowercase().parse().unwrap();
        prop_assert_eq!(level, lower);
    }

    /// Ordering, index and bit value agree
    #[test]
    fn test_level_ordering_matches_bits(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, (a as u8) < (b as u8));
        prop_assert_eq!(a < b, a.index() < b.index());
        prop_assert_eq!(a.mask().bits(), 1u8 << a.index());
    }

    /// Masks built from levels contain exactly those levels
    #[test]
    fn test_mask_membership(a in any_level(), b in any_level(), probe in any_level()) {
        let mask = a | b;
        prop_assert_eq!(mask.contains(probe), probe == a || probe == b);
    }
}

// ============================================================================
// Threshold Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// An event reaches the sink iff its level is at or above the threshold
    #[test]
    fn test_threshold_filtering(min in any_level(), at in any_level()) {
        let hits = Arc::new(Mutex::new(0usize));
        let counted = Arc::clone(&hits);
        let logs: Arc<dyn Logger> = Arc::new(move |_: &Context, _: &str, _: &[Value]| {
            *counted.lock() += 1;
        });
        let (iface, _) = Config::default().with([
            ConfigOption::logger(logs),
            ConfigOption::Level(min),
            ConfigOption::Exit(Some(no_exit())),
            ConfigOption::Panic(Some(no_panic())),
        ]);

        let _ = iface.logf(at, "event", &[]);

        prop_assert_eq!(*hits.lock(), usize::from(at >= min));
    }

    /// Applying an option and then its inverse restores the original level
    #[test]
    fn test_option_inverse_restores_level(first in any_level(), second in any_level()) {
        let mut cfg = Config::default();
        let _ = cfg.apply([ConfigOption::Level(first)]);
        let undo = cfg.apply([ConfigOption::Level(second), ConfigOption::Annotate(false)]);
        let _ = cfg.apply([undo]);
        prop_assert_eq!(cfg.level, first);
        prop_assert!(cfg.annotate);
    }
}

// ============================================================================
// Context Tests
// ============================================================================

proptest! {
    /// Derived contexts never change their parent
    #[test]
    fn test_with_value_leaves_parent(a in any::<i64>(), b in any::<i64>()) {
        let parent = Context::background().with_value::<Slot>(a);
        let child = parent.with_value::<Slot>(b);
        prop_assert_eq!(parent.value::<Slot>(), Some(a));
        prop_assert_eq!(child.value::<Slot>(), Some(b));
    }

    /// Keys with the same value type never alias
    #[test]
    fn test_keys_do_not_alias(a in any::<i64>()) {
        let ctx = Context::background().with_value::<Slot>(a);
        prop_assert_eq!(ctx.value::<OtherSlot>(), None);
        prop_assert_eq!(ctx.with_value::<OtherSlot>(a).value::<Slot>(), Some(a));
    }
}

// ============================================================================
// Stream Tests
// ============================================================================

proptest! {
    /// Every payload written to a record stream reads back unchanged
    #[test]
    fn test_record_stream_preserves_payloads(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..400), 1..8)
    ) {
        let mut s = RecordStream::new(Vec::new());
        for p in &payloads {
            s.write_all(p).unwrap();
            s.eom(Ok(())).unwrap();
        }

        let data = s.into_inner();
        let mut reader = data.as_slice();
        let mut decoded = Vec::new();
        while let Some(r) = read_record(&mut reader).unwrap() {
            decoded.push(r);
        }
        prop_assert_eq!(decoded, payloads);
    }

    /// Each event delivered by a buffered stream holds only its own writes
    #[test]
    fn test_buffered_stream_resets_between_events(
        events in prop::collection::vec("[a-z]{0,12}", 1..10)
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut s = BufferedStream::with_callback(move |buf, status| {
            sink.lock().push(buf.to_string());
            status
        });
        for (i, e) in events.iter().enumerate() {
            s.write_all(e.as_bytes()).unwrap();
            // every other event fails; the buffer must still be cleared
            let status = if i % 2 == 0 {
                Ok(())
            } else {
                Err(LoggerError::other("failed"))
            };
            let _ = s.eom(status);
        }
        prop_assert_eq!(&*seen.lock(), &events);
        prop_assert!(s.pending().is_empty());
    }
}

// ============================================================================
// Formatting Tests
// ============================================================================

proptest! {
    /// Templates without verbs render verbatim
    #[test]
    fn test_plain_template_is_verbatim(msg in "[a-zA-Z0-9 .,:;]{1,64}") {
        prop_assert_eq!(format::render(&msg, &[]), msg);
    }

    /// Integer verbs agree with Rust's own formatting
    #[test]
    fn test_int_verbs(n in any::<i64>()) {
        prop_assert_eq!(format::sprintf("%d", &[Value::from(n)]), n.to_string());
        prop_assert_eq!(format::sprintf("%x", &[Value::from(n.unsigned_abs())]), format!("{:x}", n.unsigned_abs()));
    }

    /// Masking keeps length and separators
    #[test]
    fn test_mask_preserves_shape(raw in "[0-9a-z -]{0,32}") {
        let masked = redact::mask(&raw);
        prop_assert_eq!(masked.chars().count(), raw.chars().count());
        for (m, r) in masked.chars().zip(raw.chars()) {
            if r.is_alphanumeric() {
                prop_assert_eq!(m, '*');
            } else {
                prop_assert_eq!(m, r);
            }
        }
    }
}
