//! JSON-lines marshaler
//!
//! Renders each event as a single-line JSON object, compatible with log
//! aggregation tools like ELK or Loki:
//!
//! ```text
//! {"level":"WARN","timestamp":"2025-01-08T10:30:45.123Z","caller":{...},"message":"x=7"}
//! ```
//!
//! Absent level, timestamp or caller information is omitted. Pair it with a
//! text stream to get one object per line.

use super::caller::{self, Caller};
use super::context::Context;
use super::encoding::Marshaler;
use super::error::Result;
use super::format;
use super::level::{self, Level};
use super::stream::Stream;
use super::timestamp::{self, TimestampFormat};
use super::value::Value;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caller: Option<Caller>,
    message: &'a str,
}

struct JsonMarshaler {
    timestamps: TimestampFormat,
}

impl JsonMarshaler {
    /// Numeric formats are emitted as JSON numbers.
    fn render_time(&self, at: &DateTime<Utc>) -> serde_json::Value {
        let text = self.timestamps.format(at);
        if self.timestamps.is_numeric() {
            if let Ok(n) = text.parse::<i64>() {
                return n.into();
            }
        }
        serde_json::Value::String(text)
    }
}

impl Marshaler for JsonMarshaler {
    fn marshal(
        &self,
        ctx: &Context,
        stream: &mut dyn Stream,
        message: &str,
        args: &[Value],
    ) -> Result<()> {
        let rendered = format::render(message, args);
        let record = JsonRecord {
            level: level::from_context(ctx),
            timestamp: timestamp::from_context(ctx).map(|t| self.render_time(&t)),
            caller: caller::from_context(ctx),
            message: &rendered,
        };
        let status: Result<()> = serde_json::to_vec(&record)
            .map_err(Into::into)
            .and_then(|json| stream.write_all(&json));
        stream.eom(status)
    }
}

/// JSON marshaler with ISO-8601 timestamps.
#[must_use]
pub fn json_marshaler() -> Arc<dyn Marshaler> {
    json_marshaler_with(TimestampFormat::default())
}

#[must_use]
pub fn json_marshaler_with(timestamps: TimestampFormat) -> Arc<dyn Marshaler> {
    Arc::new(JsonMarshaler { timestamps })
}
