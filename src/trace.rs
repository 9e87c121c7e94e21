//! Trace Emitter: turns a per-permission decision into a
//! structured event and hands it to a configured sink. Emission is always
//! best-effort — a sink failure is swallowed, never surfaced to the caller,
//! because tracing must never perturb the decision path.

use std::io::Write;

use parking_lot::Mutex;
use serde::Serialize;

pub const SCHEMA: &str = "warden.trace.v1";
pub const EVENT_TYPE: &str = "authz.check";

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub permission: String,
    pub method: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionInfo {
    pub allow: bool,
    pub reason: String,
    pub evaluator: &'static str,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub schema: &'static str,
    pub event_type: &'static str,
    /// RFC3339 timestamp at nanosecond precision.
    pub timestamp: String,
    pub actor: String,
    pub target: String,
    pub action: Action,
    pub decision: DecisionInfo,
}

/// A destination for trace events. Implementations must not panic or block
/// meaningfully — they run inline with the decision path.
pub trait TraceSink: Send + Sync {
    fn emit(&self, event: &TraceEvent);
}

/// The default sink: tracing is disabled, events are dropped.
pub struct NullSink;

impl TraceSink for NullSink {
    fn emit(&self, _event: &TraceEvent) {}
}

/// Emits one JSON object per line via `tracing::info!`, under the
/// `warden::trace` target, matching this codebase's target-tagged logging
/// convention.
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, event: &TraceEvent) {
        match serde_json::to_string(event) {
            Ok(line) => tracing::info!(target: "warden::trace", "{line}"),
            Err(e) => tracing::debug!(target: "warden::trace", "failed to serialize trace event: {e}"),
        }
    }
}

/// Emits one JSON object per line to an arbitrary writer (e.g. a file or an
/// in-memory buffer in tests). Write failures are swallowed.
pub struct JsonlSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }
}

impl<W: Write + Send> TraceSink for JsonlSink<W> {
    fn emit(&self, event: &TraceEvent) {
        let Ok(line) = serde_json::to_string(event) else { return };
        let mut w = self.writer.lock();
        let _ = writeln!(w, "{line}");
    }
}

/// Emits `event` to `sink` unless tracing is disabled for this call.
pub fn emit(sink: &dyn TraceSink, enabled: bool, event: TraceEvent) {
    if enabled {
        sink.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> TraceEvent {
        TraceEvent {
            schema: SCHEMA,
            event_type: EVENT_TYPE,
            timestamp: "2026-01-01T00:00:00.000000000Z".to_string(),
            actor: "user:a@example.com".to_string(),
            target: "projects/p/secrets/s".to_string(),
            action: Action { permission: "secretmanager.versions.access".to_string(), method: "TestPermissions" },
            decision: DecisionInfo { allow: true, reason: "matched binding".to_string(), evaluator: "warden.engine", latency_ms: 0.01 },
        }
    }

    #[test]
    fn disabled_tracing_emits_nothing() {
        let buf: Vec<u8> = Vec::new();
        let sink = JsonlSink::new(buf);
        emit(&sink, false, sample_event());
        assert!(sink.writer.lock().is_empty());
    }

    #[test]
    fn enabled_tracing_writes_one_json_line() {
        let buf: Vec<u8> = Vec::new();
        let sink = JsonlSink::new(buf);
        emit(&sink, true, sample_event());
        let contents = sink.writer.lock().clone();
        let text = String::from_utf8(contents).unwrap();
        assert_eq!(text.lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(parsed["schema"], SCHEMA);
        assert_eq!(parsed["decision"]["allow"], true);
    }

    #[test]
    fn null_sink_never_panics() {
        emit(&NullSink, true, sample_event());
    }
}
