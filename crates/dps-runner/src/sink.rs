//! Concrete `SnapshotSink`/`MetricsSink`: newline-delimited JSON on stdout.
//! A websocket or message-bus sink plugs in at the same boundary; the core
//! never constructs one itself (spec §9, "callback-driven output").

use serde_json::json;
use slog::Logger;

use dps_engine::{EngineMetrics, MetricsSink, Snapshot, SnapshotKind, SnapshotSink};

pub struct StdoutSnapshotSink {
    log: Logger,
}

impl StdoutSnapshotSink {
    pub fn new(log: Logger) -> StdoutSnapshotSink {
        StdoutSnapshotSink { log }
    }
}

impl SnapshotSink for StdoutSnapshotSink {
    fn emit(&mut self, snapshot: &Snapshot, kind: SnapshotKind) {
        let kind_str = match kind {
            SnapshotKind::Tick => "tick",
            SnapshotKind::Summary => "summary",
        };
        match serde_json::to_string(snapshot) {
            Ok(body) => println!(r#"{{"kind":"{kind_str}","snapshot":{body}}}"#),
            Err(err) => slog::error!(self.log, "failed to serialize snapshot"; "error" => %err),
        }
    }
}

pub struct StdoutMetricsSink {
    log: Logger,
}

impl StdoutMetricsSink {
    pub fn new(log: Logger) -> StdoutMetricsSink {
        StdoutMetricsSink { log }
    }
}

impl MetricsSink for StdoutMetricsSink {
    fn emit(&mut self, metrics: &EngineMetrics) {
        slog::debug!(
            self.log,
            "engine metrics";
            "channel_size" => metrics.channel_size,
            "channel_dropped" => metrics.channel_dropped,
            "flows" => metrics.assembler_sizes.len(),
        );
        let payload = json!({
            "kind": "metrics",
            "channel_size": metrics.channel_size,
            "channel_dropped": metrics.channel_dropped,
            "assembler_sizes": metrics.assembler_sizes,
        });
        println!("{payload}");
    }
}
