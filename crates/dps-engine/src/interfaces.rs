//! Trait boundaries `dps-runner` plugs concrete transports into (spec §5.1).
//! The core never blocks on, owns, or knows about sockets, a control
//! channel, or a websocket — it only calls through these traits.

use std::collections::HashMap;

use dps_common::CaptureError;

use crate::channel::CapturedPayload;
use crate::aggregator::Snapshot;

/// Adapter over the real packet source (device selection, decryption, OS
/// capture APIs are all out of scope). Blocks the capture thread; yields
/// payloads or a fatal error (error kind 8).
pub trait PacketSource: Send {
    fn next_payload(&mut self) -> Result<CapturedPayload, CaptureError>;
    fn stop(&mut self);
}

/// Commands delivered by the outer layer (spec §6 "Command surface").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    Quit,
}

pub trait CommandSource: Send {
    fn try_recv(&mut self) -> Option<Command>;
}

/// Which occasion produced a [`Snapshot`]: a regular aggregator tick, or the
/// final rollup emitted synchronously by the Reset API (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Tick,
    Summary,
}

/// Emits one structured snapshot per Aggregator tick, or a final "summary"
/// snapshot from the Reset API. The core does not own the transport (spec
/// §9, "callback-driven output").
pub trait SnapshotSink: Send {
    fn emit(&mut self, snapshot: &Snapshot, kind: SnapshotKind);
}

/// Process/queue metrics, polled at ~1s cadence by the metrics thread.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub channel_size: usize,
    pub channel_dropped: u64,
    pub assembler_sizes: HashMap<String, usize>,
}

pub trait MetricsSink: Send {
    fn emit(&mut self, metrics: &EngineMetrics);
}
