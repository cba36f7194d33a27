#![allow(clippy::new_without_default)]

//! Packet-to-statistics pipeline: capture channel, per-flow assembler, frame
//! decoder, in-memory storage, dispatcher, and aggregator. `dps-runner`
//! composes these into the five-thread process described in the ambient
//! configuration; this crate has no knowledge of how packets actually arrive
//! or where snapshots actually go.

pub mod aggregator;
pub mod assembler;
pub mod buffer;
pub mod catalog;
pub mod channel;
pub mod decode;
pub mod dispatcher;
pub mod interfaces;
pub mod storage;
pub mod types;

pub use aggregator::{compute as compute_snapshot, Snapshot};
pub use assembler::Assembler;
pub use catalog::{ActorClass, Catalog};
pub use channel::{CapturedPayload, Channel};
pub use dispatcher::Dispatcher;
pub use interfaces::{
    Command, CommandSource, EngineMetrics, MetricsSink, PacketSource, SnapshotKind, SnapshotSink,
};
pub use storage::{Storage, StorageSnapshot};
