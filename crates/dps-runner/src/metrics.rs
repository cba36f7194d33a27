//! Process/queue metrics (spec §5: "polls process CPU/RSS and assembler/
//! channel sizes at ~1s cadence"). CPU/RSS sampling is platform-specific and
//! out of scope (spec §1, "process self-metrics"); this reads only the
//! sizes the engine itself can report.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dps_engine::{Channel, EngineMetrics};

/// Snapshots channel occupancy and the dispatcher's published per-flow
/// assembler sizes. Owned entirely by the metrics thread.
pub struct ProcessMetricsSource {
    channel: Channel,
    assembler_sizes: Arc<Mutex<HashMap<String, usize>>>,
}

impl ProcessMetricsSource {
    pub fn new(channel: Channel, assembler_sizes: Arc<Mutex<HashMap<String, usize>>>) -> Self {
        ProcessMetricsSource {
            channel,
            assembler_sizes,
        }
    }

    pub fn sample(&self) -> EngineMetrics {
        EngineMetrics {
            channel_size: self.channel.size(),
            channel_dropped: self.channel.dropped_count(),
            assembler_sizes: self.assembler_sizes.lock().unwrap().clone(),
        }
    }
}
