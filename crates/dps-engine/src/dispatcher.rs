//! Dispatcher (spec §4.2): owns the set of active per-flow Assemblers and
//! drains the Channel.

use std::collections::HashMap;

use slog::Logger;

use crate::assembler::{Assembler, MAGIC};
use crate::channel::{CapturedPayload, Channel};
use crate::decode::on_packet_received;
use crate::storage::Storage;

/// Canonical flow identifier: `"{min(src,dst)}-{max(src,dst)}"`, port-pair
/// only, IPs ignored (spec §4.2).
fn flow_key(src_port: u16, dst_port: u16) -> String {
    let (lo, hi) = if src_port <= dst_port {
        (src_port, dst_port)
    } else {
        (dst_port, src_port)
    };
    format!("{lo}-{hi}")
}

fn contains_magic(payload: &[u8]) -> bool {
    payload.len() >= MAGIC.len() && payload.windows(MAGIC.len()).any(|w| w == MAGIC)
}

/// Owns per-flow assemblers and turns Channel payloads into Storage
/// writes. Not `Sync` by design: it is meant to be driven by exactly one
/// thread (spec §5, "Per-flow Assemblers are exclusive to the Dispatcher
/// thread").
pub struct Dispatcher {
    assemblers: HashMap<String, Assembler>,
    log: Logger,
    assembler_warn_bytes: usize,
    assembler_max_bytes: usize,
}

impl Dispatcher {
    pub fn new(log: Logger, assembler_warn_bytes: usize, assembler_max_bytes: usize) -> Dispatcher {
        Dispatcher {
            assemblers: HashMap::new(),
            log,
            assembler_warn_bytes,
            assembler_max_bytes,
        }
    }

    /// Drains every payload currently queued in `channel`, feeding each to
    /// its flow's assembler and running the decoder over every framed
    /// message that assembler produces.
    pub fn drain(&mut self, channel: &Channel, storage: &mut Storage) -> usize {
        let mut processed = 0usize;
        while let Some(payload) = channel.try_receive() {
            self.handle_payload(payload, storage);
            processed += 1;
        }
        processed
    }

    fn handle_payload(&mut self, payload: CapturedPayload, storage: &mut Storage) {
        let key = flow_key(payload.src_port, payload.dst_port);

        if !self.assemblers.contains_key(&key) {
            if !contains_magic(&payload.payload) {
                return;
            }
            let flow_log = self.log.new(slog::o!("flow" => key.clone()));
            self.assemblers.insert(
                key.clone(),
                Assembler::with_caps(flow_log, self.assembler_warn_bytes, self.assembler_max_bytes),
            );
        }

        let assembler = self
            .assemblers
            .get_mut(&key)
            .expect("just inserted or already present");
        let log = self.log.clone();
        assembler.process_chunk(&payload.payload, |frame| {
            on_packet_received(frame, storage, &log);
        });
    }

    /// Discards all per-flow assembler buffers (part of the Reset API,
    /// spec §4.7).
    pub fn reset(&mut self) {
        for assembler in self.assemblers.values_mut() {
            assembler.stop();
        }
    }

    pub fn active_flow_count(&self) -> usize {
        self.assemblers.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.assemblers.values().map(|a| a.buffered_len()).sum()
    }

    /// Per-flow buffer occupancy, for the metrics thread's `EngineMetrics`.
    pub fn assembler_sizes(&self) -> HashMap<String, usize> {
        self.assemblers
            .iter()
            .map(|(key, assembler)| (key.clone(), assembler.buffered_len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn silent_log() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn flow_key_is_order_independent() {
        assert_eq!(flow_key(100, 200), "100-200");
        assert_eq!(flow_key(200, 100), "100-200");
    }

    #[test]
    fn ignores_flows_without_magic_until_sighted() {
        let mut dispatcher = Dispatcher::new(silent_log(), 1024, 4096);
        let channel = Channel::new(16);
        let mut storage = Storage::new(Catalog::empty());

        channel.try_send(CapturedPayload {
            src_port: 10,
            dst_port: 20,
            payload: vec![0xAA, 0xBB, 0xCC],
        });
        dispatcher.drain(&channel, &mut storage);
        assert_eq!(dispatcher.active_flow_count(), 0);
    }

    #[test]
    fn opens_assembler_on_magic_sighting() {
        let mut dispatcher = Dispatcher::new(silent_log(), 1024, 4096);
        let channel = Channel::new(16);
        let mut storage = Storage::new(Catalog::empty());

        channel.try_send(CapturedPayload {
            src_port: 10,
            dst_port: 20,
            payload: vec![0xAA, 0x06, 0x00, 0x36],
        });
        dispatcher.drain(&channel, &mut storage);
        assert_eq!(dispatcher.active_flow_count(), 1);
    }

    #[test]
    fn reset_clears_assembler_buffers() {
        let mut dispatcher = Dispatcher::new(silent_log(), 1024, 4096);
        let channel = Channel::new(16);
        let mut storage = Storage::new(Catalog::empty());

        channel.try_send(CapturedPayload {
            src_port: 10,
            dst_port: 20,
            payload: vec![0xAA, 0xBB, 0x06, 0x00, 0x36, 0xCC],
        });
        dispatcher.drain(&channel, &mut storage);
        assert!(dispatcher.buffered_bytes() > 0);

        dispatcher.reset();
        assert_eq!(dispatcher.buffered_bytes(), 0);
    }
}
