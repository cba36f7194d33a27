//! The composition root (SPEC_FULL.md glossary: "Engine: the composition of
//! Channel + Dispatcher + Aggregator owned by `dps-runner`'s composition
//! root, exposing `reset()`/`stop()`"). Spawns the five worker threads from
//! spec §5 and owns the shared state they read and write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use slog::Logger;

use dps_common::config::EngineConfig;
use dps_engine::{
    compute_snapshot, Catalog, Channel, Command, CommandSource, Dispatcher, MetricsSink,
    PacketSource, SnapshotKind, SnapshotSink, Storage,
};

use crate::main_player::MainPlayerDetector;
use crate::metrics::ProcessMetricsSource;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);
const AGGREGATOR_IDLE_SLEEP: Duration = Duration::from_millis(5);
const DISPATCHER_IDLE_SLEEP: Duration = Duration::from_millis(2);
const MAIN_PLAYER_POLL: Duration = Duration::from_secs(10);
const METRICS_POLL: Duration = Duration::from_secs(1);

type SharedAssemblerSizes = Arc<Mutex<HashMap<String, usize>>>;

/// Everything needed to spawn the five worker threads. Each field is either
/// consumed by exactly one thread or cheap to clone (the shared `Storage`
/// mutex, the `Channel`, and atomics).
pub struct Engine {
    storage: Arc<Mutex<Storage>>,
    channel: Channel,
    assembler_sizes: SharedAssemblerSizes,
    running: Arc<AtomicBool>,
    reset_requested: Arc<AtomicBool>,
    config: EngineConfig,
    log: Logger,
    handles: Vec<JoinHandle<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig, catalog: Catalog, log: Logger) -> Engine {
        Engine {
            storage: Arc::new(Mutex::new(Storage::new(catalog))),
            channel: Channel::new(config.channel_capacity),
            assembler_sizes: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(true)),
            reset_requested: Arc::new(AtomicBool::new(false)),
            config,
            log,
            handles: Vec::new(),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// Spawns the capture, dispatcher, aggregator, main-player, and metrics
    /// threads (spec §5). Consumes the trait objects the caller built for
    /// each boundary.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        mut packet_source: Box<dyn PacketSource>,
        snapshot_sink: Arc<Mutex<Box<dyn SnapshotSink>>>,
        mut metrics_sink: Box<dyn MetricsSink>,
        mut main_player_detector: Box<dyn MainPlayerDetector>,
    ) {
        // Capture thread: blocks on the packet source, forwards into the
        // bounded channel.
        {
            let channel = self.channel.clone();
            let running = Arc::clone(&self.running);
            let log = self.log.new(slog::o!("component" => "capture"));
            self.handles.push(
                thread::Builder::new()
                    .name("dps-capture".into())
                    .spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            match packet_source.next_payload() {
                                Ok(payload) => {
                                    channel.try_send(payload);
                                }
                                Err(err) => {
                                    slog::error!(log, "capture source failed, stopping"; "error" => %err);
                                    running.store(false, Ordering::Relaxed);
                                    break;
                                }
                            }
                        }
                        packet_source.stop();
                    })
                    .expect("failed to spawn capture thread"),
            );
        }

        // Dispatcher thread: drains the channel, owns the per-flow
        // assemblers, and is the only thread that ever touches them
        // (including on reset — see `perform_reset` below).
        {
            let channel = self.channel.clone();
            let storage = Arc::clone(&self.storage);
            let running = Arc::clone(&self.running);
            let reset_requested = Arc::clone(&self.reset_requested);
            let assembler_sizes = Arc::clone(&self.assembler_sizes);
            let sink = Arc::clone(&snapshot_sink);
            let warn_bytes = self.config.assembler_warn_bytes;
            let max_bytes = self.config.assembler_max_bytes;
            let log = self.log.new(slog::o!("component" => "dispatcher"));
            self.handles.push(
                thread::Builder::new()
                    .name("dps-dispatcher".into())
                    .spawn(move || {
                        let mut dispatcher = Dispatcher::new(log.clone(), warn_bytes, max_bytes);
                        while running.load(Ordering::Relaxed) {
                            let processed = {
                                let mut storage = storage.lock().expect("storage mutex poisoned");
                                dispatcher.drain(&channel, &mut storage)
                            };

                            if reset_requested.swap(false, Ordering::AcqRel) {
                                perform_reset(&storage, &channel, &mut dispatcher, &sink);
                            }

                            *assembler_sizes.lock().expect("assembler_sizes mutex poisoned") =
                                dispatcher.assembler_sizes();

                            if processed == 0 {
                                thread::sleep(DISPATCHER_IDLE_SLEEP);
                            }
                        }
                    })
                    .expect("failed to spawn dispatcher thread"),
            );
        }

        // Aggregator thread: periodic snapshot, spec §4.6.
        {
            let storage = Arc::clone(&self.storage);
            let running = Arc::clone(&self.running);
            let sink = Arc::clone(&snapshot_sink);
            let update_delay = Duration::from_millis(self.config.update_delay_ms);
            self.handles.push(
                thread::Builder::new()
                    .name("dps-aggregator".into())
                    .spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            let storage_snapshot = storage
                                .lock()
                                .expect("storage mutex poisoned")
                                .snapshot();
                            if let Some(snapshot) = compute_snapshot(&storage_snapshot) {
                                sink.lock()
                                    .expect("snapshot sink mutex poisoned")
                                    .emit(&snapshot, SnapshotKind::Tick);
                            }
                            thread::sleep(update_delay.max(AGGREGATOR_IDLE_SLEEP));
                        }
                    })
                    .expect("failed to spawn aggregator thread"),
            );
        }

        // Main-player detector thread, spec §5.
        {
            let storage = Arc::clone(&self.storage);
            let running = Arc::clone(&self.running);
            self.handles.push(
                thread::Builder::new()
                    .name("dps-main-player".into())
                    .spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            if let Some(name) = main_player_detector.detect() {
                                storage
                                    .lock()
                                    .expect("storage mutex poisoned")
                                    .set_main_player(name);
                            }
                            thread::sleep(MAIN_PLAYER_POLL);
                        }
                    })
                    .expect("failed to spawn main-player thread"),
            );
        }

        // Metrics thread, spec §5.
        {
            let running = Arc::clone(&self.running);
            let source = ProcessMetricsSource::new(self.channel.clone(), Arc::clone(&self.assembler_sizes));
            self.handles.push(
                thread::Builder::new()
                    .name("dps-metrics".into())
                    .spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            metrics_sink.emit(&source.sample());
                            thread::sleep(METRICS_POLL);
                        }
                    })
                    .expect("failed to spawn metrics thread"),
            );
        }
    }

    /// Consumes commands until `quit` (or the source is exhausted), driving
    /// the Reset API (spec §4.7) and the cooperative stop.
    pub fn drive_commands(&self, mut commands: Box<dyn CommandSource>) {
        while self.running.load(Ordering::Relaxed) {
            match commands.try_recv() {
                Some(Command::Reset) => self.reset_requested.store(true, Ordering::Release),
                Some(Command::Quit) => {
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }
                None => thread::sleep(Duration::from_millis(50)),
            }
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Joins every worker thread with a bounded wait, logging (not
    /// panicking) on timeout, per spec §5 "partial failure to join logs and
    /// proceeds".
    pub fn join(mut self) {
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            let (done_tx, done_rx) = std::sync::mpsc::channel();
            let waiter = thread::spawn(move || {
                let _ = handle.join();
                let _ = done_tx.send(());
            });
            if done_rx.recv_timeout(JOIN_TIMEOUT).is_err() {
                slog::warn!(self.log, "thread join timed out"; "thread" => name);
            }
            let _ = waiter.join();
        }
    }
}

/// Spec §4.7: synchronous, produces one final "summary" snapshot, then
/// resets Storage and the Assembler buffers, and clears the Channel.
/// Nickname and main-player identity survive (`Storage::reset` preserves
/// them); running entirely on the dispatcher thread means this never races
/// a concurrent `Dispatcher::drain`.
fn perform_reset(
    storage: &Arc<Mutex<Storage>>,
    channel: &Channel,
    dispatcher: &mut Dispatcher,
    sink: &Arc<Mutex<Box<dyn SnapshotSink>>>,
) {
    let mut storage = storage.lock().expect("storage mutex poisoned");
    let storage_snapshot = storage.snapshot();
    if let Some(snapshot) = compute_snapshot(&storage_snapshot) {
        sink.lock()
            .expect("snapshot sink mutex poisoned")
            .emit(&snapshot, SnapshotKind::Summary);
    }
    storage.reset();
    dispatcher.reset();
    channel.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use dps_engine::types::DamageEvent;

    struct CapturingSink {
        emitted: Arc<Mutex<Vec<SnapshotKind>>>,
    }

    impl SnapshotSink for CapturingSink {
        fn emit(&mut self, _snapshot: &dps_engine::Snapshot, kind: SnapshotKind) {
            self.emitted.lock().unwrap().push(kind);
        }
    }

    fn silent_log() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn perform_reset_emits_summary_and_clears_fight_state() {
        let storage = Arc::new(Mutex::new(Storage::new(Catalog::empty())));
        storage.lock().unwrap().append_damage(DamageEvent {
            is_dot: false,
            target_id: 1,
            actor_id: 2,
            skill_code: 11_020_000,
            damage: 100,
            specials: Vec::new(),
            is_critical: false,
        });

        let channel = Channel::new(16);
        let mut dispatcher = Dispatcher::new(silent_log(), 1024, 4096);
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let sink: Arc<Mutex<Box<dyn SnapshotSink>>> = Arc::new(Mutex::new(Box::new(CapturingSink {
            emitted: Arc::clone(&emitted),
        })));

        perform_reset(&storage, &channel, &mut dispatcher, &sink);

        let snap = storage.lock().unwrap().snapshot();
        assert!(snap.combat_stats.is_empty());
        assert_eq!(snap.start_time, None);
        assert_eq!(*emitted.lock().unwrap(), vec![SnapshotKind::Summary]);
    }
}
