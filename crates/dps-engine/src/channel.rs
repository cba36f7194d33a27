//! Bounded, non-blocking delivery channel between the capture thread and the
//! dispatcher (spec §4.1).
//!
//! The teacher's own `net::channel::Channel` wraps a single TCP connection,
//! not a generic bounded queue, so this primitive is grounded in the wider
//! example pack instead: `crossbeam-channel` is exactly the bounded MPSC
//! queue the spec describes, with native `try_send`/`try_recv`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One captured TCP payload, as handed off from the capture thread.
#[derive(Debug, Clone)]
pub struct CapturedPayload {
    pub src_port: u16,
    pub dst_port: u16,
    pub payload: Vec<u8>,
}

/// Bounded FIFO queue of [`CapturedPayload`]. Safe for concurrent use by a
/// single producer (capture thread) and a single consumer (dispatcher); the
/// underlying `crossbeam_channel` bounded queue in fact supports many
/// producers/consumers, which is a superset of what the spec requires.
pub struct Channel {
    sender: crossbeam_channel::Sender<CapturedPayload>,
    receiver: crossbeam_channel::Receiver<CapturedPayload>,
    dropped: Arc<AtomicU64>,
    closed: Arc<std::sync::atomic::AtomicBool>,
}

impl Channel {
    /// Creates a channel bounded to `capacity` in-flight payloads. Oldest-drop
    /// on overrun is not performed by `crossbeam_channel` (it rejects the new
    /// item instead of evicting the old one); `try_send` reports the drop via
    /// the return value and the counter is incremented by the caller's
    /// capture loop, per the "must be reported via a counter" requirement.
    pub fn new(capacity: usize) -> Channel {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Channel {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Non-blocking send. Returns `false` (and bumps the drop counter) if the
    /// channel is full or closed.
    pub fn try_send(&self, payload: CapturedPayload) -> bool {
        if self.closed.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        match self.sender.try_send(payload) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Non-blocking receive.
    pub fn try_receive(&self) -> Option<CapturedPayload> {
        self.receiver.try_recv().ok()
    }

    /// Drains the channel, returning the number of items discarded.
    pub fn clear(&self) -> usize {
        let mut count = 0;
        while self.receiver.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Number of items currently queued.
    pub fn size(&self) -> usize {
        self.receiver.len()
    }

    /// Marks the channel closed for sending. Already-queued items remain
    /// receivable until drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Total payloads dropped for being sent into a full or closed channel.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Clone for Channel {
    fn clone(&self) -> Self {
        Channel {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            dropped: Arc::clone(&self.dropped),
            closed: Arc::clone(&self.closed),
        }
    }
}
