//! Growable byte buffer backing a per-flow [`crate::assembler::Assembler`].
//!
//! Structured the way the teacher's `net::buffer::Buffer` separates buffer
//! bookkeeping from the framing logic that uses it (`append`/`reset` here,
//! `len`/`is_empty` there), but the growth and capping policy is the
//! spec's own (§3, §4.3) rather than the teacher's fixed-capacity ring
//! buffer — a TCP flow's accumulated-but-unframed bytes has no natural
//! fixed size, so this buffer grows until it hits the warn/hard caps.

use slog::Logger;

/// Soft warn threshold (spec §3): buffer size crossing above this without
/// framing logs a warning but keeps accumulating.
pub const WARN_BYTES: usize = 10 * 1024 * 1024;
/// Hard cap (spec §3): a post-append size beyond this resets the buffer,
/// discarding its contents.
pub const MAX_BYTES: usize = 20 * 1024 * 1024;

/// A contiguous, growable byte buffer with a soft warn threshold and a hard
/// cap. Bytes are appended at the tail and discarded from the head once
/// framed.
pub struct FrameBuffer {
    data: Vec<u8>,
    warn_bytes: usize,
    max_bytes: usize,
    warned: bool,
}

impl FrameBuffer {
    pub fn new() -> FrameBuffer {
        FrameBuffer::with_caps(WARN_BYTES, MAX_BYTES)
    }

    pub fn with_caps(warn_bytes: usize, max_bytes: usize) -> FrameBuffer {
        FrameBuffer {
            data: Vec::new(),
            warn_bytes,
            max_bytes,
            warned: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends `chunk` to the buffer. Returns `true` if the hard cap was
    /// exceeded and the buffer was reset (contents discarded), matching the
    /// spec's "on overflow it is reset" contract; the caller is responsible
    /// for logging (it has the flow key, this type does not).
    #[inline]
    pub fn append(&mut self, chunk: &[u8], log: &Logger) -> bool {
        let new_size = self.data.len() + chunk.len();

        if new_size > self.max_bytes {
            slog::error!(
                log,
                "assembler buffer exceeded hard cap, resetting";
                "new_size" => new_size, "max_bytes" => self.max_bytes
            );
            self.reset();
            return true;
        }

        self.data.extend_from_slice(chunk);

        if new_size > self.warn_bytes {
            if !self.warned {
                slog::warn!(
                    log,
                    "assembler buffer nearing hard cap";
                    "size" => new_size, "warn_bytes" => self.warn_bytes
                );
                self.warned = true;
            }
        } else {
            self.warned = false;
        }

        false
    }

    /// First index of `needle` in the buffer, if present.
    #[inline]
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || self.data.len() < needle.len() {
            return None;
        }
        self.data
            .windows(needle.len())
            .position(|window| window == needle)
    }

    /// Borrow of bytes `[start, end)`. Panics on out-of-range indices; all
    /// call sites derive `end` from a prior successful `find`, so this is a
    /// programmer error, not a runtime condition, if it ever trips.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.data[start..end]
    }

    /// Drops the first `count` bytes from the head of the buffer.
    #[inline]
    pub fn discard(&mut self, count: usize) {
        if count >= self.data.len() {
            self.data.clear();
        } else {
            self.data.drain(..count);
        }
        self.warned = false;
    }

    /// Discards all buffered bytes.
    #[inline]
    pub fn reset(&mut self) {
        self.data.clear();
        self.warned = false;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_log() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn append_and_find_and_discard() {
        let mut buf = FrameBuffer::new();
        let log = silent_log();

        assert!(!buf.append(b"AA\x06\x00\x36BB", &log));
        let idx = buf.find(b"\x06\x00\x36").unwrap();
        assert_eq!(idx, 2);

        let framed = buf.slice(0, idx + 3).to_vec();
        assert_eq!(framed, b"AA\x06\x00\x36");

        buf.discard(idx + 3);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.slice(0, 2), b"BB");
    }

    #[test]
    fn hard_cap_resets_buffer() {
        let mut buf = FrameBuffer::with_caps(4, 8);
        let log = silent_log();

        assert!(!buf.append(&[0u8; 4], &log));
        assert!(buf.append(&[0u8; 10], &log));
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn warn_threshold_does_not_reset() {
        let mut buf = FrameBuffer::with_caps(4, 100);
        let log = silent_log();

        assert!(!buf.append(&[0u8; 10], &log));
        assert_eq!(buf.len(), 10);
    }
}
