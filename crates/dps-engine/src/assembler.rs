//! Per-flow stream re-assembler (spec §4.3): frames magic-terminated
//! application messages out of an arbitrarily-chunked TCP byte stream.

use crate::buffer::FrameBuffer;
use slog::Logger;

/// Three-byte sequence marking both flow interest and end-of-frame.
pub const MAGIC: [u8; 3] = [0x06, 0x00, 0x36];

/// Desync heuristic (spec §4.3): if the buffer grows beyond this without a
/// single sighting of magic, it is almost certainly not framed data for
/// this flow and is discarded.
const DESYNC_THRESHOLD: usize = 1024;

/// Re-assembles one TCP flow's byte stream into magic-terminated frames.
pub struct Assembler {
    buffer: FrameBuffer,
    log: Logger,
}

impl Assembler {
    pub fn new(log: Logger) -> Assembler {
        Assembler {
            buffer: FrameBuffer::new(),
            log,
        }
    }

    pub fn with_caps(log: Logger, warn_bytes: usize, max_bytes: usize) -> Assembler {
        Assembler {
            buffer: FrameBuffer::with_caps(warn_bytes, max_bytes),
            log,
        }
    }

    /// Current buffered byte count, exposed for the metrics thread.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds one chunk of bytes. Every magic-terminated frame that can be
    /// extracted is delivered to `on_frame`, in order. After this call
    /// returns, the buffer either is empty, holds bytes after the last
    /// magic seen, or holds a short (<1 KiB) prefix awaiting more data.
    pub fn process_chunk(&mut self, chunk: &[u8], mut on_frame: impl FnMut(&[u8])) {
        if self.buffer.append(chunk, &self.log) {
            // Hard cap hit; buffer was reset, nothing left to frame.
            return;
        }

        loop {
            match self.buffer.find(&MAGIC) {
                Some(idx) => {
                    let cut = idx + MAGIC.len();
                    let frame = self.buffer.slice(0, cut).to_vec();
                    on_frame(&frame);
                    self.buffer.discard(cut);
                }
                None => {
                    if self.buffer.len() > DESYNC_THRESHOLD {
                        slog::debug!(
                            self.log,
                            "no magic found past desync threshold, resetting";
                            "size" => self.buffer.len()
                        );
                        self.buffer.reset();
                    }
                    break;
                }
            }
        }
    }

    /// Discards all buffered bytes (used by the Reset/Snapshot API, §4.7).
    pub fn stop(&mut self) {
        self.buffer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_log() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn two_chunks_yield_two_frames() {
        let mut asm = Assembler::new(silent_log());
        let mut frames: Vec<Vec<u8>> = Vec::new();

        asm.process_chunk(&[0xAA, 0x06, 0x00], |f| frames.push(f.to_vec()));
        asm.process_chunk(&[0x36, 0xBB, 0xCC, 0x06, 0x00, 0x36], |f| {
            frames.push(f.to_vec())
        });

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], vec![0xAA, 0x06, 0x00, 0x36]);
        assert_eq!(frames[1], vec![0xBB, 0xCC, 0x06, 0x00, 0x36]);
        assert_eq!(asm.buffered_len(), 0);
    }

    #[test]
    fn long_run_without_magic_resyncs() {
        let mut asm = Assembler::new(silent_log());
        let mut frames: Vec<Vec<u8>> = Vec::new();

        let junk = vec![0xFFu8; 2048];
        asm.process_chunk(&junk, |f| frames.push(f.to_vec()));

        assert!(frames.is_empty());
        assert_eq!(asm.buffered_len(), 0);
    }

    #[test]
    fn short_prefix_without_magic_waits() {
        let mut asm = Assembler::new(silent_log());
        let mut frames: Vec<Vec<u8>> = Vec::new();

        asm.process_chunk(&[0x01, 0x02, 0x03], |f| frames.push(f.to_vec()));

        assert!(frames.is_empty());
        assert_eq!(asm.buffered_len(), 3);
    }

    #[test]
    fn every_delivered_frame_ends_in_magic() {
        let mut asm = Assembler::new(silent_log());
        let mut frames: Vec<Vec<u8>> = Vec::new();

        let mut stream = Vec::new();
        for byte in [1u8, 2, 3] {
            stream.push(byte);
            stream.extend_from_slice(&MAGIC);
        }
        asm.process_chunk(&stream, |f| frames.push(f.to_vec()));

        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert!(frame.ends_with(&MAGIC));
        }
    }
}
