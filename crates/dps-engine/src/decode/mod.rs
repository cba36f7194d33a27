//! Frame decoder (spec §4.4): turns one magic-terminated frame from the
//! Assembler into zero or more Storage writes.

pub mod damage;
pub mod dot;
pub mod nickname;
pub mod recovery;
pub mod sanitize;
pub mod summon;
pub mod varint;
pub mod wire;

use slog::Logger;

use self::varint::read_varint;
use crate::storage::Storage;

/// Entry point for one Assembler-delivered frame (or a recursively
/// extracted sub-frame). `frame` includes the trailing 3-byte magic on
/// the initial call; recursive calls over extracted sub-ranges may not.
pub fn on_packet_received(frame: &[u8], storage: &mut Storage, log: &Logger) {
    let length_info = match read_varint(frame, 0) {
        Some(v) => v,
        None => return,
    };

    let expected_len = length_info.value as usize;
    let actual_len = frame.len();

    if actual_len == expected_len {
        if actual_len >= 3 {
            parse_perfect_packet(&frame[..actual_len - 3], storage, log);
        }
        return;
    }

    if expected_len > actual_len {
        recovery::handle_broken_length(frame, storage, log, true);
        return;
    }

    if expected_len <= 3 {
        on_packet_received(&frame[1..], storage, log);
        return;
    }

    // Concatenated frames: expected_len < actual_len.
    let end = expected_len - 3;
    if end > 0 && end <= actual_len {
        let extracted = &frame[..end];
        if !extracted.is_empty() && extracted.len() != 3 {
            parse_perfect_packet(extracted, storage, log);
        }
    }
    if end < actual_len {
        on_packet_received(&frame[end..], storage, log);
    }
}

/// Tries each perfect-packet recognizer in turn (spec §4.4.3). The actor
/// binding scan and nickname broadcast share one dispatch slot (the
/// binding scan, being a scan over the whole frame, is tried first); DoT
/// is always attempted last as the final fallback, self-gated by its own
/// opcode check.
fn parse_perfect_packet(packet: &[u8], storage: &mut Storage, _log: &Logger) {
    if packet.len() < 3 {
        return;
    }

    if damage::try_parse(packet, storage) {
        return;
    }

    if recovery::actor_name_binding_scan(packet, storage) || nickname::try_parse_broadcast(packet, storage) {
        return;
    }

    if summon::try_parse(packet, storage) {
        return;
    }

    dot::try_parse(packet, storage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::decode::varint::write_varint;

    fn silent_log() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn full_frame_decodes_into_storage() {
        let log = silent_log();
        let mut storage = Storage::new(Catalog::empty());

        // Build directly with a self-consistent expected_len: body bytes
        // after the length varint, plus the length varint itself, plus
        // trailing magic.
        let mut body = Vec::new();
        body.extend_from_slice(&[0x04, 0x38]);
        write_varint(7, &mut body);
        write_varint(4, &mut body);
        write_varint(0, &mut body);
        write_varint(3, &mut body);
        body.extend_from_slice(&1234u32.to_le_bytes());
        body.push(0xAA);
        write_varint(0, &mut body);
        body.extend_from_slice(&[0u8; 8]);
        write_varint(0, &mut body);
        write_varint(99, &mut body);
        write_varint(0, &mut body);

        // length varint value = 1 (its own byte) + body.len() + 3 (magic)
        let declared = 1 + body.len() + 3;
        let mut frame = Vec::new();
        write_varint(declared as u32, &mut frame);
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&[0x06, 0x00, 0x36]);

        on_packet_received(&frame, &mut storage, &log);

        let snap = storage.snapshot();
        let stats = snap.combat_stats.get(&(7, 3, 1234)).unwrap();
        assert_eq!(stats.total_damage, 99);
    }

    #[test]
    fn pathological_short_length_drops_leading_byte_and_retries() {
        let log = silent_log();
        let mut storage = Storage::new(Catalog::empty());
        // expected_len (2) <= 3: drop first byte, retry on the rest,
        // which is itself too short to decode anything meaningful but
        // must not panic.
        let frame = vec![0x02, 0xFF, 0xFF];
        on_packet_received(&frame, &mut storage, &log);
    }

    #[test]
    fn concatenated_frames_both_decode() {
        let log = silent_log();
        let mut storage = Storage::new(Catalog::empty());

        let mut body_a = Vec::new();
        body_a.extend_from_slice(&[0x04, 0x38]);
        write_varint(1, &mut body_a);
        write_varint(4, &mut body_a);
        write_varint(0, &mut body_a);
        write_varint(2, &mut body_a);
        body_a.extend_from_slice(&10u32.to_le_bytes());
        body_a.push(0xAA);
        write_varint(0, &mut body_a);
        body_a.extend_from_slice(&[0u8; 8]);
        write_varint(0, &mut body_a);
        write_varint(5, &mut body_a);
        write_varint(0, &mut body_a);

        let mut frame_a = Vec::new();
        write_varint((1 + body_a.len() + 3) as u32, &mut frame_a);
        frame_a.extend_from_slice(&body_a);
        frame_a.extend_from_slice(&[0x06, 0x00, 0x36]);

        let mut body_b = Vec::new();
        body_b.extend_from_slice(&[0x04, 0x38]);
        write_varint(1, &mut body_b);
        write_varint(4, &mut body_b);
        write_varint(0, &mut body_b);
        write_varint(9, &mut body_b);
        body_b.extend_from_slice(&20u32.to_le_bytes());
        body_b.push(0xAA);
        write_varint(0, &mut body_b);
        body_b.extend_from_slice(&[0u8; 8]);
        write_varint(0, &mut body_b);
        write_varint(7, &mut body_b);
        write_varint(0, &mut body_b);

        let mut frame_b = Vec::new();
        write_varint((1 + body_b.len() + 3) as u32, &mut frame_b);
        frame_b.extend_from_slice(&body_b);
        frame_b.extend_from_slice(&[0x06, 0x00, 0x36]);

        let mut concatenated = frame_a.clone();
        concatenated.extend_from_slice(&frame_b);

        on_packet_received(&concatenated, &mut storage, &log);

        let snap = storage.snapshot();
        assert_eq!(snap.combat_stats.get(&(1, 2, 10)).unwrap().total_damage, 5);
        assert_eq!(snap.combat_stats.get(&(1, 9, 20)).unwrap().total_damage, 7);
    }
}
