//! Nickname recognizers: the confirmed broadcast (spec §4.4.3) and the
//! best-effort recovery scan run over unrecognized bytes (spec §4.4.5).

use crate::decode::sanitize::sanitize_nickname;
use crate::decode::varint::read_varint;
use crate::storage::Storage;

/// Matches when, after the leading length varint, the next two bytes are
/// `04 8D`. The player id and name are then read from a *fixed* offset of
/// 10 into the frame, independent of how many bytes the opcode check
/// itself consumed.
pub fn try_parse_broadcast(packet: &[u8], storage: &mut Storage) -> bool {
    let length_info = match read_varint(packet, 0) {
        Some(v) => v,
        None => return false,
    };
    let opcode_offset = length_info.len;
    if opcode_offset + 2 > packet.len()
        || packet[opcode_offset] != 0x04
        || packet[opcode_offset + 1] != 0x8D
    {
        return false;
    }

    let mut offset = 10usize;
    if offset >= packet.len() {
        return false;
    }

    let player_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += player_info.len;

    if offset >= packet.len() {
        return false;
    }
    let name_len = packet[offset] as usize;
    if name_len > 72 || offset + 1 + name_len > packet.len() {
        return false;
    }

    let name_bytes = &packet[offset + 1..offset + 1 + name_len];
    let possible_name = match std::str::from_utf8(name_bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };

    let sanitized = match sanitize_nickname(possible_name) {
        Some(s) => s,
        None => return false,
    };

    storage.append_nickname(player_info.value, sanitized);
    true
}

const PATTERN_A: (u8, u8) = (0x01, 0x07);
const PATTERN_B: (u8, u8) = (0x00, 0x07);
const PATTERN_C: (u8, u8) = (0x39, 0x8A);

/// Best-effort nickname recovery over an entire frame that no confirmed
/// recognizer matched (spec §4.4.5). Returns `true` if any binding (or
/// main-player designation) was made.
pub fn recovery_scan(packet: &[u8], storage: &mut Storage) -> bool {
    let len = packet.len();
    let mut offset = 0usize;
    let mut bound_any = false;

    while offset < len {
        let varint = match read_varint(packet, offset) {
            Some(v) if v.len > 0 => v,
            _ => {
                offset += 1;
                continue;
            }
        };

        let inner = offset + varint.len;
        if inner + 6 > len {
            offset += 1;
            continue;
        }

        let marker = (packet[inner + 3], packet[inner + 4]);
        let name_len = packet[inner + 5] as usize;
        let end = inner + 6 + name_len;

        let candidate = if name_len > 0 && name_len <= 72 && end <= len {
            std::str::from_utf8(&packet[inner + 6..end]).ok()
        } else {
            None
        };

        if marker == PATTERN_A {
            if let Some(name) = candidate {
                if let Some(sanitized) = sanitize_nickname(name) {
                    storage.append_nickname(varint.value, sanitized);
                    bound_any = true;
                }
            }
        } else if marker == PATTERN_B {
            if let Some(name) = candidate {
                if !name.contains("\\p") {
                    if let Some(sanitized) = sanitize_nickname(name) {
                        storage.append_nickname(varint.value, sanitized);
                        bound_any = true;
                    }
                }
            }
        } else if marker == PATTERN_C {
            if let Some(name) = candidate {
                if let Some(sanitized) = sanitize_nickname(name) {
                    storage.append_nickname(varint.value, sanitized.clone());
                    storage.set_main_player(sanitized);
                    return true;
                }
            }
        }

        offset += 1;
    }

    bound_any
}
