//! Summon recognizer (spec §4.4.3, "Summon"): matches when, after the
//! leading length varint, the next two bytes are `40 36`.

use crate::decode::varint::read_varint;
use crate::decode::wire::read_u16_le;
use crate::storage::Storage;

const FF_MARKER: [u8; 8] = [0xFF; 8];
const ACTOR_PATTERN: [u8; 3] = [0x07, 0x02, 0x06];

pub fn try_parse(packet: &[u8], storage: &mut Storage) -> bool {
    let mut offset = 0usize;

    let length_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += length_info.len;

    if offset + 2 > packet.len() || packet[offset] != 0x40 || packet[offset + 1] != 0x36 {
        return false;
    }
    offset += 2;

    let summon_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += summon_info.len + 28;

    if packet.len() > offset {
        let mob_info = match read_varint(packet, offset) {
            Some(v) => v,
            None => return false,
        };
        offset += mob_info.len;

        if packet.len() > offset {
            let mob_info2 = match read_varint(packet, offset) {
                Some(v) => v,
                None => return false,
            };
            if mob_info.value == mob_info2.value {
                storage.append_mob(summon_info.value, mob_info.value);
            }
        }
    }

    let marker_idx = match find_subsequence(packet, &FF_MARKER) {
        Some(idx) => idx,
        None => return false,
    };

    let after_marker = &packet[marker_idx + FF_MARKER.len()..];
    let pattern_idx = match find_subsequence(after_marker, &ACTOR_PATTERN) {
        Some(idx) => idx,
        None => return false,
    };

    let real_offset = marker_idx + pattern_idx + 11;
    let real_actor_id = match read_u16_le(packet, real_offset) {
        Some(v) => v,
        None => return false,
    };

    storage.append_summon(real_actor_id as u32, summon_info.value);
    true
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::decode::varint::write_varint;

    fn build_summon_packet(summon_id: u32, mob_code: Option<u32>, real_actor_id: u16) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x40, 0x36]);
        write_varint(summon_id, &mut body);
        body.extend_from_slice(&[0u8; 28]);

        if let Some(code) = mob_code {
            write_varint(code, &mut body);
            write_varint(code, &mut body);
        }

        body.extend_from_slice(&FF_MARKER);
        body.extend_from_slice(&[0x00, 0x00]); // padding before the opcode pattern
        body.extend_from_slice(&ACTOR_PATTERN);
        body.extend_from_slice(&real_actor_id.to_le_bytes());

        let mut packet = Vec::new();
        write_varint((body.len() + 1) as u32, &mut packet);
        packet.extend_from_slice(&body);
        packet
    }

    #[test]
    fn binds_summon_and_mob_code() {
        let packet = build_summon_packet(777, Some(555), 42);
        let mut storage = Storage::new(Catalog::empty());
        assert!(try_parse(&packet, &mut storage));

        let snap = storage.snapshot();
        assert_eq!(snap.mob_code.get(&777), Some(&555));
        assert_eq!(snap.summon_code.get(&42), Some(&777));
    }

    #[test]
    fn binds_summon_without_mob_code() {
        let packet = build_summon_packet(900, None, 7);
        let mut storage = Storage::new(Catalog::empty());
        assert!(try_parse(&packet, &mut storage));

        let snap = storage.snapshot();
        assert!(snap.mob_code.is_empty());
        assert_eq!(snap.summon_code.get(&7), Some(&900));
    }

    #[test]
    fn fails_without_marker() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x40, 0x36]);
        write_varint(1, &mut body);
        body.extend_from_slice(&[0u8; 28]);
        let mut packet = Vec::new();
        write_varint((body.len() + 1) as u32, &mut packet);
        packet.extend_from_slice(&body);

        let mut storage = Storage::new(Catalog::empty());
        assert!(!try_parse(&packet, &mut storage));
    }
}
