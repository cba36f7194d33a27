//! DoT recognizer (spec §4.4.3, "DoT"): matches when, after the leading
//! length varint, the next two bytes are `05 38`.

use crate::decode::varint::read_varint;
use crate::decode::wire::read_u32_le;
use crate::storage::Storage;
use crate::types::DamageEvent;

/// Attempts to parse `packet` as a DoT tick. Returns `true` if the opcode
/// matched and the packet was fully consumed (used both as the top-level
/// fallback recognizer and, identically, as the mid-frame recovery
/// handler in §4.4.4).
pub fn try_parse(packet: &[u8], storage: &mut Storage) -> bool {
    let mut offset = 0usize;

    let length_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += length_info.len;

    if offset + 2 > packet.len() || packet[offset] != 0x05 || packet[offset + 1] != 0x38 {
        return false;
    }
    offset += 2;

    let target_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += target_info.len + 1; // + 1 skipped byte (spec §4.4.3).

    let actor_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    if actor_info.value == target_info.value {
        return false;
    }
    offset += actor_info.len;

    let unknown_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += unknown_info.len;

    if offset + 4 > packet.len() {
        return false;
    }
    let raw_code = match read_u32_le(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    let skill_code = raw_code / 100;
    offset += 4;

    let damage_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };

    storage.append_damage(DamageEvent {
        is_dot: true,
        target_id: target_info.value,
        actor_id: actor_info.value,
        skill_code,
        damage: damage_info.value,
        specials: Vec::new(),
        is_critical: false,
    });

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::decode::varint::write_varint;

    fn build_dot_packet(target: u32, actor: u32, raw_skill_code: u32, damage: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x05, 0x38]);
        write_varint(target, &mut body);
        body.push(0xEE); // skipped byte
        write_varint(actor, &mut body);
        write_varint(0, &mut body); // unknown
        body.extend_from_slice(&raw_skill_code.to_le_bytes());
        write_varint(damage, &mut body);

        let mut packet = Vec::new();
        write_varint((body.len() + 1) as u32, &mut packet);
        packet.extend_from_slice(&body);
        packet
    }

    #[test]
    fn parses_and_divides_skill_code_by_one_hundred() {
        let packet = build_dot_packet(5, 9, 1_102_000_000, 30);
        let mut storage = Storage::new(Catalog::empty());
        assert!(try_parse(&packet, &mut storage));

        let snap = storage.snapshot();
        let stats = snap.combat_stats.get(&(5, 9, 11_020_000)).unwrap();
        assert_eq!(stats.total_damage, 30);
    }

    #[test]
    fn rejects_self_inflicted_dot() {
        let packet = build_dot_packet(5, 5, 1_102_000_000, 30);
        let mut storage = Storage::new(Catalog::empty());
        assert!(!try_parse(&packet, &mut storage));
    }

    #[test]
    fn rejects_wrong_opcode() {
        let mut packet = Vec::new();
        write_varint(10, &mut packet);
        packet.extend_from_slice(&[0x04, 0x38, 1, 2, 3, 4, 5, 6]);
        let mut storage = Storage::new(Catalog::empty());
        assert!(!try_parse(&packet, &mut storage));
    }
}
