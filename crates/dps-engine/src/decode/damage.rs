//! Damage recognizer (spec §4.4.3, "Damage"): matches when, after the
//! leading length varint, the next two bytes are `04 38`.

use crate::decode::varint::read_varint;
use crate::decode::wire::read_u32_le;
use crate::storage::Storage;
use crate::types::{DamageEvent, SpecialFlag};

/// Maps the low nibble of the `switch` varint to the fixed-width special
/// block size that follows the skill code and type fields.
fn special_block_size(switch_value: u32) -> Option<usize> {
    match switch_value & 0x0F {
        4 => Some(8),
        5 => Some(12),
        6 => Some(10),
        7 => Some(14),
        _ => None,
    }
}

/// Attempts to parse `packet` (a perfect packet, i.e. with its trailing
/// magic already stripped) as a damage event. Returns `true` if the
/// opcode matched and the packet was fully consumed, regardless of
/// whether the resulting event was accepted into storage (self-damage is
/// dropped, but the packet is still considered "handled").
pub fn try_parse(packet: &[u8], storage: &mut Storage) -> bool {
    let mut offset = 0usize;

    let length_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += length_info.len;

    if offset + 2 > packet.len() || packet[offset] != 0x04 || packet[offset + 1] != 0x38 {
        return false;
    }
    offset += 2;

    let target_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += target_info.len;

    let switch_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += switch_info.len;

    let _flag_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += _flag_info.len;

    let actor_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += actor_info.len;

    if offset + 5 > packet.len() {
        return false;
    }
    let skill_code = match read_u32_le(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += 5; // 4-byte code plus one trailing tag byte.

    let type_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += type_info.len;

    if offset >= packet.len() {
        return false;
    }

    let block_size = match special_block_size(switch_info.value) {
        Some(size) => size,
        None => return false,
    };
    if offset + block_size > packet.len() {
        return false;
    }
    let specials = SpecialFlag::from_bitset(packet[offset]);
    offset += block_size;

    let unknown_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += unknown_info.len;

    let damage_info = match read_varint(packet, offset) {
        Some(v) => v,
        None => return false,
    };
    offset += damage_info.len;

    if read_varint(packet, offset).is_none() {
        return false;
    }

    if actor_info.value != target_info.value {
        storage.append_damage(DamageEvent {
            is_dot: false,
            target_id: target_info.value,
            actor_id: actor_info.value,
            skill_code,
            damage: damage_info.value,
            specials,
            is_critical: type_info.value == 3,
        });
    }

    true
}
