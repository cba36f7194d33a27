//! Recovery paths run when no confirmed recognizer matches a frame: the
//! broken-length recovery (spec §4.4.4) and the actor-name binding scan
//! (spec §4.4.6) it (and the top-level dispatch) fall back to.

use slog::Logger;

use crate::decode::sanitize::sanitize_nickname;
use crate::decode::varint::{read_varint, write_varint};
use crate::decode::{damage, dot, nickname, on_packet_received};
use crate::storage::Storage;

/// Reads a candidate UTF-8 name anchored at `packet[anchor_index] == 0x07`,
/// with `L` bounded by `max_len` (16 for binding rules, spec §4.4.1).
/// Returns the name's start offset and its sanitized text.
fn read_name_at(packet: &[u8], anchor_index: usize, max_len: u8) -> Option<(usize, String)> {
    let length_index = anchor_index + 1;
    let name_len = *packet.get(length_index)?;
    if name_len == 0 || name_len > max_len {
        return None;
    }
    let name_start = length_index + 1;
    let name_end = name_start + name_len as usize;
    if name_end > packet.len() {
        return None;
    }
    let raw = std::str::from_utf8(&packet[name_start..name_end]).ok()?;
    let sanitized = sanitize_nickname(raw)?;
    Some((name_start, sanitized))
}

struct Anchor {
    actor_id: u32,
    end_index: usize,
}

/// Single linear pass binding `0x36 <varint actor_id>` anchors to the next
/// plausible `0x07 <len> <utf8>` name that follows them (spec §4.4.6).
/// Returns `true` as soon as one binding is made.
pub fn actor_name_binding_scan(packet: &[u8], storage: &mut Storage) -> bool {
    let mut i = 0usize;
    let mut anchor: Option<Anchor> = None;
    let mut named_actors: Vec<u32> = Vec::new();

    while i < packet.len() {
        if packet[i] == 0x36 {
            anchor = match read_varint(packet, i + 1) {
                Some(v) if v.len > 0 && v.value >= 100 => Some(Anchor {
                    actor_id: v.value,
                    end_index: i + 1 + v.len,
                }),
                _ => None,
            };
            i += 1;
            continue;
        }

        if packet[i] == 0x07 {
            if let Some((name_start, name)) = read_name_at(packet, i, 16) {
                if let Some(a) = &anchor {
                    if !named_actors.contains(&a.actor_id) && name_start as isize - a.end_index as isize >= 0
                    {
                        if storage.nickname_of(a.actor_id).is_none() {
                            storage.append_nickname(a.actor_id, name);
                            named_actors.push(a.actor_id);
                            return true;
                        }
                    }
                }
            }
            i += 1;
            continue;
        }

        i += 1;
    }

    false
}

/// Handles a frame whose declared length exceeds the bytes actually
/// received (spec §4.4.4). `allow_nickname_scan` suppresses the nickname
/// and actor-binding fallback on recursive mid-frame calls.
pub fn handle_broken_length(
    packet: &[u8],
    storage: &mut Storage,
    log: &Logger,
    allow_nickname_scan: bool,
) {
    if packet.len() < 4 || packet[2] != 0xFF || packet[3] != 0xFF {
        mid_frame_resync(packet, storage, log, allow_nickname_scan);
        return;
    }

    if packet.len() > 10 {
        on_packet_received(&packet[10..], storage, log);
    }
}

fn mid_frame_resync(packet: &[u8], storage: &mut Storage, log: &Logger, allow_nickname_scan: bool) {
    let target = match storage.get_current_target() {
        Some(t) => t,
        None => return,
    };

    let mut target_bytes = Vec::new();
    write_varint(target, &mut target_bytes);

    let mut damage_keyword = vec![0x04, 0x38];
    damage_keyword.extend_from_slice(&target_bytes);
    let mut dot_keyword = vec![0x05, 0x38];
    dot_keyword.extend_from_slice(&target_bytes);

    let damage_idx = find_subsequence(packet, &damage_keyword);
    let dot_idx = find_subsequence(packet, &dot_keyword);

    type Handler = fn(&[u8], &mut Storage) -> bool;
    let chosen: Option<(usize, Handler)> = match (damage_idx, dot_idx) {
        (Some(d), Some(o)) if d < o => Some((d, damage::try_parse)),
        (Some(_), Some(o)) => Some((o, dot::try_parse as Handler)),
        (Some(d), None) => Some((d, damage::try_parse)),
        (None, Some(o)) => Some((o, dot::try_parse)),
        (None, None) => None,
    };

    let mut processed = false;

    if let Some((idx, handler)) = chosen {
        if idx >= 1 {
            if let Some(length_info) = read_varint(packet, idx - 1) {
                if length_info.len == 1 {
                    let start = idx - 1;
                    let end = (start as i64) + (length_info.value as i64) - 3;
                    let end = if end > start as i64 && (end as usize) <= packet.len() {
                        Some(end as usize)
                    } else {
                        None
                    };
                    if let Some(end) = end {
                        let extracted = &packet[start..end];
                        if handler(extracted, storage) {
                            processed = true;
                            if end < packet.len() {
                                handle_broken_length(&packet[end..], storage, log, false);
                            }
                        }
                    }
                }
            }
        }
    }

    if allow_nickname_scan && !processed {
        nickname::recovery_scan(packet, storage);
        actor_name_binding_scan(packet, storage);
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
