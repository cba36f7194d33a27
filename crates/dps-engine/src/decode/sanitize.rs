//! Candidate-nickname sanitization (spec §4.4.1), shared by every
//! recognizer that can produce a player-visible name: nickname broadcasts,
//! the nickname-recovery scan, and the actor-name binding scan.

/// CJK ranges treated as "Han" for the length-3 exemption below.
const HAN_RANGES: [(u32, u32); 3] = [
    (0x4E00, 0x9FFF), // CJK Unified Ideographs
    (0x3400, 0x4DBF), // Extension A
    (0xF900, 0xFAFF), // Compatibility
];

#[inline]
pub fn is_han_character(c: char) -> bool {
    let code = c as u32;
    HAN_RANGES
        .iter()
        .any(|&(start, end)| code >= start && code <= end)
}

/// Validates and filters a candidate nickname. Returns `None` if the
/// candidate is unusable after filtering.
pub fn sanitize_nickname(raw: &str) -> Option<String> {
    let trimmed = raw.split('\0').next().unwrap_or("").trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut result = String::new();
    let mut only_numbers = true;
    let mut has_han = false;

    for ch in trimmed.chars() {
        let code = ch as u32;

        // C0 controls and DEL.
        if code < 32 || code == 127 {
            continue;
        }
        // C1 controls.
        if (0x80..=0x9F).contains(&code) {
            continue;
        }
        // Replacement character (usually a mis-decoded byte).
        if ch == '\u{FFFD}' {
            continue;
        }

        if !(ch.is_alphanumeric() || is_han_character(ch)) {
            continue;
        }

        result.push(ch);

        if ch.is_alphabetic() {
            only_numbers = false;
        }
        if is_han_character(ch) {
            has_han = true;
        }
    }

    if result.is_empty() {
        return None;
    }
    if result.chars().count() < 3 && !has_han {
        return None;
    }
    if only_numbers {
        return None;
    }
    if result.chars().count() == 1 {
        let only = result.chars().next().unwrap();
        if only.is_alphabetic() {
            return None;
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_ascii_name() {
        assert_eq!(sanitize_nickname("Legolas"), Some("Legolas".to_string()));
    }

    #[test]
    fn trims_at_first_nul_and_whitespace() {
        assert_eq!(
            sanitize_nickname("  Aragorn\0garbage  "),
            Some("Aragorn".to_string())
        );
    }

    #[test]
    fn drops_control_and_replacement_characters() {
        let raw = "A\u{0001}r\u{007F}a\u{FFFD}gorn";
        assert_eq!(sanitize_nickname(raw), Some("Aragorn".to_string()));
    }

    #[test]
    fn rejects_all_digit_names() {
        assert_eq!(sanitize_nickname("12345"), None);
    }

    #[test]
    fn rejects_single_alphabetic_character() {
        assert_eq!(sanitize_nickname("x"), None);
    }

    #[test]
    fn rejects_short_non_han_names() {
        assert_eq!(sanitize_nickname("ab"), None);
    }

    #[test]
    fn allows_short_two_character_han_names() {
        assert_eq!(sanitize_nickname("风云"), Some("风云".to_string()));
    }

    #[test]
    fn rejects_single_han_character() {
        assert_eq!(sanitize_nickname("风"), None);
    }

    #[test]
    fn rejects_punctuation_only_input() {
        assert_eq!(sanitize_nickname("!!!"), None);
    }

    #[test]
    fn is_idempotent() {
        let once = sanitize_nickname("Mixed123Name").unwrap();
        let twice = sanitize_nickname(&once).unwrap();
        assert_eq!(once, twice);
    }
}
