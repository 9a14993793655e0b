//! Needle-offset oracle.
//!
//! Computed on cleartext witness bytes; the result is untrusted until the
//! field verifier and mask checks pin it down. Callers surface `None` as a
//! witness-build error and additionally allocate a `found` boolean that the
//! circuit enforces, so an absent key can never turn into a wraparound
//! offset.

/// Byte offset of the first occurrence of `needle` in `haystack`.
pub fn offset_hint(needle: &[u8], haystack: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_occurrence() {
        let hay = b"{\"iss\":\"a\",\"sub\":\"b\"}\0\0\0";
        assert_eq!(offset_hint(b"\"iss\":", hay), Some(1));
        assert_eq!(offset_hint(b"\"sub\":", hay), Some(11));
        assert_eq!(offset_hint(b"\"aud\":", hay), None);
    }

    #[test]
    fn value_written_at_position_is_found_there() {
        let mut buf = vec![0u8; 64];
        buf[17..22].copy_from_slice(b"hello");
        assert_eq!(offset_hint(b"hello", &buf), Some(17));
    }
}
