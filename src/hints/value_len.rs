//! JSON value-length oracle.

use std::collections::HashMap;

use serde_json::value::RawValue;

use crate::utils::bytes::trim_nulls;

/// Length in bytes of the raw value (quotes included for strings) bound to
/// `key` in the null-padded JSON object `json`. `None` if the buffer is not a
/// JSON object or the key is absent.
pub fn json_value_len_hint(key: &str, json: &[u8]) -> Option<usize> {
    json_raw_value(key, json).map(|v| v.len())
}

/// The exact source text of the value bound to `key`, quotes included.
pub fn json_raw_value(key: &str, json: &[u8]) -> Option<String> {
    let trimmed = trim_nulls(json);
    let object: HashMap<String, Box<RawValue>> = serde_json::from_slice(trimmed).ok()?;
    object.get(key).map(|v| v.get().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_value_length_includes_quotes() {
        let json = b"{\"iss\":\"https://accounts.google.com\",\"iat\":1745012349}\0\0";
        assert_eq!(json_value_len_hint("iss", json), Some(29));
        assert_eq!(json_value_len_hint("iat", json), Some(10));
        assert_eq!(json_value_len_hint("aud", json), None);
    }

    #[test]
    fn malformed_json_yields_none() {
        assert_eq!(json_value_len_hint("iss", b"not json\0"), None);
    }
}
