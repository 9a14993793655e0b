//! Base64 length oracle.
//!
//! The base64url length of a null-padded buffer cannot be derived in-circuit
//! (it needs cleartext trimming), so it is hinted here and bound downstream:
//! the packed-token hash and the RSA check fail for any wrong value.

use crate::utils::bytes::trim_nulls;

/// Length of the unpadded base64url encoding of the logical (null-trimmed)
/// content of `buf`.
pub fn base64_len_hint(buf: &[u8]) -> usize {
    let n = trim_nulls(buf).len();
    (n * 4 + 2) / 3
}
