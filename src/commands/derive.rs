//! Native nonce and address derivations, mirroring the in-circuit
//! commitments.

use anyhow::Result;
use ark_bn254::Fr;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use num_bigint::BigUint;

use crate::circuits::commitment::{derive_nonce, derive_zk_addr};
use crate::circuits::jwt::constants::JwtParams;
use crate::hints::field_bytes_hint;
use crate::types::input::{eph_pub_key_chunks, parse_scalar_hex, WitnessError};
use crate::utils::bytes::pad_bytes;

/// Base64url nonce for an ephemeral key and randomness.
pub fn derive_nonce_string(eph_pub_key_hex: &str, jwt_rnd_hex: &str) -> Result<String> {
    let chunks = eph_pub_key_chunks::<Fr>(eph_pub_key_hex)?;
    let randomness = parse_scalar_hex::<Fr>("jwt_rnd_hex", jwt_rnd_hex)?;
    let nonce = derive_nonce(&chunks, randomness);
    Ok(URL_SAFE_NO_PAD.encode(field_bytes_hint(nonce)))
}

/// Decimal address commitment for raw claim values (quotes included, exactly
/// as they appear in the token payload).
pub fn derive_zk_addr_string(
    iss: &str,
    aud: &str,
    sub: &str,
    user_salt_hex: &str,
) -> Result<String> {
    let params = JwtParams::default();
    check("iss", iss, params.max_iss_value_len)?;
    check("aud", aud, params.max_aud_value_len)?;
    check("sub", sub, params.max_sub_value_len)?;
    let salt = parse_scalar_hex::<Fr>("user_salt_hex", user_salt_hex)?;

    let zk_addr = derive_zk_addr(
        &pad_bytes(iss.as_bytes(), params.max_iss_value_len),
        &pad_bytes(aud.as_bytes(), params.max_aud_value_len),
        &pad_bytes(sub.as_bytes(), params.max_sub_value_len),
        salt,
    );
    let as_uint: BigUint = zk_addr.into();
    Ok(as_uint.to_string())
}

fn check(field: &'static str, value: &str, cap: usize) -> Result<(), WitnessError> {
    if value.len() > cap {
        return Err(WitnessError::BufferOverflow {
            field,
            len: value.len(),
            cap,
        });
    }
    Ok(())
}
