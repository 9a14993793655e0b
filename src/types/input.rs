//! Proof-request marshaling: human-readable inputs (hex, base64, JSON
//! strings) validated and converted into a circuit assignment.
//!
//! Everything that can be rejected before proving is rejected here, so the
//! hints inside constraint generation always succeed for assignments this
//! module produces.

use std::collections::HashMap;

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::circuits::commitment::{
    aggregate_public_hash, derive_nonce, derive_zk_addr, fold_digest,
};
use crate::circuits::jwt::constants::JwtParams;
use crate::circuits::rsa::{limbs_of, LIMB_BITS};
use crate::circuits::zk_login::{
    PublicInputsMode, ZkLoginCircuit, ELEMENT_SIZE, MAX_EPH_PUB_KEY_BYTES,
    MAX_EPH_PUB_KEY_CHUNKS,
};
use crate::hints::field_bytes_hint;
use crate::utils::bytes::{bytes_to_chunks, pad_bytes};

#[derive(Debug, Error)]
pub enum WitnessError {
    #[error("invalid hex in {field}")]
    Hex { field: &'static str },
    #[error("invalid base64 in {field}")]
    Base64 { field: &'static str },
    #[error("{field} is not a JSON object")]
    MalformedJson { field: &'static str },
    #[error("required claim {key:?} not found in {field}")]
    MissingClaim {
        field: &'static str,
        key: &'static str,
    },
    #[error("{field} is {len} bytes but the circuit capacity is {cap}")]
    BufferOverflow {
        field: &'static str,
        len: usize,
        cap: usize,
    },
    #[error("header claim {key:?} must be {expected}")]
    UnexpectedClaim {
        key: &'static str,
        expected: &'static str,
    },
    #[error("nonce claim does not match the commitment derived from the ephemeral key")]
    NonceMismatch,
    #[error("signature is not reduced modulo the provider key")]
    SignatureRange,
}

/// Proof request as it arrives from the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofInput {
    pub eph_pub_key_hex: String,
    pub idp_pub_key_n_base64: String,
    pub jwt_header_json: String,
    pub jwt_payload_json: String,
    pub jwt_signature_base64: String,
    pub jwt_rnd_hex: String,
    pub user_salt_hex: String,
}

impl ProofInput {
    /// Validates the request and builds the full circuit assignment.
    pub fn assignment<F: PrimeField + Absorb>(
        &self,
        params: &JwtParams,
        rsa_modulus_bits: usize,
        mode: PublicInputsMode,
    ) -> Result<ZkLoginCircuit<F>, WitnessError> {
        let eph_pub_key = eph_pub_key_chunks::<F>(&self.eph_pub_key_hex)?;
        let jwt_randomness = parse_scalar_hex::<F>("jwt_rnd_hex", &self.jwt_rnd_hex)?;
        let user_salt = parse_scalar_hex::<F>("user_salt_hex", &self.user_salt_hex)?;

        let idp_pub_key_n = decode_base64_uint("idp_pub_key_n_base64", &self.idp_pub_key_n_base64)?;
        if idp_pub_key_n.bits() as usize > rsa_modulus_bits {
            return Err(WitnessError::BufferOverflow {
                field: "idp_pub_key_n_base64",
                len: idp_pub_key_n.bits() as usize,
                cap: rsa_modulus_bits,
            });
        }
        let jwt_signature = decode_base64_uint("jwt_signature_base64", &self.jwt_signature_base64)?;
        if jwt_signature >= idp_pub_key_n {
            return Err(WitnessError::SignatureRange);
        }

        // Header shape.
        let header_bytes = check_capacity(
            "jwt_header_json",
            self.jwt_header_json.as_bytes(),
            params.max_header_json_len,
        )?;
        let header_claims = json_object("jwt_header_json", &self.jwt_header_json)?;
        expect_claim(&header_claims, "typ", "\"JWT\"")?;
        expect_claim(&header_claims, "alg", "\"RS256\"")?;
        let kid_value = required_claim("jwt_header_json", &header_claims, "kid")?;
        check_capacity("kid", kid_value.as_bytes(), params.max_kid_value_len)?;

        // Payload claims.
        let payload_bytes = check_capacity(
            "jwt_payload_json",
            self.jwt_payload_json.as_bytes(),
            params.max_payload_json_len,
        )?;
        let payload_claims = json_object("jwt_payload_json", &self.jwt_payload_json)?;
        let iss_value = required_claim("jwt_payload_json", &payload_claims, "iss")?;
        let aud_value = required_claim("jwt_payload_json", &payload_claims, "aud")?;
        let sub_value = required_claim("jwt_payload_json", &payload_claims, "sub")?;
        let nonce_value = required_claim("jwt_payload_json", &payload_claims, "nonce")?;
        check_capacity("iss", iss_value.as_bytes(), params.max_iss_value_len)?;
        check_capacity("aud", aud_value.as_bytes(), params.max_aud_value_len)?;
        check_capacity("sub", sub_value.as_bytes(), params.max_sub_value_len)?;

        // The nonce claim must be the commitment the circuit recomputes.
        let nonce = derive_nonce(&eph_pub_key, jwt_randomness);
        let expected_nonce = format!("\"{}\"", URL_SAFE_NO_PAD.encode(field_bytes_hint(nonce)));
        if nonce_value != expected_nonce {
            return Err(WitnessError::NonceMismatch);
        }

        let iss_padded = pad_bytes(iss_value.as_bytes(), params.max_iss_value_len);
        let aud_padded = pad_bytes(aud_value.as_bytes(), params.max_aud_value_len);
        let sub_padded = pad_bytes(sub_value.as_bytes(), params.max_sub_value_len);
        let header_padded = pad_bytes(header_bytes, params.max_header_json_len);
        let kid_padded = pad_bytes(kid_value.as_bytes(), params.max_kid_value_len);

        let zk_addr = derive_zk_addr(&iss_padded, &aud_padded, &sub_padded, user_salt);

        let public_input_hash = match mode {
            PublicInputsMode::Direct => F::zero(),
            PublicInputsMode::Aggregated => {
                let packed = format!(
                    "{}.{}",
                    URL_SAFE_NO_PAD.encode(header_bytes),
                    URL_SAFE_NO_PAD.encode(payload_bytes),
                );
                let digest: [u8; 32] = Sha256::digest(packed.as_bytes()).into();
                aggregate_public_hash(
                    &limbs_of(&idp_pub_key_n, rsa_modulus_bits / LIMB_BITS),
                    &eph_pub_key,
                    &header_padded,
                    &kid_padded,
                    zk_addr,
                    fold_digest::<F>(&digest),
                )
            }
        };

        Ok(ZkLoginCircuit {
            params: params.clone(),
            rsa_modulus_bits,
            mode,
            idp_pub_key_n,
            eph_pub_key,
            jwt_header_json: header_padded,
            kid_value: kid_padded,
            zk_addr,
            public_input_hash,
            jwt_payload_json: pad_bytes(payload_bytes, params.max_payload_json_len),
            iss_value: iss_padded,
            aud_value: aud_padded,
            sub_value: sub_padded,
            jwt_signature,
            jwt_randomness,
            user_salt,
        })
    }
}

/// Ephemeral public key, hex-decoded and packed into 31-byte chunks.
pub fn eph_pub_key_chunks<F: PrimeField>(hex_str: &str) -> Result<Vec<F>, WitnessError> {
    let bytes = decode_hex("eph_pub_key_hex", hex_str)?;
    if bytes.len() > MAX_EPH_PUB_KEY_BYTES {
        return Err(WitnessError::BufferOverflow {
            field: "eph_pub_key_hex",
            len: bytes.len(),
            cap: MAX_EPH_PUB_KEY_BYTES,
        });
    }
    let mut chunks: Vec<F> = bytes_to_chunks(&bytes, ELEMENT_SIZE)
        .into_iter()
        .map(F::from)
        .collect();
    chunks.resize(MAX_EPH_PUB_KEY_CHUNKS, F::zero());
    Ok(chunks)
}

/// Hex scalar (with or without 0x prefix), reduced into the field.
pub fn parse_scalar_hex<F: PrimeField>(
    field: &'static str,
    s: &str,
) -> Result<F, WitnessError> {
    let bytes = decode_hex(field, s)?;
    Ok(F::from(BigUint::from_bytes_be(&bytes)))
}

fn decode_hex(field: &'static str, s: &str) -> Result<Vec<u8>, WitnessError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|_| WitnessError::Hex { field })
}

fn decode_base64_uint(field: &'static str, s: &str) -> Result<BigUint, WitnessError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|_| WitnessError::Base64 { field })?;
    Ok(BigUint::from_bytes_be(&bytes))
}

fn check_capacity<'a>(
    field: &'static str,
    bytes: &'a [u8],
    cap: usize,
) -> Result<&'a [u8], WitnessError> {
    if bytes.len() > cap {
        return Err(WitnessError::BufferOverflow {
            field,
            len: bytes.len(),
            cap,
        });
    }
    Ok(bytes)
}

/// JSON object as a map from key to raw value text (quotes included).
fn json_object(
    field: &'static str,
    json: &str,
) -> Result<HashMap<String, String>, WitnessError> {
    let map: HashMap<String, Box<RawValue>> =
        serde_json::from_str(json).map_err(|_| WitnessError::MalformedJson { field })?;
    Ok(map
        .into_iter()
        .map(|(k, v)| (k, v.get().to_owned()))
        .collect())
}

fn required_claim(
    field: &'static str,
    claims: &HashMap<String, String>,
    key: &'static str,
) -> Result<String, WitnessError> {
    claims
        .get(key)
        .cloned()
        .ok_or(WitnessError::MissingClaim { field, key })
}

fn expect_claim(
    claims: &HashMap<String, String>,
    key: &'static str,
    expected: &'static str,
) -> Result<(), WitnessError> {
    match claims.get(key) {
        Some(v) if v == expected => Ok(()),
        Some(_) => Err(WitnessError::UnexpectedClaim { key, expected }),
        None => Err(WitnessError::MissingClaim {
            field: "jwt_header_json",
            key,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn eph_key_chunking_pads_to_three_elements() {
        let chunks = eph_pub_key_chunks::<Fr>("0x0102").unwrap();
        assert_eq!(chunks.len(), MAX_EPH_PUB_KEY_CHUNKS);
        assert_eq!(chunks[0], Fr::from(0x0102u64));
        assert_eq!(chunks[2], Fr::from(0u64));
    }

    #[test]
    fn oversized_eph_key_rejected() {
        let too_long = "ab".repeat(MAX_EPH_PUB_KEY_BYTES + 1);
        assert!(matches!(
            eph_pub_key_chunks::<Fr>(&too_long),
            Err(WitnessError::BufferOverflow { .. })
        ));
    }

    #[test]
    fn header_with_wrong_alg_rejected() {
        let input = ProofInput {
            eph_pub_key_hex: "0x01".into(),
            idp_pub_key_n_base64: URL_SAFE_NO_PAD.encode([0x80; 64]),
            jwt_header_json: "{\"alg\":\"ES256\",\"kid\":\"k\",\"typ\":\"JWT\"}".into(),
            jwt_payload_json: "{}".into(),
            jwt_signature_base64: URL_SAFE_NO_PAD.encode([1u8]),
            jwt_rnd_hex: "2a".into(),
            user_salt_hex: "05".into(),
        };
        let result = input.assignment::<Fr>(&JwtParams::default(), 512, PublicInputsMode::Direct);
        assert!(matches!(
            result,
            Err(WitnessError::UnexpectedClaim { key: "alg", .. })
        ));
    }
}
