//! Byte-decomposition oracle for field elements and its verifier.
//!
//! Re-accumulating the hinted bytes with place-value weights of 256 is the
//! only admissible way to turn a field element into a byte string usable as a
//! JSON claim; the bytes themselves get range-checked when they are bit-split
//! for base64 encoding.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

pub const FIELD_BYTES: usize = 32;

/// Big-endian 32-byte representation of `v`.
pub fn field_bytes_hint<F: PrimeField>(v: F) -> [u8; FIELD_BYTES] {
    let raw = v.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    if raw.len() >= FIELD_BYTES {
        out.copy_from_slice(&raw[raw.len() - FIELD_BYTES..]);
    } else {
        out[FIELD_BYTES - raw.len()..].copy_from_slice(&raw);
    }
    out
}

/// Allocates the hinted decomposition of `value` and enforces that it
/// re-accumulates to `value` exactly.
pub fn alloc_field_bytes<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    value: &FpVar<F>,
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    let mut bytes = Vec::with_capacity(FIELD_BYTES);
    for i in 0..FIELD_BYTES {
        bytes.push(FpVar::new_witness(cs.clone(), || {
            value
                .value()
                .map(|v| F::from(field_bytes_hint(v)[i] as u64))
        })?);
    }
    verify_field_bytes(&bytes, value)?;
    Ok(bytes)
}

/// Enforces `sum(bytes[i] * 256^(31-i)) == value`.
pub fn verify_field_bytes<F: PrimeField>(
    bytes: &[FpVar<F>],
    value: &FpVar<F>,
) -> Result<(), SynthesisError> {
    let mut sum = FpVar::<F>::zero();
    let mut factor = F::one();
    for byte in bytes.iter().rev() {
        sum += byte * FpVar::constant(factor);
        factor *= F::from(256u64);
    }
    sum.enforce_equal(value)
}
