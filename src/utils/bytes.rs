//! Fixed-capacity byte buffers inside the circuit and native chunking helpers.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;

use super::logic::{le_bits_to_fp, to_bits_checked};

/// A buffer of circuit bytes. Every byte carries its verified 8-bit
/// decomposition so downstream gadgets (base64, hashing) can reuse the bits
/// without decomposing again.
pub struct ByteBuf<F: PrimeField> {
    pub vals: Vec<FpVar<F>>,
    /// Little-endian bits per byte.
    pub bits: Vec<Vec<Boolean<F>>>,
}

impl<F: PrimeField> ByteBuf<F> {
    pub fn new_witness(
        cs: ConstraintSystemRef<F>,
        bytes: &[u8],
    ) -> Result<Self, SynthesisError> {
        Self::alloc(cs, bytes, false)
    }

    pub fn new_input(
        cs: ConstraintSystemRef<F>,
        bytes: &[u8],
    ) -> Result<Self, SynthesisError> {
        Self::alloc(cs, bytes, true)
    }

    fn alloc(
        cs: ConstraintSystemRef<F>,
        bytes: &[u8],
        public: bool,
    ) -> Result<Self, SynthesisError> {
        let mut vals = Vec::with_capacity(bytes.len());
        let mut bits = Vec::with_capacity(bytes.len());
        for &b in bytes {
            let v = if public {
                FpVar::new_input(cs.clone(), || Ok(F::from(b as u64)))?
            } else {
                FpVar::new_witness(cs.clone(), || Ok(F::from(b as u64)))?
            };
            bits.push(to_bits_checked(cs.clone(), &v, 8)?);
            vals.push(v);
        }
        Ok(Self { vals, bits })
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }
}

/// Turns in-circuit little-endian bits back into a byte wire. Linear only.
pub fn byte_from_bits<F: PrimeField>(bits: &[Boolean<F>]) -> FpVar<F> {
    debug_assert_eq!(bits.len(), 8);
    le_bits_to_fp(bits)
}

/// Splits `bytes` into big-endian chunks of `chunk_size` bytes, last chunk
/// short if the input is not aligned. Mirrors the element packing used for
/// the ephemeral public key.
pub fn bytes_to_chunks(bytes: &[u8], chunk_size: usize) -> Vec<BigUint> {
    bytes
        .chunks(chunk_size)
        .map(BigUint::from_bytes_be)
        .collect()
}

/// Copies `value` into a zero-padded buffer of length `cap`.
/// Callers validate `value.len() <= cap` beforehand.
pub fn pad_bytes(value: &[u8], cap: usize) -> Vec<u8> {
    let mut out = vec![0u8; cap];
    out[..value.len()].copy_from_slice(value);
    out
}

/// Strips the trailing null padding of a fixed-capacity buffer.
pub fn trim_nulls(buf: &[u8]) -> &[u8] {
    let end = buf
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |p| p + 1);
    &buf[..end]
}
