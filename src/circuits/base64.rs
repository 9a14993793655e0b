//! In-circuit base64url codec.
//!
//! Encoding regroups the input bits (most significant first) into 6-bit
//! chunks and maps each chunk to its ASCII character with range arithmetic
//! over the chunk's bits. Input lengths must be multiples of 3 bytes so the
//! 8-bit and 6-bit groupings share their boundaries; callers pad to that
//! alignment.
//!
//! Decoding mirrors the process, 4 characters to 3 bytes. Unrecognized
//! characters decode to 0 instead of failing: a forged character stream dies
//! at the hash and signature checks downstream, not here.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::utils::bytes::byte_from_bits;
use crate::utils::logic::{b_not, eq_const, le_bits_to_fp, lt_const, to_bits_checked};

/// Encodes `bytes_bits` (little-endian bits per byte, length a multiple of 3)
/// into base64url ASCII wires.
pub fn encode_base64url<F: PrimeField>(
    bytes_bits: &[Vec<Boolean<F>>],
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    assert_eq!(bytes_bits.len() % 3, 0, "input must be 3-byte aligned");

    // The bit stream in most-significant-first order.
    let stream = |t: usize| bytes_bits[t / 8][7 - t % 8].clone();

    let n_chars = bytes_bits.len() * 8 / 6;
    let mut out = Vec::with_capacity(n_chars);
    for g in 0..n_chars {
        // 6-bit chunk value, little-endian bits.
        let v_bits: Vec<Boolean<F>> = (0..6).map(|k| stream(6 * g + 5 - k)).collect();
        out.push(sextet_to_ascii(&v_bits)?);
    }
    Ok(out)
}

/// Maps a 6-bit value to its base64url character:
/// 0..26 -> 'A'..'Z', 26..52 -> 'a'..'z', 52..62 -> '0'..'9', 62 -> '-',
/// 63 -> '_'.
fn sextet_to_ascii<F: PrimeField>(v_bits: &[Boolean<F>]) -> Result<FpVar<F>, SynthesisError> {
    let v = le_bits_to_fp(v_bits);

    let lt26 = lt_const(v_bits, 26)?;
    let lt52 = lt_const(v_bits, 52)?;
    let lt62 = lt_const(v_bits, 62)?;
    let is_upper = FpVar::from(lt26.clone());
    let is_lower = FpVar::from(b_not(&lt26)?.and(&lt52)?);
    let is_digit = FpVar::from(b_not(&lt52)?.and(&lt62)?);
    let is_dash = FpVar::from(eq_const(v_bits, 62)?);
    let is_underscore = FpVar::from(eq_const(v_bits, 63)?);

    let c = |x: u64| FpVar::constant(F::from(x));
    Ok(&is_upper * (&v + c(65))
        + &is_lower * (&v + c(71))
        + &is_digit * (&v - c(4))
        + &is_dash * c(45)
        + &is_underscore * c(95))
}

/// Decodes base64url ASCII wires (length a multiple of 4) into bytes.
pub fn decode_base64url<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    chars: &[FpVar<F>],
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    assert_eq!(chars.len() % 4, 0, "input must be 4-char aligned");

    let mut sextets = Vec::with_capacity(chars.len());
    for ch in chars {
        let value = ascii_to_sextet(cs.clone(), ch)?;
        sextets.push(to_bits_checked(cs.clone(), &value, 6)?);
    }

    let mut out = Vec::with_capacity(chars.len() / 4 * 3);
    for q in sextets.chunks(4) {
        let (v0, v1, v2, v3) = (&q[0], &q[1], &q[2], &q[3]);
        // b0 = v0 << 2 | v1 >> 4
        let b0: Vec<Boolean<F>> = (0..8)
            .map(|k| if k < 2 { v1[k + 4].clone() } else { v0[k - 2].clone() })
            .collect();
        // b1 = (v1 & 0x0f) << 4 | v2 >> 2
        let b1: Vec<Boolean<F>> = (0..8)
            .map(|k| if k < 4 { v2[k + 2].clone() } else { v1[k - 4].clone() })
            .collect();
        // b2 = (v2 & 0x03) << 6 | v3
        let b2: Vec<Boolean<F>> = (0..8)
            .map(|k| if k < 6 { v3[k].clone() } else { v2[k - 6].clone() })
            .collect();
        out.push(byte_from_bits(&b0));
        out.push(byte_from_bits(&b1));
        out.push(byte_from_bits(&b2));
    }
    Ok(out)
}

/// Inverse alphabet map; characters outside the alphabet yield 0.
fn ascii_to_sextet<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    ch: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let bits = to_bits_checked(cs, ch, 8)?;

    let ge = |c: u64| -> Result<Boolean<F>, SynthesisError> { b_not(&lt_const(&bits, c)?) };
    let is_upper = ge(b'A' as u64)?.and(&lt_const(&bits, b'Z' as u64 + 1)?)?;
    let is_lower = ge(b'a' as u64)?.and(&lt_const(&bits, b'z' as u64 + 1)?)?;
    let is_digit = ge(b'0' as u64)?.and(&lt_const(&bits, b'9' as u64 + 1)?)?;
    let is_dash = eq_const(&bits, b'-' as u64)?;
    let is_underscore = eq_const(&bits, b'_' as u64)?;

    let c = |x: u64| FpVar::constant(F::from(x));
    Ok(FpVar::from(is_upper) * (ch - c(65))
        + FpVar::from(is_lower) * (ch - c(71))
        + FpVar::from(is_digit) * (ch + c(4))
        + FpVar::from(is_dash) * c(62)
        + FpVar::from(is_underscore) * c(63))
}
