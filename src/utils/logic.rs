//! Comparison and selection helpers shared by the circuit modules.
//!
//! Conditional behavior is always expressed algebraically: selectors are 0/1
//! field wires multiplied into values, never control flow.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Returns 1 if `a == b`, 0 otherwise.
pub fn equal<F: PrimeField>(a: &FpVar<F>, b: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    Ok(FpVar::from(a.is_eq(b)?))
}

/// Returns 1 if `a == c`, 0 otherwise.
pub fn equal_const<F: PrimeField>(a: &FpVar<F>, c: u64) -> Result<FpVar<F>, SynthesisError> {
    equal(a, &FpVar::constant(F::from(c)))
}

/// Returns 1 if `a == 0`, 0 otherwise.
pub fn not<F: PrimeField>(a: &FpVar<F>) -> FpVar<F> {
    FpVar::constant(F::one()) - a
}

/// Boolean negation without relying on operator impls.
pub fn b_not<F: PrimeField>(b: &Boolean<F>) -> Result<Boolean<F>, SynthesisError> {
    b.xor(&Boolean::constant(true))
}

/// 2^n as a field constant.
pub fn pow2<F: PrimeField>(n: usize) -> F {
    let mut c = F::one();
    for _ in 0..n {
        c.double_in_place();
    }
    c
}

/// Recomposes little-endian bits into a field element. Purely linear.
pub fn le_bits_to_fp<F: PrimeField>(bits: &[Boolean<F>]) -> FpVar<F> {
    let mut acc = FpVar::<F>::zero();
    let mut coeff = F::one();
    for bit in bits {
        acc += FpVar::from(bit.clone()) * FpVar::constant(coeff);
        coeff.double_in_place();
    }
    acc
}

/// Decomposes `v` into `n` little-endian boolean wires and enforces that the
/// recomposition equals `v`. Unsatisfiable when `v >= 2^n`, so this doubles as
/// a range check.
pub fn to_bits_checked<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    v: &FpVar<F>,
    n: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    let mut bits = Vec::with_capacity(n);
    for i in 0..n {
        bits.push(Boolean::new_witness(cs.clone(), || {
            v.value().map(|x| x.into_bigint().get_bit(i))
        })?);
    }
    le_bits_to_fp(&bits).enforce_equal(v)?;
    Ok(bits)
}

/// Returns 1 if `a < b`, 0 otherwise, for `a, b < 2^n`.
///
/// Computes `a + 2^n - b` and reads the carry bit, the same construction the
/// rest of the circuit uses for every bound check.
pub fn less_than<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    n: usize,
    a: &FpVar<F>,
    b: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let shifted = a + FpVar::constant(pow2::<F>(n)) - b;
    let bits = to_bits_checked(cs, &shifted, n + 1)?;
    // Top bit set means a >= b.
    Ok(not(&FpVar::from(bits[n].clone())))
}

/// Returns `value < c` given the little-endian bits of `value`.
pub fn lt_const<F: PrimeField>(
    bits_le: &[Boolean<F>],
    c: u64,
) -> Result<Boolean<F>, SynthesisError> {
    let n = bits_le.len();
    let mut result = Boolean::constant(false);
    let mut eq_prefix = Boolean::constant(true);
    for k in (0..n).rev() {
        let b_k = &bits_le[k];
        if (c >> k) & 1 == 1 {
            let hit = eq_prefix.and(&b_not(b_k)?)?;
            result = result.or(&hit)?;
            eq_prefix = eq_prefix.and(b_k)?;
        } else {
            eq_prefix = eq_prefix.and(&b_not(b_k)?)?;
        }
    }
    Ok(result)
}

/// Returns `value == c` given the little-endian bits of `value`.
pub fn eq_const<F: PrimeField>(
    bits_le: &[Boolean<F>],
    c: u64,
) -> Result<Boolean<F>, SynthesisError> {
    let mut eq = Boolean::constant(true);
    for (k, b_k) in bits_le.iter().enumerate() {
        let matches = if (c >> k) & 1 == 1 {
            b_k.clone()
        } else {
            b_not(b_k)?
        };
        eq = eq.and(&matches)?;
    }
    Ok(eq)
}

/// Enforces `v * (v - 1) == 0`.
pub fn enforce_boolean<F: PrimeField>(v: &FpVar<F>) -> Result<(), SynthesisError> {
    let zero = FpVar::<F>::zero();
    (v * (v - FpVar::constant(F::one()))).enforce_equal(&zero)
}
