//! Variable-length SHA-256.
//!
//! The buffer has a fixed capacity (a multiple of 64) but the hashed message
//! is the logical prefix of `len` bytes. Padding (0x80, zeros, 64-bit bit
//! length) is placed in-circuit from `len`, every block is compressed, and
//! the digest is selected at the block where the message actually ends. A
//! hinted block count is bounded by `64 * nb - (len + 9) ∈ [0, 64)` and by
//! the requirement that exactly one block selector fires.
//!
//! Words are little-endian boolean vectors; rotations are free index
//! permutations and modular additions go through field recomposition.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;

use crate::utils::bytes::byte_from_bits;
use crate::utils::logic::{equal, le_bits_to_fp, less_than, to_bits_checked};

type Word<F> = Vec<Boolean<F>>;

#[rustfmt::skip]
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

const H_INIT: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

fn const_word<F: PrimeField>(x: u32) -> Word<F> {
    (0..32).map(|i| Boolean::constant((x >> i) & 1 == 1)).collect()
}

fn rotr<F: PrimeField>(w: &Word<F>, by: usize) -> Word<F> {
    (0..32).map(|i| w[(i + by) % 32].clone()).collect()
}

fn shr<F: PrimeField>(w: &Word<F>, by: usize) -> Word<F> {
    (0..32)
        .map(|i| {
            if i + by < 32 {
                w[i + by].clone()
            } else {
                Boolean::constant(false)
            }
        })
        .collect()
}

fn xor3<F: PrimeField>(a: &Word<F>, b: &Word<F>, c: &Word<F>) -> Result<Word<F>, SynthesisError> {
    (0..32).map(|i| a[i].xor(&b[i])?.xor(&c[i])).collect()
}

/// ch(e, f, g) = (e & f) ^ (!e & g)
fn ch<F: PrimeField>(e: &Word<F>, f: &Word<F>, g: &Word<F>) -> Result<Word<F>, SynthesisError> {
    (0..32)
        .map(|i| {
            let ef = e[i].and(&f[i])?;
            let neg = e[i].xor(&Boolean::constant(true))?.and(&g[i])?;
            ef.xor(&neg)
        })
        .collect()
}

/// maj(a, b, c) = (a & b) ^ (a & c) ^ (b & c)
fn maj<F: PrimeField>(a: &Word<F>, b: &Word<F>, c: &Word<F>) -> Result<Word<F>, SynthesisError> {
    (0..32)
        .map(|i| {
            let ab = a[i].and(&b[i])?;
            let ac = a[i].and(&c[i])?;
            let bc = b[i].and(&c[i])?;
            ab.xor(&ac)?.xor(&bc)
        })
        .collect()
}

/// Reduces an unreduced sum (known `< 2^nbits`) modulo 2^32, returning the
/// low word.
fn reduce32<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    sum: &FpVar<F>,
    nbits: usize,
) -> Result<Word<F>, SynthesisError> {
    let bits = to_bits_checked(cs, sum, nbits)?;
    Ok(bits[..32].to_vec())
}

fn compress<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    state: &[Word<F>; 8],
    block: &[Word<F>; 16],
) -> Result<[Word<F>; 8], SynthesisError> {
    let mut w: Vec<Word<F>> = block.to_vec();
    for t in 16..64 {
        let s0 = xor3(&rotr(&w[t - 15], 7), &rotr(&w[t - 15], 18), &shr(&w[t - 15], 3))?;
        let s1 = xor3(&rotr(&w[t - 2], 17), &rotr(&w[t - 2], 19), &shr(&w[t - 2], 10))?;
        let sum = le_bits_to_fp(&s1) + le_bits_to_fp(&w[t - 7]) + le_bits_to_fp(&s0)
            + le_bits_to_fp(&w[t - 16]);
        w.push(reduce32(cs.clone(), &sum, 34)?);
    }

    let mut a = state[0].clone();
    let mut b = state[1].clone();
    let mut c = state[2].clone();
    let mut d = state[3].clone();
    let mut e = state[4].clone();
    let mut f = state[5].clone();
    let mut g = state[6].clone();
    let mut h = state[7].clone();

    for t in 0..64 {
        let big_s1 = xor3(&rotr(&e, 6), &rotr(&e, 11), &rotr(&e, 25))?;
        let ch_efg = ch(&e, &f, &g)?;
        let t1 = le_bits_to_fp(&h)
            + le_bits_to_fp(&big_s1)
            + le_bits_to_fp(&ch_efg)
            + FpVar::constant(F::from(K[t] as u64))
            + le_bits_to_fp(&w[t]);
        let big_s0 = xor3(&rotr(&a, 2), &rotr(&a, 13), &rotr(&a, 22))?;
        let maj_abc = maj(&a, &b, &c)?;
        let t2 = le_bits_to_fp(&big_s0) + le_bits_to_fp(&maj_abc);

        let new_e = reduce32(cs.clone(), &(le_bits_to_fp(&d) + &t1), 36)?;
        let new_a = reduce32(cs.clone(), &(&t1 + &t2), 36)?;

        h = g;
        g = f;
        f = e;
        e = new_e;
        d = c;
        c = b;
        b = a;
        a = new_a;
    }

    let out = [a, b, c, d, e, f, g, h];
    let mut next = Vec::with_capacity(8);
    for (s, v) in state.iter().zip(out.iter()) {
        let sum = le_bits_to_fp(s) + le_bits_to_fp(v);
        next.push(reduce32(cs.clone(), &sum, 33)?);
    }
    Ok(next.try_into().map_err(|_| SynthesisError::Unsatisfiable)?)
}

fn fp_to_usize<F: PrimeField>(v: F) -> usize {
    let b: BigUint = v.into();
    b.to_u64_digits().first().copied().unwrap_or(0) as usize
}

fn index_bits(cap: usize) -> usize {
    (usize::BITS - cap.leading_zeros()) as usize
}

/// SHA-256 of the first `len` bytes of `bytes` (capacity a multiple of 64,
/// with `len + 9 <= capacity`). Returns the 32 digest bytes.
pub fn sha256_var_digest<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    bytes: &[FpVar<F>],
    len: &FpVar<F>,
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    let cap = bytes.len();
    assert_eq!(cap % 64, 0, "capacity must be a multiple of 64");
    let max_blocks = cap / 64;
    let n = index_bits(cap);

    // Hinted number of blocks covering message + padding.
    let nb = FpVar::new_witness(cs.clone(), || {
        len.value().map(|l| F::from(((fp_to_usize(l) + 9 + 63) / 64) as u64))
    })?;
    // 64 * nb - (len + 9) in [0, 64)
    let diff = &nb * FpVar::constant(F::from(64u64)) - len - FpVar::constant(F::from(9u64));
    to_bits_checked(cs.clone(), &diff, 6)?;

    // Exactly one block selector fires, bounding nb to [1, max_blocks].
    let mut selector_sum = FpVar::<F>::zero();
    let mut block_selectors = Vec::with_capacity(max_blocks);
    for j in 0..max_blocks {
        let sel = equal(&nb, &FpVar::constant(F::from((j + 1) as u64)))?;
        selector_sum += &sel;
        block_selectors.push(sel);
    }
    selector_sum.enforce_equal(&FpVar::constant(F::one()))?;

    // Big-endian 64-bit message length in bits; only the low 32 bits can be
    // nonzero for any supported capacity.
    let bit_len = len * FpVar::constant(F::from(8u64));
    let bit_len_bits = to_bits_checked(cs.clone(), &bit_len, 32)?;
    let len_bytes: Vec<FpVar<F>> = (0..4)
        .map(|j| byte_from_bits(&bit_len_bits[8 * (3 - j)..8 * (3 - j) + 8]))
        .collect();

    // Padded message bytes.
    let mut padded_bits: Vec<Vec<Boolean<F>>> = Vec::with_capacity(cap);
    for (i, byte) in bytes.iter().enumerate() {
        let i_const = FpVar::constant(F::from(i as u64));
        let is_msg = less_than(cs.clone(), n, &i_const, len)?;
        let is_pad_one = equal(&i_const, len)?;

        let mut v = byte * &is_msg + &is_pad_one * FpVar::constant(F::from(0x80u64));
        for (j, len_byte) in len_bytes.iter().enumerate() {
            let pos = &nb * FpVar::constant(F::from(64u64))
                - FpVar::constant(F::from((4 - j) as u64));
            let here = equal(&i_const, &pos)?;
            v += &here * len_byte;
        }
        padded_bits.push(to_bits_checked(cs.clone(), &v, 8)?);
    }

    // Compress every block, remembering each intermediate state as field
    // elements for the final selection.
    let mut state: [Word<F>; 8] = H_INIT.map(const_word);
    let mut states_fp: Vec<[FpVar<F>; 8]> = Vec::with_capacity(max_blocks);
    for j in 0..max_blocks {
        let mut block = Vec::with_capacity(16);
        for t in 0..16 {
            let base = 64 * j + 4 * t;
            let mut word: Word<F> = Vec::with_capacity(32);
            for byte in (0..4).rev() {
                word.extend_from_slice(&padded_bits[base + byte]);
            }
            block.push(word);
        }
        let block: [Word<F>; 16] = block.try_into().map_err(|_| SynthesisError::Unsatisfiable)?;
        state = compress(cs.clone(), &state, &block)?;
        let fps: [FpVar<F>; 8] = core::array::from_fn(|wi| le_bits_to_fp(&state[wi]));
        states_fp.push(fps);
    }

    // digest word w = state after block nb.
    let mut digest = Vec::with_capacity(32);
    for wi in 0..8 {
        let mut word = FpVar::<F>::zero();
        for (j, sel) in block_selectors.iter().enumerate() {
            word += sel * &states_fp[j][wi];
        }
        let bits = to_bits_checked(cs.clone(), &word, 32)?;
        for b in 0..4 {
            digest.push(byte_from_bits(&bits[8 * (3 - b)..8 * (3 - b) + 8]));
        }
    }
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;
    use sha2::{Digest, Sha256};

    #[test]
    fn digest_matches_reference_for_logical_lengths() {
        let cap = 128;
        let data: Vec<u8> = (0..cap as u32).map(|i| (i * 7 + 3) as u8).collect();
        for len in [0usize, 3, 55, 56, 64, 100] {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let bytes: Vec<FpVar<Fr>> = data
                .iter()
                .map(|&b| FpVar::new_witness(cs.clone(), || Ok(Fr::from(b as u64))).unwrap())
                .collect();
            let len_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(len as u64))).unwrap();
            let digest = sha256_var_digest(cs.clone(), &bytes, &len_var).unwrap();

            let expected = Sha256::digest(&data[..len]);
            for (var, &b) in digest.iter().zip(expected.iter()) {
                assert_eq!(var.value().unwrap(), Fr::from(b as u64), "len = {len}");
            }
            assert!(cs.is_satisfied().unwrap(), "len = {len}");
        }
    }

    #[test]
    fn tampered_length_hint_is_unsatisfiable() {
        // Force a block count that disagrees with the bound check.
        let cap = 128;
        let cs = ConstraintSystem::<Fr>::new_ref();
        let bytes: Vec<FpVar<Fr>> = (0..cap)
            .map(|i| FpVar::new_witness(cs.clone(), || Ok(Fr::from(i as u64 % 251))).unwrap())
            .collect();
        // len = 200 > cap - 9: no valid nb <= max_blocks exists.
        let len_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(200u64))).unwrap();
        let _ = sha256_var_digest(cs.clone(), &bytes, &len_var).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
