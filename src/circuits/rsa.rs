//! RSASSA-PKCS1-v1_5 verification over an emulated big integer.
//!
//! Values are little-endian vectors of 64-bit limbs. A modular product
//! `a * b = q * n + r` is verified through the limb convolution of both
//! sides: the per-position differences are chained with signed carries, each
//! carry range-checked through a shifted witness, and the final carry forced
//! to zero. The public exponent is hardcoded to 65537 (16 squarings and one
//! multiplication).
//!
//! Intermediate residues are only bounded to the limb width, which preserves
//! the congruence class; the mandatory `0x00 0x01` layout prefix pins the
//! final residue below the modulus.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, Zero};

use crate::utils::bytes::byte_from_bits;
use crate::utils::logic::{pow2, to_bits_checked};

pub const LIMB_BITS: usize = 64;
/// Carries in the convolution check stay below 2^CARRY_BOUND in magnitude
/// for up to 64 limbs.
const CARRY_BOUND: usize = 71;

/// DER prefix identifying SHA-256 inside the PKCS#1 v1.5 encoding.
pub const SHA256_DER_PREFIX: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];

/// Little-endian 64-bit limbs of `value`, padded to `num_limbs`.
pub fn limbs_of(value: &BigUint, num_limbs: usize) -> Vec<u64> {
    let mut digits = value.to_u64_digits();
    assert!(digits.len() <= num_limbs, "value exceeds limb capacity");
    digits.resize(num_limbs, 0);
    digits
}

/// Multi-limb big integer wire. Every limb carries its verified 64-bit
/// decomposition.
pub struct BigUintVar<F: PrimeField> {
    pub limbs: Vec<FpVar<F>>,
    limb_bits: Vec<Vec<Boolean<F>>>,
}

impl<F: PrimeField> BigUintVar<F> {
    pub fn new_witness(
        cs: ConstraintSystemRef<F>,
        value: &BigUint,
        num_limbs: usize,
    ) -> Result<Self, SynthesisError> {
        Self::alloc(cs, value, num_limbs, false)
    }

    pub fn new_input(
        cs: ConstraintSystemRef<F>,
        value: &BigUint,
        num_limbs: usize,
    ) -> Result<Self, SynthesisError> {
        Self::alloc(cs, value, num_limbs, true)
    }

    fn alloc(
        cs: ConstraintSystemRef<F>,
        value: &BigUint,
        num_limbs: usize,
        public: bool,
    ) -> Result<Self, SynthesisError> {
        let native = limbs_of(value, num_limbs);
        let mut limbs = Vec::with_capacity(num_limbs);
        let mut limb_bits = Vec::with_capacity(num_limbs);
        for &l in &native {
            let v = if public {
                FpVar::new_input(cs.clone(), || Ok(F::from(l)))?
            } else {
                FpVar::new_witness(cs.clone(), || Ok(F::from(l)))?
            };
            limb_bits.push(to_bits_checked(cs.clone(), &v, LIMB_BITS)?);
            limbs.push(v);
        }
        Ok(Self { limbs, limb_bits })
    }

    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    /// Concrete value, available while proving.
    pub fn value(&self) -> Option<BigUint> {
        let mut acc = BigUint::zero();
        for limb in self.limbs.iter().rev() {
            let v: BigUint = limb.value().ok()?.into();
            acc = (acc << LIMB_BITS) | v;
        }
        Some(acc)
    }

    /// Big-endian byte wires (num_limbs * 8 of them). Linear only; reuses the
    /// limb decompositions.
    pub fn to_bytes_be(&self) -> Vec<FpVar<F>> {
        let n_bytes = self.num_limbs() * 8;
        let mut out = Vec::with_capacity(n_bytes);
        for m in 0..n_bytes {
            let lsb_index = n_bytes - 1 - m;
            let limb = lsb_index / 8;
            let byte = lsb_index % 8;
            out.push(byte_from_bits(&self.limb_bits[limb][8 * byte..8 * byte + 8]));
        }
        out
    }

    /// Verified `self * other mod modulus`.
    pub fn mul_mod(
        &self,
        cs: ConstraintSystemRef<F>,
        other: &Self,
        modulus: &Self,
    ) -> Result<Self, SynthesisError> {
        let l = self.num_limbs();
        assert_eq!(other.num_limbs(), l);
        assert_eq!(modulus.num_limbs(), l);

        // Hint quotient and remainder from the cleartext values.
        let parts = match (self.value(), other.value(), modulus.value()) {
            (Some(a), Some(b), Some(n)) if !n.is_zero() => {
                let p = &a * &b;
                Some((&p / &n, &p % &n))
            }
            _ => None,
        };
        let (q_value, r_value) = parts.unwrap_or_default();
        let q = Self::new_witness(cs.clone(), &q_value, l)?;
        let r = Self::new_witness(cs.clone(), &r_value, l)?;

        // Native carry chain for the convolution difference.
        let carries = Self::native_carries(self, other, &q, modulus, &r);

        let mut carry = FpVar::<F>::zero();
        let offset = pow2::<F>(CARRY_BOUND);
        let radix = FpVar::constant(pow2::<F>(LIMB_BITS));
        for k in 0..(2 * l - 1) {
            let mut t = FpVar::<F>::zero();
            let mut u = FpVar::<F>::zero();
            for i in k.saturating_sub(l - 1)..=k.min(l - 1) {
                t += &self.limbs[i] * &other.limbs[k - i];
                u += &q.limbs[i] * &modulus.limbs[k - i];
            }
            if k < l {
                u += &r.limbs[k];
            }

            let shifted = FpVar::new_witness(cs.clone(), || {
                carries
                    .as_ref()
                    .map(|c| {
                        let s = &c[k] + BigInt::from(BigUint::from(1u8) << CARRY_BOUND);
                        F::from(s.to_biguint().expect("carry out of range"))
                    })
                    .ok_or(SynthesisError::AssignmentMissing)
            })?;
            to_bits_checked(cs.clone(), &shifted, CARRY_BOUND + 1)?;
            let next_carry = shifted - FpVar::constant(offset);

            (t - u + &carry).enforce_equal(&(&next_carry * &radix))?;
            carry = next_carry;
        }
        carry.enforce_equal(&FpVar::zero())?;

        Ok(r)
    }

    fn native_carries(
        a: &Self,
        b: &Self,
        q: &Self,
        n: &Self,
        r: &Self,
    ) -> Option<Vec<BigInt>> {
        let l = a.num_limbs();
        let av = a.limb_values()?;
        let bv = b.limb_values()?;
        let qv = q.limb_values()?;
        let nv = n.limb_values()?;
        let rv = r.limb_values()?;

        let mut carries = Vec::with_capacity(2 * l - 1);
        let mut carry = BigInt::zero();
        for k in 0..(2 * l - 1) {
            let mut acc = carry.clone();
            for i in k.saturating_sub(l - 1)..=k.min(l - 1) {
                acc += BigInt::from(av[i]) * BigInt::from(bv[k - i]);
                acc -= BigInt::from(qv[i]) * BigInt::from(nv[k - i]);
            }
            if k < l {
                acc -= BigInt::from(rv[k]);
            }
            debug_assert!((&acc % (BigInt::from(1u8) << LIMB_BITS)).abs() == BigInt::zero());
            carry = acc >> LIMB_BITS;
            carries.push(carry.clone());
        }
        Some(carries)
    }

    fn limb_values(&self) -> Option<Vec<u64>> {
        self.limbs
            .iter()
            .map(|l| {
                let v: BigUint = l.value().ok()?.into();
                Some(v.to_u64_digits().first().copied().unwrap_or(0))
            })
            .collect()
    }
}

/// `base^65537 mod modulus`.
pub fn mod_exp_65537<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    base: &BigUintVar<F>,
    modulus: &BigUintVar<F>,
) -> Result<BigUintVar<F>, SynthesisError> {
    let mut acc = base.mul_mod(cs.clone(), base, modulus)?;
    for _ in 1..16 {
        acc = acc.mul_mod(cs.clone(), &acc, modulus)?;
    }
    acc.mul_mod(cs, base, modulus)
}

/// Verifies `signature^65537 mod modulus` against the PKCS#1 v1.5 encoding
/// of the SHA-256 `digest` (32 byte wires). Any mismatch is unsatisfiable.
pub fn verify_pkcs1v15_sha256<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    digest: &[FpVar<F>],
    signature: &BigUintVar<F>,
    modulus: &BigUintVar<F>,
) -> Result<(), SynthesisError> {
    assert_eq!(digest.len(), 32);
    let em = mod_exp_65537(cs, signature, modulus)?;
    let em_bytes = em.to_bytes_be();

    let key_bytes = em_bytes.len();
    let padding_len = key_bytes - 2 - 1 - SHA256_DER_PREFIX.len() - 32;

    let expect = |b: &FpVar<F>, v: u8| b.enforce_equal(&FpVar::constant(F::from(v as u64)));

    expect(&em_bytes[0], 0x00)?;
    expect(&em_bytes[1], 0x01)?;
    let mut offset = 2;
    for _ in 0..padding_len {
        expect(&em_bytes[offset], 0xff)?;
        offset += 1;
    }
    expect(&em_bytes[offset], 0x00)?;
    offset += 1;
    for &b in SHA256_DER_PREFIX.iter() {
        expect(&em_bytes[offset], b)?;
        offset += 1;
    }
    for b in digest.iter() {
        em_bytes[offset].enforce_equal(b)?;
        offset += 1;
    }
    Ok(())
}

/// Builds the PKCS#1 v1.5 encoding of a SHA-256 digest natively. Used by the
/// tests to produce signatures with a bare private exponent.
pub fn pkcs1v15_sha256_encode(digest: &[u8; 32], key_bytes: usize) -> BigUint {
    let mut em = Vec::with_capacity(key_bytes);
    em.push(0x00);
    em.push(0x01);
    em.resize(key_bytes - 1 - SHA256_DER_PREFIX.len() - 32, 0xff);
    em.push(0x00);
    em.extend_from_slice(&SHA256_DER_PREFIX);
    em.extend_from_slice(digest);
    debug_assert_eq!(em.len(), key_bytes);
    BigUint::from_bytes_be(&em)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;
    use num_bigint::BigUint;
    use num_traits::Num;
    use sha2::{Digest, Sha256};

    // Throwaway 512-bit RSA key, e = 65537.
    const N_512: &str = "ed802675708f3707adab5754374f46606fe66279864d819f35852f40c671f8193ab47071807feeefb39e300c1c8fef5ca2e6b520d1f15668da13823f99df1325";
    const D_512: &str = "c2455930276a7eb121364eb0ecad43fc0e8c7d70ba931bbc87a2f20c2247879048321e93b01a06faf9ea33d7f63f82d248b1d6270ec3168c31f47067b5ae7a01";

    fn hex(s: &str) -> BigUint {
        BigUint::from_str_radix(s, 16).unwrap()
    }

    fn digest_vars(
        cs: &ark_relations::r1cs::ConstraintSystemRef<Fr>,
        digest: &[u8; 32],
    ) -> Vec<FpVar<Fr>> {
        digest
            .iter()
            .map(|&b| FpVar::new_witness(cs.clone(), || Ok(Fr::from(b as u64))).unwrap())
            .collect()
    }

    #[test]
    fn mul_mod_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let n = hex(N_512);
        let a = &n - BigUint::from(12345u32);
        let b = &n - BigUint::from(99999u32);
        let av = BigUintVar::new_witness(cs.clone(), &a, 8).unwrap();
        let bv = BigUintVar::new_witness(cs.clone(), &b, 8).unwrap();
        let nv = BigUintVar::new_witness(cs.clone(), &n, 8).unwrap();
        let r = av.mul_mod(cs.clone(), &bv, &nv).unwrap();
        assert_eq!(r.value().unwrap(), (&a * &b) % &n);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn valid_signature_accepted_and_flipped_bit_rejected() {
        let n = hex(N_512);
        let d = hex(D_512);
        let digest: [u8; 32] = Sha256::digest(b"jwt packing test vector").into();
        let em = pkcs1v15_sha256_encode(&digest, 64);
        let signature = em.modpow(&d, &n);

        // Round trip sanity: s^e mod n reproduces the encoding.
        assert_eq!(signature.modpow(&BigUint::from(65537u32), &n), em);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let sig = BigUintVar::new_witness(cs.clone(), &signature, 8).unwrap();
        let modulus = BigUintVar::new_witness(cs.clone(), &n, 8).unwrap();
        let digest_v = digest_vars(&cs, &digest);
        verify_pkcs1v15_sha256(cs.clone(), &digest_v, &sig, &modulus).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let tampered = &signature ^ BigUint::from(1u8);
        let cs = ConstraintSystem::<Fr>::new_ref();
        let sig = BigUintVar::new_witness(cs.clone(), &tampered, 8).unwrap();
        let modulus = BigUintVar::new_witness(cs.clone(), &n, 8).unwrap();
        let digest_v = digest_vars(&cs, &digest);
        verify_pkcs1v15_sha256(cs.clone(), &digest_v, &sig, &modulus).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn wrong_digest_rejected() {
        let n = hex(N_512);
        let d = hex(D_512);
        let digest: [u8; 32] = Sha256::digest(b"signed message").into();
        let signature = pkcs1v15_sha256_encode(&digest, 64).modpow(&d, &n);

        let other: [u8; 32] = Sha256::digest(b"different message").into();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let sig = BigUintVar::new_witness(cs.clone(), &signature, 8).unwrap();
        let modulus = BigUintVar::new_witness(cs.clone(), &n, 8).unwrap();
        let digest_v = digest_vars(&cs, &other);
        verify_pkcs1v15_sha256(cs.clone(), &digest_v, &sig, &modulus).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
