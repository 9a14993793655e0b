//! Top-level login circuit.
//!
//! Satisfiable iff the prover holds a payload whose iss/aud/sub/nonce claims
//! match the committed values, a header with the expected typ/alg/kid shape,
//! an RSA-PKCS1v1.5 signature by the identity provider over
//! `base64url(header).base64url(payload)`, a nonce equal to the Poseidon
//! commitment of the ephemeral key and randomness, and an address commitment
//! over iss ∥ aud ∥ sub ∥ salt.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::circuits::base64::encode_base64url;
use crate::circuits::commitment::{fold_digest_var, nonce_commitment_var, poseidon_hash_var};
use crate::circuits::jwt::constants::{JwtParams, NONCE_B64_LEN};
use crate::circuits::jwt::JwtVerifier;
use crate::circuits::rsa::{limbs_of, verify_pkcs1v15_sha256, BigUintVar, LIMB_BITS};
use crate::hints::alloc_field_bytes;
use crate::utils::bytes::ByteBuf;
use crate::utils::logic::to_bits_checked;

/// Bytes packed into one scalar chunk; 31 bytes always fit a 254-bit field.
pub const ELEMENT_SIZE: usize = 31;
pub const MAX_EPH_PUB_KEY_BYTES: usize = 64;
pub const MAX_EPH_PUB_KEY_CHUNKS: usize =
    (MAX_EPH_PUB_KEY_BYTES + ELEMENT_SIZE - 1) / ELEMENT_SIZE;

/// Canonical provider modulus size.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Which values are exposed as Groth16 public inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicInputsMode {
    /// Modulus limbs, ephemeral key chunks, header bytes, kid bytes and the
    /// address commitment are direct public inputs.
    Direct,
    /// A single Poseidon hash binds all of the above (plus the folded token
    /// hash); everything else stays in the witness.
    Aggregated,
}

#[derive(Clone)]
pub struct ZkLoginCircuit<F: PrimeField> {
    pub params: JwtParams,
    pub rsa_modulus_bits: usize,
    pub mode: PublicInputsMode,

    // Public side (witness in Aggregated mode).
    pub idp_pub_key_n: BigUint,
    pub eph_pub_key: Vec<F>,
    pub jwt_header_json: Vec<u8>,
    pub kid_value: Vec<u8>,
    pub zk_addr: F,
    /// The aggregate commitment; only read in Aggregated mode.
    pub public_input_hash: F,

    // Private inputs.
    pub jwt_payload_json: Vec<u8>,
    pub iss_value: Vec<u8>,
    pub aud_value: Vec<u8>,
    pub sub_value: Vec<u8>,
    pub jwt_signature: BigUint,
    pub jwt_randomness: F,
    pub user_salt: F,
}

impl<F: PrimeField> ZkLoginCircuit<F> {
    /// Zero-valued assignment with the right shapes, for compilation and
    /// setup.
    pub fn blank(params: &JwtParams, rsa_modulus_bits: usize, mode: PublicInputsMode) -> Self {
        Self {
            params: params.clone(),
            rsa_modulus_bits,
            mode,
            idp_pub_key_n: BigUint::default(),
            eph_pub_key: vec![F::zero(); MAX_EPH_PUB_KEY_CHUNKS],
            jwt_header_json: vec![0; params.max_header_json_len],
            kid_value: vec![0; params.max_kid_value_len],
            zk_addr: F::zero(),
            public_input_hash: F::zero(),
            jwt_payload_json: vec![0; params.max_payload_json_len],
            iss_value: vec![0; params.max_iss_value_len],
            aud_value: vec![0; params.max_aud_value_len],
            sub_value: vec![0; params.max_sub_value_len],
            jwt_signature: BigUint::default(),
            jwt_randomness: F::zero(),
            user_salt: F::zero(),
        }
    }

    /// Public input vector in allocation order, for Groth16 verification.
    pub fn public_inputs(&self) -> Vec<F> {
        match self.mode {
            PublicInputsMode::Direct => {
                let mut inputs = Vec::new();
                inputs.extend(
                    limbs_of(&self.idp_pub_key_n, self.rsa_modulus_bits / LIMB_BITS)
                        .iter()
                        .map(|&l| F::from(l)),
                );
                inputs.extend_from_slice(&self.eph_pub_key);
                inputs.extend(self.jwt_header_json.iter().map(|&b| F::from(b as u64)));
                inputs.extend(self.kid_value.iter().map(|&b| F::from(b as u64)));
                inputs.push(self.zk_addr);
                inputs
            }
            PublicInputsMode::Aggregated => vec![self.public_input_hash],
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for ZkLoginCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        self.params.validate();
        assert_eq!(self.rsa_modulus_bits % LIMB_BITS, 0);
        assert_eq!(self.eph_pub_key.len(), MAX_EPH_PUB_KEY_CHUNKS);
        let num_limbs = self.rsa_modulus_bits / LIMB_BITS;
        let direct = self.mode == PublicInputsMode::Direct;

        // Public-side values, in the order `public_inputs` reports them.
        let modulus = if direct {
            BigUintVar::new_input(cs.clone(), &self.idp_pub_key_n, num_limbs)?
        } else {
            BigUintVar::new_witness(cs.clone(), &self.idp_pub_key_n, num_limbs)?
        };
        let eph_pub_key: Vec<FpVar<F>> = self
            .eph_pub_key
            .iter()
            .map(|&chunk| {
                if direct {
                    FpVar::new_input(cs.clone(), || Ok(chunk))
                } else {
                    FpVar::new_witness(cs.clone(), || Ok(chunk))
                }
            })
            .collect::<Result<_, _>>()?;
        let header = if direct {
            ByteBuf::new_input(cs.clone(), &self.jwt_header_json)?
        } else {
            ByteBuf::new_witness(cs.clone(), &self.jwt_header_json)?
        };
        let kid = if direct {
            ByteBuf::new_input(cs.clone(), &self.kid_value)?
        } else {
            ByteBuf::new_witness(cs.clone(), &self.kid_value)?
        };
        let zk_addr_input = if direct {
            Some(FpVar::new_input(cs.clone(), || Ok(self.zk_addr))?)
        } else {
            None
        };
        let aggregate_input = if direct {
            None
        } else {
            Some(FpVar::new_input(cs.clone(), || Ok(self.public_input_hash))?)
        };

        // Private inputs.
        let payload = ByteBuf::new_witness(cs.clone(), &self.jwt_payload_json)?;
        let iss = ByteBuf::new_witness(cs.clone(), &self.iss_value)?;
        let aud = ByteBuf::new_witness(cs.clone(), &self.aud_value)?;
        let sub = ByteBuf::new_witness(cs.clone(), &self.sub_value)?;
        let signature = BigUintVar::new_witness(cs.clone(), &self.jwt_signature, num_limbs)?;
        let randomness = FpVar::new_witness(cs.clone(), || Ok(self.jwt_randomness))?;
        let salt = FpVar::new_witness(cs.clone(), || Ok(self.user_salt))?;

        // 1. Nonce commitment, decomposed to bytes and encoded into the
        //    expected `"nonce":"<base64url>"` claim value.
        let nonce = nonce_commitment_var(cs.clone(), &eph_pub_key, &randomness)?;
        let nonce_bytes = alloc_field_bytes(cs.clone(), &nonce)?;
        let mut nonce_bits = Vec::with_capacity(33);
        for byte in &nonce_bytes {
            nonce_bits.push(to_bits_checked(cs.clone(), byte, 8)?);
        }
        // Alignment byte; the encoder needs 3-byte groups and the stray
        // 44th character is dropped below.
        nonce_bits.push(vec![Boolean::constant(false); 8]);
        let nonce_b64 = encode_base64url(&nonce_bits)?;
        let quote = FpVar::constant(F::from(b'"' as u64));
        let mut nonce_value = Vec::with_capacity(NONCE_B64_LEN + 2);
        nonce_value.push(quote.clone());
        nonce_value.extend(nonce_b64[..NONCE_B64_LEN].iter().cloned());
        nonce_value.push(quote);

        // 2. JWT structure: locate fields via hints, verify bytes and
        //    separators against the committed values.
        let verifier = JwtVerifier::new(
            cs.clone(),
            &self.params,
            &self.jwt_header_json,
            &self.jwt_payload_json,
            &kid.vals,
            &iss.vals,
            &aud.vals,
            &sub.vals,
            &nonce_value,
        )?;
        verifier.verify_header(cs.clone(), &header.vals)?;
        verifier.verify_payload(cs.clone(), &payload.vals)?;

        // 3. Recompute the token hash and verify the provider signature.
        let digest = verifier.pack_and_hash(cs.clone(), &header, &payload)?;
        verify_pkcs1v15_sha256(cs.clone(), &digest, &signature, &modulus)?;

        // 4. Address commitment over iss ∥ aud ∥ sub ∥ salt.
        let mut address_inputs = Vec::with_capacity(iss.len() + aud.len() + sub.len() + 1);
        address_inputs.extend(iss.vals.iter().cloned());
        address_inputs.extend(aud.vals.iter().cloned());
        address_inputs.extend(sub.vals.iter().cloned());
        address_inputs.push(salt);
        let zk_addr = poseidon_hash_var(cs.clone(), &address_inputs)?;

        match self.mode {
            PublicInputsMode::Direct => zk_addr.enforce_equal(&zk_addr_input.unwrap()),
            PublicInputsMode::Aggregated => {
                let jwt_hash = fold_digest_var(&digest);
                let mut inputs = Vec::new();
                inputs.extend(modulus.limbs.iter().cloned());
                inputs.extend(eph_pub_key.iter().cloned());
                inputs.extend(header.vals.iter().cloned());
                inputs.extend(kid.vals.iter().cloned());
                inputs.push(zk_addr);
                inputs.push(jwt_hash);
                let aggregate = poseidon_hash_var(cs, &inputs)?;
                aggregate.enforce_equal(&aggregate_input.unwrap())
            }
        }
    }
}
