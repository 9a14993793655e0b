//! Poseidon commitments: nonce binding, address binding, and the aggregate
//! public hash. Native and in-circuit hashing share one parameter set so the
//! prover-side derivations reproduce the constrained values exactly.

use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::{Absorb, CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;

pub fn poseidon_config<F: PrimeField>() -> PoseidonConfig<F> {
    let rate = 2;
    let capacity = 1;
    let full_rounds = 8;
    let partial_rounds = 57;
    let alpha = 5;
    let (ark, mds) = find_poseidon_ark_and_mds::<F>(
        F::MODULUS_BIT_SIZE as u64,
        rate,
        full_rounds as u64,
        partial_rounds as u64,
        0,
    );
    PoseidonConfig {
        full_rounds,
        partial_rounds,
        alpha,
        ark,
        mds,
        rate,
        capacity,
    }
}

pub fn poseidon_hash<F: PrimeField + Absorb>(inputs: &[F]) -> F {
    let config = poseidon_config::<F>();
    let mut sponge = PoseidonSponge::new(&config);
    for x in inputs {
        sponge.absorb(x);
    }
    sponge.squeeze_native_field_elements(1)[0]
}

pub fn poseidon_hash_var<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    inputs: &[FpVar<F>],
) -> Result<FpVar<F>, SynthesisError> {
    let config = poseidon_config::<F>();
    let mut sponge = PoseidonSpongeVar::new(cs, &config);
    for x in inputs {
        sponge.absorb(x)?;
    }
    Ok(sponge.squeeze_field_elements(1)?.remove(0))
}

/// Nonce commitment: Poseidon over the ephemeral-key chunks and the token
/// randomness.
pub fn nonce_commitment_var<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    eph_key_chunks: &[FpVar<F>],
    randomness: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let mut inputs = eph_key_chunks.to_vec();
    inputs.push(randomness.clone());
    poseidon_hash_var(cs, &inputs)
}

/// Native counterpart of [`nonce_commitment_var`].
pub fn derive_nonce<F: PrimeField + Absorb>(eph_key_chunks: &[F], randomness: F) -> F {
    let mut inputs = eph_key_chunks.to_vec();
    inputs.push(randomness);
    poseidon_hash(&inputs)
}

/// Address commitment: Poseidon over the zero-padded iss/aud/sub value
/// buffers (one absorbed element per byte) and the user salt.
pub fn derive_zk_addr<F: PrimeField + Absorb>(
    iss_padded: &[u8],
    aud_padded: &[u8],
    sub_padded: &[u8],
    salt: F,
) -> F {
    let mut inputs: Vec<F> = Vec::with_capacity(iss_padded.len() + aud_padded.len() + sub_padded.len() + 1);
    for &b in iss_padded.iter().chain(aud_padded).chain(sub_padded) {
        inputs.push(F::from(b as u64));
    }
    inputs.push(salt);
    poseidon_hash(&inputs)
}

/// Folds digest bytes 1..32 (the top byte dropped) big-endian into a single
/// field element.
pub fn fold_digest_var<F: PrimeField>(digest: &[FpVar<F>]) -> FpVar<F> {
    assert_eq!(digest.len(), 32);
    let mut acc = FpVar::<F>::zero();
    let mut factor = F::one();
    for byte in digest[1..].iter().rev() {
        acc += byte * FpVar::constant(factor);
        factor *= F::from(256u64);
    }
    acc
}

/// Native counterpart of [`fold_digest_var`].
pub fn fold_digest<F: PrimeField>(digest: &[u8; 32]) -> F {
    F::from(BigUint::from_bytes_be(&digest[1..]))
}

/// Aggregate public hash binding everything the verifier needs into one
/// input: modulus limbs, ephemeral-key chunks, header bytes, kid bytes, the
/// address commitment and the folded token hash.
pub fn aggregate_public_hash<F: PrimeField + Absorb>(
    modulus_limbs: &[u64],
    eph_key_chunks: &[F],
    header_padded: &[u8],
    kid_padded: &[u8],
    zk_addr: F,
    jwt_hash: F,
) -> F {
    let mut inputs: Vec<F> = Vec::new();
    inputs.extend(modulus_limbs.iter().map(|&l| F::from(l)));
    inputs.extend_from_slice(eph_key_chunks);
    inputs.extend(header_padded.iter().map(|&b| F::from(b as u64)));
    inputs.extend(kid_padded.iter().map(|&b| F::from(b as u64)));
    inputs.push(zk_addr);
    inputs.push(jwt_hash);
    poseidon_hash(&inputs)
}
