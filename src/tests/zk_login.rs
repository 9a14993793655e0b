//! End-to-end circuit tests over synthetic provider-signed tokens.

use ark_bn254::{Bn254, Fr};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError,
};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use num_bigint::BigUint;
use num_traits::Num;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::circuits::commitment::{derive_nonce, nonce_commitment_var};
use crate::circuits::jwt::constants::JwtParams;
use crate::circuits::rsa::pkcs1v15_sha256_encode;
use crate::circuits::{PublicInputsMode, ZkLoginCircuit};
use crate::hints::field_bytes_hint;
use crate::types::input::{eph_pub_key_chunks, parse_scalar_hex, ProofInput};
use sha2::{Digest, Sha256};

// Throwaway RSA keys, e = 65537.
const N_2048: &str = "adbc862af67be4902f47d6ae10725aac505d564d34b37f8c0fcc39a926997e64e531b210441862290ab140f3fccfc5c2ab69676fd8e73ceb9763548bc991e85797740400a0bfcb08824eb309c4a99bb9cd0af8e8d93306dc3f1107e798365bdaed84999ddc44e83efa1e16c2424c8c07d23ef34a39bfdde42cee6ceffbf582e21b8d94b88b1f39f9dc634e63188def3e6e1121378fe0cf1421a8c760c8783b10484347f52dc7cf97c7bc601a5e81177e0162e876911db5a6c68bbcf47cb41c308a6c5ff1b0c5d0793857a56f5730db0304a793e9f30efdf97286ac8dee101d7ee9c8da18b4ab92a0744544c06ffb609546179c68902a1ef560af5a7640442d7f";
const D_2048: &str = "1ae3dc8246cf2b33b3d5b32112d3983c265e23eee432ca11841a706c4158ad8af13c6d5a7e27a5fdc335671fbc67ee2c70ba6a3392074c530c85e7be910ebfbedae6ae7de8637709d49d58b1b0da2d8ba6f4454d48dcd079835b5ff5550648d64c3fe344df245d2bee2b7d0b4916aeefc0f754518f39a69edbe37541f9a5e8c153d9825823cf138238752c8e03db508fb822fe261f68d2d4ca7a6ff347995fa5b609ae95099f389921a20e2ee0b57897137545e4d491e97f39c83f72bd7c671562a93c3edb0fdbebfb54e0d7d53898df99f8492bec3998b0673e5ccac25db1e82221c4890a10b437ef55c6580ebc9e5c606b3c42f98ffe7aaacdba901212b53d";
const N_512: &str = "ed802675708f3707adab5754374f46606fe66279864d819f35852f40c671f8193ab47071807feeefb39e300c1c8fef5ca2e6b520d1f15668da13823f99df1325";
const D_512: &str = "c2455930276a7eb121364eb0ecad43fc0e8c7d70ba931bbc87a2f20c2247879048321e93b01a06faf9ea33d7f63f82d248b1d6270ec3168c31f47067b5ae7a01";

const EPH_PUB_KEY_HEX: &str = "0496f2b2f3c2a1d4e5f60718293a4b5c6d7e8f9aa1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c";
const JWT_RND_HEX: &str = "2a";
const USER_SALT_HEX: &str = "1122";

fn test_params() -> JwtParams {
    JwtParams {
        max_header_json_len: 48,
        max_payload_json_len: 132,
        max_kid_value_len: 16,
        max_iss_value_len: 32,
        max_aud_value_len: 16,
        max_sub_value_len: 16,
    }
}

/// Builds a synthetic token signed with the given key and the matching proof
/// request.
fn build_proof_input(n_hex: &str, d_hex: &str) -> ProofInput {
    let n = BigUint::from_str_radix(n_hex, 16).unwrap();
    let d = BigUint::from_str_radix(d_hex, 16).unwrap();
    let key_bytes = (n.bits() as usize + 7) / 8;

    let chunks = eph_pub_key_chunks::<Fr>(EPH_PUB_KEY_HEX).unwrap();
    let randomness = parse_scalar_hex::<Fr>("jwt_rnd_hex", JWT_RND_HEX).unwrap();
    let nonce = derive_nonce(&chunks, randomness);
    let nonce_b64 = URL_SAFE_NO_PAD.encode(field_bytes_hint(nonce));

    let header = "{\"alg\":\"RS256\",\"kid\":\"k-1\",\"typ\":\"JWT\"}".to_string();
    let payload = format!(
        "{{\"iss\":\"https://accounts.google.com\",\"aud\":\"test-aud\",\"sub\":\"1234567890\",\"nonce\":\"{nonce_b64}\"}}"
    );

    let packed = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.as_bytes()),
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
    );
    let digest: [u8; 32] = Sha256::digest(packed.as_bytes()).into();
    let signature = pkcs1v15_sha256_encode(&digest, key_bytes).modpow(&d, &n);

    ProofInput {
        eph_pub_key_hex: EPH_PUB_KEY_HEX.into(),
        idp_pub_key_n_base64: URL_SAFE_NO_PAD.encode(n.to_bytes_be()),
        jwt_header_json: header,
        jwt_payload_json: payload,
        jwt_signature_base64: URL_SAFE_NO_PAD.encode(signature.to_bytes_be()),
        jwt_rnd_hex: JWT_RND_HEX.into(),
        user_salt_hex: USER_SALT_HEX.into(),
    }
}

fn is_satisfied(circuit: ZkLoginCircuit<Fr>) -> bool {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    cs.is_satisfied().unwrap()
}

fn flip_payload_byte(circuit: &mut ZkLoginCircuit<Fr>, needle: &[u8]) {
    let pos = circuit
        .jwt_payload_json
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle present in payload");
    let target = &mut circuit.jwt_payload_json[pos + needle.len()];
    *target = if *target == b'x' { b'y' } else { b'x' };
}

#[test]
fn genuine_token_with_rsa_2048_is_satisfiable() {
    let input = build_proof_input(N_2048, D_2048);
    let circuit = input
        .assignment::<Fr>(&test_params(), 2048, PublicInputsMode::Direct)
        .unwrap();
    assert!(is_satisfied(circuit));
}

#[test]
fn aggregated_mode_binds_single_public_hash() {
    let input = build_proof_input(N_512, D_512);
    let circuit = input
        .assignment::<Fr>(&test_params(), 512, PublicInputsMode::Aggregated)
        .unwrap();
    assert_eq!(circuit.public_inputs().len(), 1);
    assert!(is_satisfied(circuit.clone()));

    let mut tampered = circuit;
    tampered.public_input_hash += Fr::from(1u64);
    assert!(!is_satisfied(tampered));
}

#[test]
fn tampered_sub_claim_is_unsatisfiable() {
    let input = build_proof_input(N_512, D_512);
    let mut circuit = input
        .assignment::<Fr>(&test_params(), 512, PublicInputsMode::Direct)
        .unwrap();
    flip_payload_byte(&mut circuit, b"\"sub\":\"12345");
    assert!(!is_satisfied(circuit));
}

#[test]
fn tampered_nonce_claim_is_unsatisfiable() {
    let input = build_proof_input(N_512, D_512);
    let mut circuit = input
        .assignment::<Fr>(&test_params(), 512, PublicInputsMode::Direct)
        .unwrap();
    flip_payload_byte(&mut circuit, b"\"nonce\":\"");
    assert!(!is_satisfied(circuit));
}

#[test]
fn tampered_header_alg_is_unsatisfiable() {
    let input = build_proof_input(N_512, D_512);
    let mut circuit = input
        .assignment::<Fr>(&test_params(), 512, PublicInputsMode::Direct)
        .unwrap();
    let needle = b"\"alg\":\"RS2";
    let pos = circuit
        .jwt_header_json
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap();
    circuit.jwt_header_json[pos + needle.len()] = b'x';
    assert!(!is_satisfied(circuit));
}

#[test]
fn tampered_signature_is_unsatisfiable() {
    let input = build_proof_input(N_512, D_512);
    let mut circuit = input
        .assignment::<Fr>(&test_params(), 512, PublicInputsMode::Direct)
        .unwrap();
    circuit.jwt_signature ^= BigUint::from(1u8);
    assert!(!is_satisfied(circuit));
}

/// Minimal nonce-commitment relation, used to exercise the Groth16 plumbing
/// without the full token pipeline.
#[derive(Clone)]
struct NonceCommitmentCircuit {
    eph_pub_key: Vec<Fr>,
    randomness: Fr,
    nonce: Fr,
}

impl ConstraintSynthesizer<Fr> for NonceCommitmentCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let nonce_input = FpVar::new_input(cs.clone(), || Ok(self.nonce))?;
        let chunks: Vec<FpVar<Fr>> = self
            .eph_pub_key
            .iter()
            .map(|&c| FpVar::new_witness(cs.clone(), || Ok(c)))
            .collect::<Result<_, _>>()?;
        let randomness = FpVar::new_witness(cs.clone(), || Ok(self.randomness))?;
        let computed = nonce_commitment_var(cs, &chunks, &randomness)?;
        computed.enforce_equal(&nonce_input)
    }
}

#[test]
fn groth16_round_trip_on_nonce_commitment() {
    let eph_pub_key = eph_pub_key_chunks::<Fr>(EPH_PUB_KEY_HEX).unwrap();
    let randomness = Fr::from(42u64);
    let nonce = derive_nonce(&eph_pub_key, randomness);
    let circuit = NonceCommitmentCircuit {
        eph_pub_key,
        randomness,
        nonce,
    };

    let mut rng = StdRng::seed_from_u64(0u64);
    let (pk, vk) =
        ark_groth16::Groth16::<Bn254>::circuit_specific_setup(circuit.clone(), &mut rng).unwrap();
    let proof = ark_groth16::Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

    assert!(ark_groth16::Groth16::<Bn254>::verify(&vk, &[nonce], &proof).unwrap());
    assert!(!ark_groth16::Groth16::<Bn254>::verify(&vk, &[nonce + Fr::from(1u64)], &proof).unwrap());
}
