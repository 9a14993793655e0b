//! Proof generation from a JSON proof request.

use std::fs;
use std::time::Instant;

use anyhow::{ensure, Result};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::circuits::jwt::constants::JwtParams;
use crate::circuits::{PublicInputsMode, RSA_MODULUS_BITS};
use crate::types::input::ProofInput;

/// Builds the witness from `input_path`, proves, self-verifies and writes the
/// base64-encoded proof.
pub fn generate_proof(
    input_path: &str,
    pk_path: &str,
    output_path: &str,
    mode: PublicInputsMode,
) -> Result<()> {
    log::info!("loading proof request from {input_path}");
    let request: ProofInput = serde_json::from_str(&fs::read_to_string(input_path)?)?;
    let circuit = request.assignment::<Fr>(&JwtParams::default(), RSA_MODULUS_BITS, mode)?;
    let public_inputs = circuit.public_inputs();

    log::info!("loading proving key from {pk_path}");
    let pk_bytes = fs::read(pk_path)?;
    let pk = ProvingKey::<Bn254>::deserialize_compressed(&*pk_bytes)?;

    log::info!("generating proof...");
    let start = Instant::now();
    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng)?;
    println!("Proof generated in {:?}", start.elapsed());

    let accepted = Groth16::<Bn254>::verify(&pk.vk, &public_inputs, &proof)?;
    ensure!(accepted, "generated proof failed self-verification");

    let mut proof_bytes = Vec::new();
    proof.serialize_compressed(&mut proof_bytes)?;
    fs::write(output_path, URL_SAFE_NO_PAD.encode(&proof_bytes))?;
    println!("Proof written to {output_path}");
    Ok(())
}
