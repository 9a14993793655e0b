//! Groth16 circuit-specific setup.

use std::fs;
use std::path::Path;

use anyhow::Result;
use ark_bn254::{Bn254, Fr};
use ark_serialize::CanonicalSerialize;
use ark_snark::SNARK;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::circuits::jwt::constants::JwtParams;
use crate::circuits::{PublicInputsMode, ZkLoginCircuit, RSA_MODULUS_BITS};

/// Runs the setup and writes the proving and verification keys.
pub fn setup_circuit(pk_path: &str, vk_path: &str, mode: PublicInputsMode) -> Result<()> {
    let circuit = ZkLoginCircuit::<Fr>::blank(&JwtParams::default(), RSA_MODULUS_BITS, mode);

    log::info!("running Groth16 setup...");
    let mut rng = StdRng::from_entropy();
    let (pk, vk) = ark_groth16::Groth16::<Bn254>::circuit_specific_setup(circuit, &mut rng)?;

    write_artifact(pk_path, &pk)?;
    write_artifact(vk_path, &vk)?;
    println!("Proving key written to {pk_path}");
    println!("Verification key written to {vk_path}");
    Ok(())
}

pub fn write_artifact<T: CanonicalSerialize>(path: &str, value: &T) -> Result<()> {
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let mut bytes = Vec::new();
    value.serialize_compressed(&mut bytes)?;
    fs::write(path, bytes)?;
    Ok(())
}
