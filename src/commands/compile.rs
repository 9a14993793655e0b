//! Circuit synthesis statistics.

use anyhow::Result;
use ark_bn254::Fr;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, OptimizationGoal, SynthesisMode,
};

use crate::circuits::jwt::constants::JwtParams;
use crate::circuits::{PublicInputsMode, ZkLoginCircuit, RSA_MODULUS_BITS};

/// Synthesizes the circuit in setup mode and reports its size.
pub fn compile_circuit(mode: PublicInputsMode) -> Result<()> {
    let circuit = ZkLoginCircuit::<Fr>::blank(&JwtParams::default(), RSA_MODULUS_BITS, mode);

    log::info!("synthesizing circuit ({mode:?} public inputs)...");
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    circuit.generate_constraints(cs.clone())?;
    cs.finalize();

    print_circuit_stats("zk-login", &cs);
    Ok(())
}

/// Print constraint-system statistics.
pub fn print_circuit_stats(name: &str, cs: &ConstraintSystemRef<Fr>) {
    println!("{name} circuit statistics:");
    println!("  Constraints: {}", cs.num_constraints());
    println!("  Public inputs: {}", cs.num_instance_variables() - 1);
    println!("  Witness variables: {}", cs.num_witness_variables());
}
