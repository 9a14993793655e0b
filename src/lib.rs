//! Zero-knowledge login circuits.
//!
//! A prover demonstrates possession of a validly signed identity token (a
//! JSON-claims token signed by an identity provider) and correct derivation
//! of a private address commitment from selected claims, without revealing
//! the token beyond what is made public. The constraint system follows one
//! load-bearing pattern throughout: untrusted "hint" values computed from
//! cleartext witness data, each paired with algebraic checks that make any
//! incorrect candidate unsatisfiable.
//!
//! Layout:
//! - [`circuits`]: the R1CS gadgets (field verifier, base64url codec,
//!   variable-length SHA-256, emulated RSA, Poseidon commitments) and the
//!   top-level [`circuits::ZkLoginCircuit`];
//! - [`hints`]: the oracle functions and their in-circuit verifiers;
//! - [`types`]: proof-request marshaling and validation;
//! - [`commands`]: compile / setup / prove / derive entry points.

pub mod circuits;
pub mod commands;
pub mod hints;
pub mod types;
pub mod utils;

pub use circuits::{PublicInputsMode, ZkLoginCircuit};
pub use types::input::ProofInput;

#[cfg(test)]
mod tests;
