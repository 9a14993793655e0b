//! Expected-byte lookup tables.
//!
//! A table holds a field's static JSON prefix followed by its value wires,
//! zero-padded to a power of two. Queries select by a binary mux tree over
//! the verified bit decomposition of the index, so an index wire can never
//! reach outside the table. Index 0 is the harmless landing spot for masked-
//! off positions (the caller gates the comparison with the mask).

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::utils::logic::to_bits_checked;

pub struct LookupTable<F: PrimeField> {
    entries: Vec<FpVar<F>>,
    index_bits: usize,
}

impl<F: PrimeField> LookupTable<F> {
    /// Table of `prefix` bytes (constants) followed by `value` wires.
    pub fn new(prefix: &str, value: Option<&[FpVar<F>]>) -> Self {
        let mut entries: Vec<FpVar<F>> = prefix
            .bytes()
            .map(|b| FpVar::constant(F::from(b as u64)))
            .collect();
        if let Some(value) = value {
            entries.extend_from_slice(value);
        }
        Self::from_entries(entries)
    }

    /// Table over an already-built vector of wires.
    pub fn from_vars(vars: &[FpVar<F>]) -> Self {
        Self::from_entries(vars.to_vec())
    }

    fn from_entries(mut entries: Vec<FpVar<F>>) -> Self {
        assert!(!entries.is_empty());
        let padded = entries.len().next_power_of_two();
        entries.resize(padded, FpVar::constant(F::zero()));
        Self {
            index_bits: padded.trailing_zeros() as usize,
            entries,
        }
    }

    /// Entry at the (variable) `index`.
    pub fn lookup(
        &self,
        cs: ConstraintSystemRef<F>,
        index: &FpVar<F>,
    ) -> Result<FpVar<F>, SynthesisError> {
        let bits = to_bits_checked(cs, index, self.index_bits)?;
        let mut layer = self.entries.clone();
        for bit in &bits {
            let mut next = Vec::with_capacity(layer.len() / 2);
            for pair in layer.chunks(2) {
                next.push(FpVar::conditionally_select(bit, &pair[1], &pair[0])?);
            }
            layer = next;
        }
        Ok(layer.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn lookup_returns_each_entry() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let table = LookupTable::<Fr>::new("\"kid\":", None);
        let expected = b"\"kid\":\0\0"; // padded to 8
        for (i, &b) in expected.iter().enumerate() {
            let idx = FpVar::new_witness(cs.clone(), || Ok(Fr::from(i as u64))).unwrap();
            let got = table.lookup(cs.clone(), &idx).unwrap();
            assert_eq!(got.value().unwrap(), Fr::from(b as u64));
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn out_of_range_index_is_unsatisfiable() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let table = LookupTable::<Fr>::new("\"kid\":", None);
        let idx = FpVar::new_witness(cs.clone(), || Ok(Fr::from(8u64))).unwrap();
        let _ = table.lookup(cs.clone(), &idx).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
