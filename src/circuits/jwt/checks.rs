//! Per-position byte and separator checks.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::lookup::LookupTable;
use crate::utils::logic::{equal, equal_const};

/// Checks that the buffer byte at position `i` matches the table entry
/// `i - offset` whenever the field mask covers `i`: `mask == 0 || byte ==
/// expected`, enforced as `mask * (byte - expected) == 0`.
///
/// The lookup index collapses to 0 for masked-off positions, which is safe
/// because the comparison is gated by the mask.
pub fn verify_byte<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    json_byte: &FpVar<F>,
    table: &LookupTable<F>,
    i: usize,
    mask_bit: &FpVar<F>,
    offset: &FpVar<F>,
) -> Result<(), SynthesisError> {
    // Underflow of i - offset is fine: the mask zeroes the index.
    let index = mask_bit * (FpVar::constant(F::from(i as u64)) - offset);
    let expected = table.lookup(cs, &index)?;

    (mask_bit * (json_byte - expected)).enforce_equal(&FpVar::zero())
}

/// Checks that the byte at position `i` is a JSON structural separator
/// (comma or closing brace) whenever `i` equals the field's end offset.
pub fn verify_separator<F: PrimeField>(
    json_byte: &FpVar<F>,
    i: usize,
    end: &FpVar<F>,
) -> Result<(), SynthesisError> {
    let should_be_separator = equal(&FpVar::constant(F::from(i as u64)), end)?;
    let is_comma = equal_const(json_byte, b',' as u64)?;
    let is_close_brace = equal_const(json_byte, b'}' as u64)?;

    // should == 0 || byte is a separator.
    (should_be_separator * (FpVar::constant(F::one()) - is_comma - is_close_brace))
        .enforce_equal(&FpVar::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn byte(cs: &ConstraintSystemRef<Fr>, b: u8) -> FpVar<Fr> {
        FpVar::new_witness(cs.clone(), || Ok(Fr::from(b as u64))).unwrap()
    }

    #[test]
    fn masked_byte_must_match_table() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let table = LookupTable::new("\"typ\":\"JWT\"", None);
        let offset = byte(&cs, 3);
        let mask_on = byte(&cs, 1);
        // Position 5 inside the field: table index 2 holds 'y'.
        verify_byte(cs.clone(), &byte(&cs, b'y'), &table, 5, &mask_on, &offset).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let offset = byte(&cs, 3);
        let mask_on = byte(&cs, 1);
        verify_byte(cs.clone(), &byte(&cs, b'x'), &table, 5, &mask_on, &offset).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn unmasked_byte_is_unconstrained() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let table = LookupTable::new("\"typ\":\"JWT\"", None);
        let offset = byte(&cs, 3);
        let mask_off = byte(&cs, 0);
        verify_byte(cs.clone(), &byte(&cs, 0xEE), &table, 40, &mask_off, &offset).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn separator_required_only_at_end_offset() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let end = byte(&cs, 7);
        verify_separator(&byte(&cs, b','), 7, &end).unwrap();
        verify_separator(&byte(&cs, b'}'), 7, &end).unwrap();
        verify_separator(&byte(&cs, b'x'), 6, &end).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let end = byte(&cs, 7);
        verify_separator(&byte(&cs, b'x'), 7, &end).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
