//! Containment-mask oracle and its in-circuit verifier.
//!
//! A mask marks the buffer positions belonging to one field. The verifier
//! enforces, per mask: every entry boolean, population count equal to the
//! claimed length, a single rising edge, and that edge sitting at the claimed
//! offset, so an accepted mask is exactly the run `[offset, offset + len)`.
//! Across masks of the same buffer the position-wise sum must stay boolean
//! (no overlap).

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::utils::logic::{enforce_boolean, not};

/// Mask that is 1 over `[offset, offset + len)` and 0 elsewhere.
pub fn contiguous_mask_hint(offset: usize, len: usize, size: usize) -> Vec<bool> {
    (0..size)
        .map(|i| i >= offset && i < offset.saturating_add(len))
        .collect()
}

/// Allocates a hinted mask as witness wires.
pub fn mask_vars<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    mask: &[bool],
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    mask.iter()
        .map(|&b| FpVar::new_witness(cs.clone(), || Ok(F::from(b as u64))))
        .collect()
}

/// Verifies a family of masks covering one buffer.
///
/// `expected_lens[k]` and `offsets[k]` are the claimed population count and
/// start of `masks[k]`. All masks must have the buffer's length.
pub fn verify_masks<F: PrimeField>(
    expected_lens: &[FpVar<F>],
    offsets: &[FpVar<F>],
    masks: &[Vec<FpVar<F>>],
) -> Result<(), SynthesisError> {
    assert_eq!(masks.len(), expected_lens.len());
    assert_eq!(masks.len(), offsets.len());
    let size = masks[0].len();
    for mask in masks.iter() {
        assert_eq!(mask.len(), size);
    }

    let mut column_sums = vec![FpVar::<F>::zero(); size];

    for ((mask, expected_len), offset) in masks.iter().zip(expected_lens).zip(offsets) {
        let mut popcount = FpVar::<F>::zero();
        let mut edge_count = FpVar::<F>::zero();
        let mut edge_position = FpVar::<F>::zero();

        for (i, bit) in mask.iter().enumerate() {
            enforce_boolean(bit)?;
            popcount += bit;
            column_sums[i] += bit;

            // Rising edge: set here, clear (or nonexistent) one position back.
            let rising = if i == 0 {
                bit.clone()
            } else {
                bit * not(&mask[i - 1])
            };
            edge_position += &rising * FpVar::constant(F::from(i as u64));
            edge_count += rising;
        }

        popcount.enforce_equal(expected_len)?;
        // At most one rising edge, and for a non-empty mask it sits at the
        // claimed offset. Empty masks leave both sides zero.
        enforce_boolean(&edge_count)?;
        edge_position.enforce_equal(&(offset * &edge_count))?;
    }

    for sum in &column_sums {
        enforce_boolean(sum)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn fp(cs: &ConstraintSystemRef<Fr>, v: u64) -> FpVar<Fr> {
        FpVar::new_witness(cs.clone(), || Ok(Fr::from(v))).unwrap()
    }

    fn raw_mask(cs: &ConstraintSystemRef<Fr>, bits: &[u64]) -> Vec<FpVar<Fr>> {
        bits.iter().map(|&b| fp(cs, b)).collect()
    }

    #[test]
    fn disjoint_contiguous_masks_verify() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = mask_vars(cs.clone(), &contiguous_mask_hint(2, 3, 10)).unwrap();
        let b = mask_vars(cs.clone(), &contiguous_mask_hint(6, 2, 10)).unwrap();
        verify_masks(
            &[fp(&cs, 3), fp(&cs, 2)],
            &[fp(&cs, 2), fp(&cs, 6)],
            &[a, b],
        )
        .unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn population_count_mismatch_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = mask_vars(cs.clone(), &contiguous_mask_hint(2, 3, 10)).unwrap();
        verify_masks(&[fp(&cs, 4)], &[fp(&cs, 2)], &[a]).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn overlapping_masks_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = mask_vars(cs.clone(), &contiguous_mask_hint(2, 4, 10)).unwrap();
        let b = mask_vars(cs.clone(), &contiguous_mask_hint(5, 2, 10)).unwrap();
        verify_masks(
            &[fp(&cs, 4), fp(&cs, 2)],
            &[fp(&cs, 2), fp(&cs, 5)],
            &[a, b],
        )
        .unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn scattered_mask_with_correct_popcount_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let scattered = raw_mask(&cs, &[1, 0, 1, 0, 0, 0]);
        verify_masks(&[fp(&cs, 2)], &[fp(&cs, 0)], &[scattered]).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn mask_anchored_to_wrong_offset_rejected() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = mask_vars(cs.clone(), &contiguous_mask_hint(3, 2, 8)).unwrap();
        verify_masks(&[fp(&cs, 2)], &[fp(&cs, 4)], &[a]).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
