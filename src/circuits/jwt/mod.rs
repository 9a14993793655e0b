//! JWT structure verifier.
//!
//! Locates the claims of interest through untrusted hints, verifies them with
//! masked byte checks against expected-byte tables, and reassembles the
//! canonical `base64url(header).base64url(payload)` stream for hashing. All
//! loop bounds are buffer capacities; nothing branches on witness data.

pub mod checks;
pub mod constants;
pub mod lookup;

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::circuits::base64::encode_base64url;
use crate::circuits::sha256::sha256_var_digest;
use crate::hints::{
    base64_len_hint, contiguous_mask_hint, json_value_len_hint, mask_vars, offset_hint,
    verify_masks,
};
use crate::utils::bytes::ByteBuf;

use checks::{verify_byte, verify_separator};
use constants::*;
use lookup::LookupTable;

/// One hinted quantity: the cleartext value plus whether the oracle actually
/// found it. The `found` flag is enforced in-circuit, so an absent key cannot
/// silently become a wraparound offset.
struct Hinted<F: PrimeField> {
    var: FpVar<F>,
    native: usize,
}

fn hinted<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    value: Option<usize>,
) -> Result<Hinted<F>, SynthesisError> {
    let found = Boolean::new_witness(cs.clone(), || Ok(value.is_some()))?;
    found.enforce_equal(&Boolean::constant(true))?;
    let native = value.unwrap_or(0);
    Ok(Hinted {
        var: FpVar::new_witness(cs, || Ok(F::from(native as u64)))?,
        native,
    })
}

pub struct JwtVerifier<F: PrimeField> {
    params: JwtParams,

    // Header lookup tables.
    typ_table: LookupTable<F>,
    alg_table: LookupTable<F>,
    kid_table: LookupTable<F>,

    // Payload lookup tables.
    iss_table: LookupTable<F>,
    aud_table: LookupTable<F>,
    sub_table: LookupTable<F>,
    nonce_table: LookupTable<F>,

    // Header info.
    typ_offset: FpVar<F>,
    alg_offset: FpVar<F>,
    kid_offset: FpVar<F>,
    kid_value_len: FpVar<F>,
    typ_mask: Vec<FpVar<F>>,
    alg_mask: Vec<FpVar<F>>,
    kid_mask: Vec<FpVar<F>>,

    // Payload info.
    iss_offset: FpVar<F>,
    iss_value_len: FpVar<F>,
    aud_offset: FpVar<F>,
    aud_value_len: FpVar<F>,
    sub_offset: FpVar<F>,
    sub_value_len: FpVar<F>,
    nonce_offset: FpVar<F>,
    nonce_value_len: FpVar<F>,
    iss_mask: Vec<FpVar<F>>,
    aud_mask: Vec<FpVar<F>>,
    sub_mask: Vec<FpVar<F>>,
    nonce_mask: Vec<FpVar<F>>,

    // Base64 packing info.
    header_base64_len: FpVar<F>,
    payload_base64_len: FpVar<F>,
    header_b64_mask: Vec<FpVar<F>>,
    dot_mask: Vec<FpVar<F>>,
    payload_b64_mask: Vec<FpVar<F>>,
}

impl<F: PrimeField> JwtVerifier<F> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cs: ConstraintSystemRef<F>,
        params: &JwtParams,
        header_clear: &[u8],
        payload_clear: &[u8],
        kid_value: &[FpVar<F>],
        iss_value: &[FpVar<F>],
        aud_value: &[FpVar<F>],
        sub_value: &[FpVar<F>],
        nonce_value: &[FpVar<F>],
    ) -> Result<Self, SynthesisError> {
        params.validate();
        assert_eq!(header_clear.len(), params.max_header_json_len);
        assert_eq!(payload_clear.len(), params.max_payload_json_len);
        assert_eq!(nonce_value.len(), NONCE_VALUE_LEN);

        let typ_table = LookupTable::new(TYP_JSON, None);
        let alg_table = LookupTable::new(ALG_JSON, None);
        let kid_table = LookupTable::new(KID_JSON_PREFIX, Some(kid_value));

        let iss_table = LookupTable::new(ISS_JSON_PREFIX, Some(iss_value));
        let aud_table = LookupTable::new(AUD_JSON_PREFIX, Some(aud_value));
        let sub_table = LookupTable::new(SUB_JSON_PREFIX, Some(sub_value));
        let nonce_table = LookupTable::new(NONCE_JSON_PREFIX, Some(nonce_value));

        // Header hints.
        let typ_offset = hinted(cs.clone(), offset_hint(TYP_JSON.as_bytes(), header_clear))?;
        let alg_offset = hinted(cs.clone(), offset_hint(ALG_JSON.as_bytes(), header_clear))?;
        let kid_offset = hinted(cs.clone(), offset_hint(KID_JSON_PREFIX.as_bytes(), header_clear))?;
        let kid_value_len = hinted(cs.clone(), json_value_len_hint(KID_JSON_KEY, header_clear))?;

        // Payload hints.
        let iss_offset = hinted(cs.clone(), offset_hint(ISS_JSON_PREFIX.as_bytes(), payload_clear))?;
        let aud_offset = hinted(cs.clone(), offset_hint(AUD_JSON_PREFIX.as_bytes(), payload_clear))?;
        let sub_offset = hinted(cs.clone(), offset_hint(SUB_JSON_PREFIX.as_bytes(), payload_clear))?;
        let nonce_offset =
            hinted(cs.clone(), offset_hint(NONCE_JSON_PREFIX.as_bytes(), payload_clear))?;
        let iss_value_len = hinted(cs.clone(), json_value_len_hint(ISS_JSON_KEY, payload_clear))?;
        let aud_value_len = hinted(cs.clone(), json_value_len_hint(AUD_JSON_KEY, payload_clear))?;
        let sub_value_len = hinted(cs.clone(), json_value_len_hint(SUB_JSON_KEY, payload_clear))?;
        let nonce_value_len =
            hinted(cs.clone(), json_value_len_hint(NONCE_JSON_KEY, payload_clear))?;

        // Base64 section lengths.
        let header_base64_len = hinted(cs.clone(), Some(base64_len_hint(header_clear)))?;
        let payload_base64_len = hinted(cs.clone(), Some(base64_len_hint(payload_clear)))?;

        // Header masks.
        let header_cap = params.max_header_json_len;
        let typ_mask = mask_vars(
            cs.clone(),
            &contiguous_mask_hint(typ_offset.native, TYP_JSON.len(), header_cap),
        )?;
        let alg_mask = mask_vars(
            cs.clone(),
            &contiguous_mask_hint(alg_offset.native, ALG_JSON.len(), header_cap),
        )?;
        let kid_len_native = KID_JSON_PREFIX.len() + kid_value_len.native;
        let kid_mask = mask_vars(
            cs.clone(),
            &contiguous_mask_hint(kid_offset.native, kid_len_native, header_cap),
        )?;
        let kid_len_var = &kid_value_len.var + FpVar::constant(F::from(KID_JSON_PREFIX.len() as u64));
        verify_masks(
            &[
                FpVar::constant(F::from(TYP_JSON.len() as u64)),
                FpVar::constant(F::from(ALG_JSON.len() as u64)),
                kid_len_var,
            ],
            &[
                typ_offset.var.clone(),
                alg_offset.var.clone(),
                kid_offset.var.clone(),
            ],
            &[typ_mask.clone(), alg_mask.clone(), kid_mask.clone()],
        )?;

        // Payload masks.
        let payload_cap = params.max_payload_json_len;
        let mut payload_masks = Vec::with_capacity(4);
        let mut payload_lens = Vec::with_capacity(4);
        for (offset, value_len, prefix) in [
            (&iss_offset, &iss_value_len, ISS_JSON_PREFIX),
            (&aud_offset, &aud_value_len, AUD_JSON_PREFIX),
            (&sub_offset, &sub_value_len, SUB_JSON_PREFIX),
            (&nonce_offset, &nonce_value_len, NONCE_JSON_PREFIX),
        ] {
            payload_masks.push(mask_vars(
                cs.clone(),
                &contiguous_mask_hint(
                    offset.native,
                    prefix.len() + value_len.native,
                    payload_cap,
                ),
            )?);
            payload_lens
                .push(&value_len.var + FpVar::constant(F::from(prefix.len() as u64)));
        }
        verify_masks(
            &payload_lens,
            &[
                iss_offset.var.clone(),
                aud_offset.var.clone(),
                sub_offset.var.clone(),
                nonce_offset.var.clone(),
            ],
            &payload_masks,
        )?;
        let nonce_mask = payload_masks.pop().unwrap();
        let sub_mask = payload_masks.pop().unwrap();
        let aud_mask = payload_masks.pop().unwrap();
        let iss_mask = payload_masks.pop().unwrap();

        // Packing masks over the base64 buffer.
        let packed_cap = params.packed_base64_cap();
        let header_b64_mask = mask_vars(
            cs.clone(),
            &contiguous_mask_hint(0, header_base64_len.native, packed_cap),
        )?;
        let dot_mask = mask_vars(
            cs.clone(),
            &contiguous_mask_hint(header_base64_len.native, 1, packed_cap),
        )?;
        let payload_b64_mask = mask_vars(
            cs.clone(),
            &contiguous_mask_hint(
                header_base64_len.native + 1,
                payload_base64_len.native,
                packed_cap,
            ),
        )?;
        let one = FpVar::constant(F::one());
        verify_masks(
            &[
                header_base64_len.var.clone(),
                one.clone(),
                payload_base64_len.var.clone(),
            ],
            &[
                FpVar::constant(F::zero()),
                header_base64_len.var.clone(),
                &header_base64_len.var + &one,
            ],
            &[
                header_b64_mask.clone(),
                dot_mask.clone(),
                payload_b64_mask.clone(),
            ],
        )?;

        Ok(Self {
            params: params.clone(),

            typ_table,
            alg_table,
            kid_table,

            iss_table,
            aud_table,
            sub_table,
            nonce_table,

            typ_offset: typ_offset.var,
            alg_offset: alg_offset.var,
            kid_offset: kid_offset.var,
            kid_value_len: kid_value_len.var,
            typ_mask,
            alg_mask,
            kid_mask,

            iss_offset: iss_offset.var,
            iss_value_len: iss_value_len.var,
            aud_offset: aud_offset.var,
            aud_value_len: aud_value_len.var,
            sub_offset: sub_offset.var,
            sub_value_len: sub_value_len.var,
            nonce_offset: nonce_offset.var,
            nonce_value_len: nonce_value_len.var,
            iss_mask,
            aud_mask,
            sub_mask,
            nonce_mask,

            header_base64_len: header_base64_len.var,
            payload_base64_len: payload_base64_len.var,
            header_b64_mask,
            dot_mask,
            payload_b64_mask,
        })
    }

    /// Checks `"typ":"JWT"`, `"alg":"RS256"` and the expected kid value, with
    /// a separator behind each field.
    pub fn verify_header(
        &self,
        cs: ConstraintSystemRef<F>,
        header: &[FpVar<F>],
    ) -> Result<(), SynthesisError> {
        let c = |n: usize| FpVar::constant(F::from(n as u64));
        let end_typ = &self.typ_offset + c(TYP_JSON.len());
        let end_alg = &self.alg_offset + c(ALG_JSON.len());
        let end_kid = &self.kid_offset + c(KID_JSON_PREFIX.len()) + &self.kid_value_len;

        for (i, byte) in header.iter().enumerate() {
            verify_byte(cs.clone(), byte, &self.typ_table, i, &self.typ_mask[i], &self.typ_offset)?;
            verify_separator(byte, i, &end_typ)?;

            verify_byte(cs.clone(), byte, &self.alg_table, i, &self.alg_mask[i], &self.alg_offset)?;
            verify_separator(byte, i, &end_alg)?;

            verify_byte(cs.clone(), byte, &self.kid_table, i, &self.kid_mask[i], &self.kid_offset)?;
            verify_separator(byte, i, &end_kid)?;
        }
        Ok(())
    }

    /// Checks the expected iss, aud, sub and nonce claims, with a separator
    /// behind each field.
    pub fn verify_payload(
        &self,
        cs: ConstraintSystemRef<F>,
        payload: &[FpVar<F>],
    ) -> Result<(), SynthesisError> {
        let c = |n: usize| FpVar::constant(F::from(n as u64));
        let end_iss = &self.iss_offset + c(ISS_JSON_PREFIX.len()) + &self.iss_value_len;
        let end_aud = &self.aud_offset + c(AUD_JSON_PREFIX.len()) + &self.aud_value_len;
        let end_sub = &self.sub_offset + c(SUB_JSON_PREFIX.len()) + &self.sub_value_len;
        let end_nonce = &self.nonce_offset + c(NONCE_JSON_PREFIX.len()) + &self.nonce_value_len;

        for (i, byte) in payload.iter().enumerate() {
            verify_byte(cs.clone(), byte, &self.iss_table, i, &self.iss_mask[i], &self.iss_offset)?;
            verify_separator(byte, i, &end_iss)?;

            verify_byte(cs.clone(), byte, &self.aud_table, i, &self.aud_mask[i], &self.aud_offset)?;
            verify_separator(byte, i, &end_aud)?;

            verify_byte(cs.clone(), byte, &self.sub_table, i, &self.sub_mask[i], &self.sub_offset)?;
            verify_separator(byte, i, &end_sub)?;

            verify_byte(
                cs.clone(),
                byte,
                &self.nonce_table,
                i,
                &self.nonce_mask[i],
                &self.nonce_offset,
            )?;
            verify_separator(byte, i, &end_nonce)?;
        }
        Ok(())
    }

    /// Encodes header and payload to base64url, packs
    /// `header ∥ '.' ∥ payload` under the verified masks, and hashes the
    /// logical length. Returns the 32 digest bytes.
    pub fn pack_and_hash(
        &self,
        cs: ConstraintSystemRef<F>,
        header: &ByteBuf<F>,
        payload: &ByteBuf<F>,
    ) -> Result<Vec<FpVar<F>>, SynthesisError> {
        let header_b64 = encode_base64url(&header.bits)?;
        let payload_b64 = encode_base64url(&payload.bits)?;
        let payload_table = LookupTable::from_vars(&payload_b64);

        let one = FpVar::constant(F::one());
        let start_payload = &self.header_base64_len + &one;
        let dot = FpVar::constant(F::from(b'.' as u64));
        let zero = FpVar::<F>::zero();

        let packed_cap = self.params.packed_base64_cap();
        let mut packed = Vec::with_capacity(self.params.sha_capacity());
        for i in 0..packed_cap {
            let index =
                &self.payload_b64_mask[i] * (FpVar::constant(F::from(i as u64)) - &start_payload);
            let payload_byte = payload_table.lookup(cs.clone(), &index)?;
            let header_byte = header_b64.get(i).unwrap_or(&zero);

            packed.push(
                &self.header_b64_mask[i] * header_byte
                    + &self.dot_mask[i] * &dot
                    + &self.payload_b64_mask[i] * &payload_byte,
            );
        }
        packed.resize(self.params.sha_capacity(), FpVar::constant(F::zero()));

        let total_len = &self.header_base64_len + &one + &self.payload_base64_len;
        sha256_var_digest(cs, &packed, &total_len)
    }
}
