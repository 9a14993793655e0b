//! Untrusted oracle helpers ("hints") and their paired in-circuit verifiers.
//!
//! Every function here computes over cleartext witness data. A hint value is
//! never exposed without a verifier that makes incorrect candidates
//! unsatisfiable: masks carry `verify_masks`, byte decompositions carry
//! `verify_field_bytes`, offsets and lengths are pinned by the field
//! verifier's byte and separator checks.

pub mod base64_len;
pub mod field_bytes;
pub mod mask;
pub mod offset;
pub mod value_len;

pub use base64_len::base64_len_hint;
pub use field_bytes::{alloc_field_bytes, field_bytes_hint, verify_field_bytes, FIELD_BYTES};
pub use mask::{contiguous_mask_hint, mask_vars, verify_masks};
pub use offset::offset_hint;
pub use value_len::{json_raw_value, json_value_len_hint};
