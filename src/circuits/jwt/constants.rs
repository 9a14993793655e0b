//! Buffer capacities and the fixed JSON shapes the verifier checks for.

/// Capacities of one circuit instance. JSON capacities must be multiples of
/// 3 bytes (24 bits) so base64 chunk boundaries align with byte boundaries.
#[derive(Clone, Debug)]
pub struct JwtParams {
    pub max_header_json_len: usize,
    pub max_payload_json_len: usize,
    pub max_kid_value_len: usize,
    pub max_iss_value_len: usize,
    pub max_aud_value_len: usize,
    pub max_sub_value_len: usize,
}

impl Default for JwtParams {
    fn default() -> Self {
        Self {
            max_header_json_len: 270,
            max_payload_json_len: 1080,
            max_kid_value_len: 128,
            max_iss_value_len: 128,
            max_aud_value_len: 128,
            max_sub_value_len: 128,
        }
    }
}

impl JwtParams {
    pub fn validate(&self) {
        assert_eq!(self.max_header_json_len % 3, 0, "header capacity must be 3-byte aligned");
        assert_eq!(self.max_payload_json_len % 3, 0, "payload capacity must be 3-byte aligned");
    }

    pub fn header_base64_cap(&self) -> usize {
        self.max_header_json_len * 4 / 3
    }

    pub fn payload_base64_cap(&self) -> usize {
        self.max_payload_json_len * 4 / 3
    }

    /// Capacity of the packed `header.payload` buffer.
    pub fn packed_base64_cap(&self) -> usize {
        self.header_base64_cap() + 1 + self.payload_base64_cap()
    }

    /// Hash-buffer capacity: packed capacity plus padding room, rounded up to
    /// whole SHA-256 blocks.
    pub fn sha_capacity(&self) -> usize {
        (self.packed_base64_cap() + 9 + 63) / 64 * 64
    }
}

pub const TYP_JSON_KEY: &str = "typ";
pub const TYP_JSON: &str = "\"typ\":\"JWT\"";
pub const ALG_JSON_KEY: &str = "alg";
pub const ALG_JSON: &str = "\"alg\":\"RS256\"";
pub const KID_JSON_KEY: &str = "kid";
pub const KID_JSON_PREFIX: &str = "\"kid\":";

pub const ISS_JSON_KEY: &str = "iss";
pub const ISS_JSON_PREFIX: &str = "\"iss\":";
pub const AUD_JSON_KEY: &str = "aud";
pub const AUD_JSON_PREFIX: &str = "\"aud\":";
pub const SUB_JSON_KEY: &str = "sub";
pub const SUB_JSON_PREFIX: &str = "\"sub\":";
pub const NONCE_JSON_KEY: &str = "nonce";
pub const NONCE_JSON_PREFIX: &str = "\"nonce\":";

/// Unpadded base64url length of a 32-byte nonce, plus surrounding quotes.
pub const NONCE_B64_LEN: usize = 43;
pub const NONCE_VALUE_LEN: usize = NONCE_B64_LEN + 2;
