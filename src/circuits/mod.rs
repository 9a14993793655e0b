pub mod base64;
pub mod commitment;
pub mod jwt;
pub mod rsa;
pub mod sha256;
pub mod zk_login;

pub use zk_login::{
    PublicInputsMode, ZkLoginCircuit, ELEMENT_SIZE, MAX_EPH_PUB_KEY_BYTES,
    MAX_EPH_PUB_KEY_CHUNKS, RSA_MODULUS_BITS,
};
