//! Cryptographic primitives for the management engine.
//!
//! - **Ed25519** for endorsing payloads on behalf of an organization
//! - **Blake2b** for the payload digest that is signed
//! - **X.509** subject parsing to attribute ledger members to identities

pub mod cert;
pub mod error;
pub mod hash;
pub mod sign;

pub use cert::common_name;
pub use error::CryptoError;
pub use hash::{blake2b_256, payload_digest};
pub use sign::{
    sign_message, signing_key_from_bytes, verify_endorsement, verify_signature,
    Ed25519PayloadSigner,
};
