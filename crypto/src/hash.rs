//! Blake2b hashing of payloads.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chainops_client::Payload;

use crate::CryptoError;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Digest every endorser signs: Blake2b over the bincode encoding.
pub fn payload_digest(payload: &Payload) -> Result<[u8; 32], CryptoError> {
    let bytes = bincode::serialize(payload).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    Ok(blake2b_256(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainops_client::payload::contract_state_change;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"hello chain"), blake2b_256(b"hello chain"));
        assert_ne!(blake2b_256(b"hello"), blake2b_256(b"world"));
    }

    #[test]
    fn digest_changes_with_payload() {
        let freeze = contract_state_change("chain1", "FREEZE_CONTRACT", "asset");
        let mut other = freeze.clone();
        other.method = "REVOKE_CONTRACT".into();
        assert_eq!(payload_digest(&freeze).unwrap(), payload_digest(&freeze).unwrap());
        assert_ne!(payload_digest(&freeze).unwrap(), payload_digest(&other).unwrap());
    }
}
