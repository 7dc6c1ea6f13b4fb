//! Ed25519 signing and payload endorsement.

use chainops_client::{
    ClientError, ClientErrorKind, EndorsementEntry, Member, MemberType, Payload, PayloadSigner,
};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

use crate::hash::payload_digest;
use crate::CryptoError;

/// Parse a private key stored either as 32 raw bytes or as 64 hex characters.
pub fn signing_key_from_bytes(key: &[u8]) -> Result<SigningKey, CryptoError> {
    if let Ok(raw) = <[u8; 32]>::try_from(key) {
        return Ok(SigningKey::from_bytes(&raw));
    }
    let text = std::str::from_utf8(key)
        .map_err(|_| CryptoError::InvalidKey(format!("{} bytes, not hex", key.len())))?
        .trim();
    let decoded = hex::decode(text).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let raw: [u8; 32] = decoded
        .try_into()
        .map_err(|v: Vec<u8>| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", v.len())))?;
    Ok(SigningKey::from_bytes(&raw))
}

/// Sign a message, returning the 64-byte signature.
pub fn sign_message(message: &[u8], key: &SigningKey) -> [u8; 64] {
    key.sign(message).to_bytes()
}

/// Returns `true` only for a valid signature of `message` under `public_key`.
pub fn verify_signature(message: &[u8], signature: &[u8], public_key: &VerifyingKey) -> bool {
    let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
        return false;
    };
    public_key.verify(message, &sig).is_ok()
}

/// Check an endorsement produced by [`Ed25519PayloadSigner`].
pub fn verify_endorsement(
    payload: &Payload,
    endorsement: &EndorsementEntry,
    public_key: &VerifyingKey,
) -> Result<bool, CryptoError> {
    let digest = payload_digest(payload)?;
    Ok(verify_signature(&digest, &endorsement.signature, public_key))
}

/// Endorses payloads with an organization's Ed25519 key. The signer member
/// carries the full certificate so the ledger can resolve the identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519PayloadSigner;

impl Ed25519PayloadSigner {
    fn endorse(
        org_id: &str,
        private_key: &[u8],
        cert: &[u8],
        payload: &Payload,
    ) -> Result<EndorsementEntry, CryptoError> {
        let key = signing_key_from_bytes(private_key)?;
        let digest = payload_digest(payload)?;
        Ok(EndorsementEntry {
            signer: Member {
                org_id: org_id.to_string(),
                member_type: MemberType::Cert,
                member_info: cert.to_vec(),
            },
            signature: sign_message(&digest, &key).to_vec(),
        })
    }
}

impl PayloadSigner for Ed25519PayloadSigner {
    fn sign_payload(
        &self,
        org_id: &str,
        private_key: &[u8],
        cert: &[u8],
        payload: &Payload,
    ) -> Result<EndorsementEntry, ClientError> {
        Self::endorse(org_id, private_key, cert, payload)
            .map_err(|e| ClientError::new(ClientErrorKind::Signing, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainops_client::payload::contract_state_change;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    #[test]
    fn sign_and_verify() {
        let sk = key(1);
        let sig = sign_message(b"approve", &sk);
        assert!(verify_signature(b"approve", &sig, &sk.verifying_key()));
        assert!(!verify_signature(b"reject", &sig, &sk.verifying_key()));
        assert!(!verify_signature(b"approve", &sig, &key(2).verifying_key()));
    }

    #[test]
    fn truncated_signature_is_invalid() {
        let sk = key(3);
        let sig = sign_message(b"m", &sk);
        assert!(!verify_signature(b"m", &sig[..10], &sk.verifying_key()));
    }

    #[test]
    fn key_accepts_raw_and_hex() {
        let raw = [9u8; 32];
        let from_raw = signing_key_from_bytes(&raw).unwrap();
        let from_hex = signing_key_from_bytes(format!("{}\n", hex::encode(raw)).as_bytes()).unwrap();
        assert_eq!(from_raw.to_bytes(), from_hex.to_bytes());
        assert!(matches!(
            signing_key_from_bytes(b"abcd"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn endorsement_verifies_against_payload() {
        let sk = key(5);
        let payload = contract_state_change("chain1", "FREEZE_CONTRACT", "asset");
        let entry = Ed25519PayloadSigner
            .sign_payload("org1", &sk.to_bytes(), b"cert-bytes", &payload)
            .unwrap();
        assert_eq!(entry.signer.org_id, "org1");
        assert_eq!(entry.signer.member_type, MemberType::Cert);
        assert!(verify_endorsement(&payload, &entry, &sk.verifying_key()).unwrap());

        let mut tampered = payload.clone();
        tampered.contract_name = "CHAIN_CONFIG".into();
        assert!(!verify_endorsement(&tampered, &entry, &sk.verifying_key()).unwrap());
    }

    #[test]
    fn bad_key_is_a_signing_error() {
        let payload = contract_state_change("chain1", "REVOKE_CONTRACT", "asset");
        let err = Ed25519PayloadSigner
            .sign_payload("org1", b"short", b"cert", &payload)
            .unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Signing);
    }
}
