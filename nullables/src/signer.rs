//! Nullable signer: deterministic endorsements without key material.

use std::sync::Mutex;

use chainops_client::{
    ClientError, ClientErrorKind, EndorsementEntry, Member, MemberType, Payload, PayloadSigner,
};

/// Signs by echoing the org id and tx id, and records who signed.
#[derive(Default)]
pub struct NullSigner {
    signed: Mutex<Vec<String>>,
    fail_for: Mutex<Option<String>>,
}

impl NullSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make signing fail for one organization.
    pub fn fail_for(&self, org_id: &str) {
        *self.fail_for.lock().unwrap() = Some(org_id.to_string());
    }

    /// Org ids in signing order.
    pub fn signed_orgs(&self) -> Vec<String> {
        self.signed.lock().unwrap().clone()
    }
}

impl PayloadSigner for NullSigner {
    fn sign_payload(
        &self,
        org_id: &str,
        _private_key: &[u8],
        cert: &[u8],
        payload: &Payload,
    ) -> Result<EndorsementEntry, ClientError> {
        if self.fail_for.lock().unwrap().as_deref() == Some(org_id) {
            return Err(ClientError::new(
                ClientErrorKind::Signing,
                format!("no usable key for {org_id}"),
            ));
        }
        self.signed.lock().unwrap().push(org_id.to_string());
        Ok(EndorsementEntry {
            signer: Member {
                org_id: org_id.to_string(),
                member_type: MemberType::Cert,
                member_info: cert.to_vec(),
            },
            signature: format!("{org_id}:{}", payload.tx_id).into_bytes(),
        })
    }
}
