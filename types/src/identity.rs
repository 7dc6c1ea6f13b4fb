//! Participant identities and connection credentials.
//!
//! Certificates and keys are issued by an external CA subsystem; this crate
//! only carries them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a user certificate was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertRole {
    Admin,
    Client,
}

impl fmt::Display for CertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Client => f.write_str("client"),
        }
    }
}

/// A user certificate and signing key belonging to an organization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCert {
    pub org_id: String,
    pub role: CertRole,
    pub user_name: String,
    /// PEM or DER certificate bytes.
    pub cert: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl fmt::Debug for UserCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCert")
            .field("org_id", &self.org_id)
            .field("role", &self.role)
            .field("user_name", &self.user_name)
            .finish_non_exhaustive()
    }
}

/// A registered organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgInfo {
    pub org_id: String,
    pub org_name: String,
}

/// A registered node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_id: String,
    pub node_name: String,
    pub org_id: String,
    pub address: String,
}

/// Everything needed to open a client connection to one ledger node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub chain_id: String,
    pub org_id: String,
    pub user_name: String,
    /// `host:port` of the ledger node.
    pub node_addr: String,
    pub tls: bool,
    /// Server name expected in the node's TLS certificate.
    pub tls_host: String,
    pub ca_cert: Vec<u8>,
    pub user_cert: Vec<u8>,
    pub user_key: Vec<u8>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("chain_id", &self.chain_id)
            .field("org_id", &self.org_id)
            .field("user_name", &self.user_name)
            .field("node_addr", &self.node_addr)
            .field("tls", &self.tls)
            .field("tls_host", &self.tls_host)
            .finish_non_exhaustive()
    }
}
