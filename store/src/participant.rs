//! Read access to the participant directory.
//!
//! Organizations, nodes and user certificates are registered by the CA
//! subsystem. The engine only reads them; the `put_*` methods exist for
//! that subsystem and for tests.

use chainops_types::{CertRole, NodeInfo, OrgInfo, UserCert};

use crate::StoreError;

pub trait ParticipantStore: Send + Sync {
    fn put_org(&self, org: &OrgInfo) -> Result<(), StoreError>;
    fn org(&self, org_id: &str) -> Result<Option<OrgInfo>, StoreError>;

    fn put_node(&self, node: &NodeInfo) -> Result<(), StoreError>;
    fn node(&self, node_id: &str) -> Result<Option<NodeInfo>, StoreError>;
    fn org_nodes(&self, org_id: &str) -> Result<Vec<NodeInfo>, StoreError>;

    fn put_user_cert(&self, cert: &UserCert) -> Result<(), StoreError>;
    fn user_cert(&self, org_id: &str, role: CertRole) -> Result<Option<UserCert>, StoreError>;
}
