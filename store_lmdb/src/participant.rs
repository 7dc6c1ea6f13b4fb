//! LMDB implementation of ParticipantStore.

use chainops_store::{ParticipantStore, StoreError};
use chainops_types::{CertRole, NodeInfo, OrgInfo, UserCert};

use crate::environment::key;
use crate::{LmdbEnvironment, LmdbError};

fn role_key(org_id: &str, role: CertRole) -> String {
    key(&[org_id, &role.to_string()])
}

impl ParticipantStore for LmdbEnvironment {
    fn put_org(&self, org: &OrgInfo) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.orgs_db
            .put(&mut wtxn, &org.org_id, org)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn org(&self, org_id: &str) -> Result<Option<OrgInfo>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.orgs_db.get(&rtxn, org_id).map_err(LmdbError::from)?)
    }

    fn put_node(&self, node: &NodeInfo) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.nodes_db
            .put(&mut wtxn, &node.node_id, node)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn node(&self, node_id: &str) -> Result<Option<NodeInfo>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.nodes_db.get(&rtxn, node_id).map_err(LmdbError::from)?)
    }

    fn org_nodes(&self, org_id: &str) -> Result<Vec<NodeInfo>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut nodes = Vec::new();
        for entry in self.nodes_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, node) = entry.map_err(LmdbError::from)?;
            if node.org_id == org_id {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn put_user_cert(&self, cert: &UserCert) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.user_certs_db
            .put(&mut wtxn, &role_key(&cert.org_id, cert.role), cert)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn user_cert(&self, org_id: &str, role: CertRole) -> Result<Option<UserCert>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .user_certs_db
            .get(&rtxn, &role_key(org_id, role))
            .map_err(LmdbError::from)?)
    }
}
