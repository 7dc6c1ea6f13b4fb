//! Capabilities consumed from a ledger node.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainops_types::Credentials;
use tokio::sync::mpsc;

use crate::block::{BlockInfo, NodeTopology};
use crate::config::{ChainConfig, LedgerPolicy};
use crate::error::{ClientError, ClientErrorKind};
use crate::payload::{self, BlockUpdate};
use crate::tx::{CertInfo, EndorsementEntry, KeyValuePair, Payload, TxResponse};

/// Blocks delivered by a subscription. The channel closes when the node
/// ends the stream.
pub type BlockStream = mpsc::Receiver<Result<BlockInfo, ClientError>>;

/// A connected client for one chain on one ledger node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain_id(&self) -> &str;

    async fn get_chain_config(&self) -> Result<ChainConfig, ClientError>;

    async fn get_chain_info(&self) -> Result<NodeTopology, ClientError>;

    /// Subscribe to blocks from `start`. `end = None` follows the chain tip.
    async fn subscribe_block(
        &self,
        start: u64,
        end: Option<u64>,
        with_rw_set: bool,
        only_header: bool,
    ) -> Result<BlockStream, ClientError>;

    async fn query_cert(&self, cert_hashes: &[String]) -> Result<Vec<CertInfo>, ClientError>;

    async fn send_contract_manage_request(
        &self,
        payload: Payload,
        endorsements: Vec<EndorsementEntry>,
        timeout: Duration,
        with_sync_result: bool,
    ) -> Result<TxResponse, ClientError>;

    async fn send_chain_config_update_request(
        &self,
        payload: Payload,
        endorsements: Vec<EndorsementEntry>,
        timeout: Duration,
        with_sync_result: bool,
    ) -> Result<TxResponse, ClientError>;

    fn create_contract_create_payload(
        &self,
        name: &str,
        version: &str,
        bytecode: &[u8],
        runtime_type: &str,
        init_params: &[KeyValuePair],
    ) -> Payload {
        payload::contract_deploy(
            self.chain_id(),
            "INIT_CONTRACT",
            name,
            version,
            bytecode,
            runtime_type,
            init_params,
        )
    }

    fn create_contract_upgrade_payload(
        &self,
        name: &str,
        version: &str,
        bytecode: &[u8],
        runtime_type: &str,
        upgrade_params: &[KeyValuePair],
    ) -> Payload {
        payload::contract_deploy(
            self.chain_id(),
            "UPGRADE_CONTRACT",
            name,
            version,
            bytecode,
            runtime_type,
            upgrade_params,
        )
    }

    fn create_contract_freeze_payload(&self, name: &str) -> Payload {
        payload::contract_state_change(self.chain_id(), "FREEZE_CONTRACT", name)
    }

    fn create_contract_unfreeze_payload(&self, name: &str) -> Payload {
        payload::contract_state_change(self.chain_id(), "UNFREEZE_CONTRACT", name)
    }

    fn create_contract_revoke_payload(&self, name: &str) -> Payload {
        payload::contract_state_change(self.chain_id(), "REVOKE_CONTRACT", name)
    }

    fn create_chain_config_block_update_payload(&self, update: &BlockUpdate) -> Payload {
        payload::block_update(self.chain_id(), update)
    }

    fn create_chain_config_permission_update_payload(
        &self,
        sequence: u64,
        resource_name: &str,
        policy: &LedgerPolicy,
    ) -> Result<Payload, ClientError> {
        payload::permission_update(self.chain_id(), sequence, resource_name, policy)
            .map_err(|e| ClientError::new(ClientErrorKind::Other, e.to_string()))
    }
}

/// Opens client connections from credentials.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn ChainClient>, ClientError>;
}

/// Produces an organization's endorsement of a payload.
pub trait PayloadSigner: Send + Sync {
    fn sign_payload(
        &self,
        org_id: &str,
        private_key: &[u8],
        cert: &[u8],
        payload: &Payload,
    ) -> Result<EndorsementEntry, ClientError>;
}
