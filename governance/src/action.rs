//! Governed actions and their parameters.
//!
//! A proposal stores its action as JSON; the `type` tag selects both the
//! resource whose policy governs it and the payload builder that turns it
//! into a ledger request.

use std::collections::BTreeMap;

use chainops_types::{ContractOp, PolicyRule, ResourceType, RoleType};
use serde::{Deserialize, Serialize};

use crate::builders::{BuildPayload, ContractDeploy, ContractStateChange};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUpdateParams {
    pub block_tx_capacity: u32,
    /// Milliseconds.
    pub block_interval: u32,
    /// Seconds.
    pub tx_timeout: u32,
}

/// Install or upgrade parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParams {
    pub contract_name: String,
    pub version: String,
    pub runtime_type: String,
    #[serde(with = "hex_bytes")]
    pub bytecode: Vec<u8>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRef {
    pub contract_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionParams {
    pub resource: ResourceType,
    pub rule: PolicyRule,
    #[serde(default)]
    pub percent: Option<String>,
    #[serde(default)]
    pub org_list: Vec<String>,
    pub role_type: RoleType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernedAction {
    BlockUpdate(BlockUpdateParams),
    InitContract(DeployParams),
    UpgradeContract(DeployParams),
    FreezeContract(ContractRef),
    UnfreezeContract(ContractRef),
    RevokeContract(ContractRef),
    PermissionUpdate(PermissionParams),
}

impl GovernedAction {
    pub fn resource(&self) -> ResourceType {
        match self {
            Self::BlockUpdate(_) => ResourceType::BlockUpdate,
            Self::InitContract(_) => ResourceType::InitContract,
            Self::UpgradeContract(_) => ResourceType::UpgradeContract,
            Self::FreezeContract(_) => ResourceType::FreezeContract,
            Self::UnfreezeContract(_) => ResourceType::UnfreezeContract,
            Self::RevokeContract(_) => ResourceType::RevokeContract,
            Self::PermissionUpdate(_) => ResourceType::PermissionUpdate,
        }
    }

    /// The governed contract, for contract operations.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::InitContract(p) | Self::UpgradeContract(p) => Some(&p.contract_name),
            Self::FreezeContract(c) | Self::UnfreezeContract(c) | Self::RevokeContract(c) => {
                Some(&c.contract_name)
            }
            Self::BlockUpdate(_) | Self::PermissionUpdate(_) => None,
        }
    }

    pub fn contract_op(&self) -> Option<ContractOp> {
        ContractOp::from_resource(self.resource())
    }

    /// Payload builder for this action.
    pub fn builder(&self) -> Box<dyn BuildPayload + '_> {
        match self {
            Self::BlockUpdate(p) => Box::new(p),
            Self::InitContract(p) => Box::new(ContractDeploy::new(ContractOp::Init, p)),
            Self::UpgradeContract(p) => Box::new(ContractDeploy::new(ContractOp::Upgrade, p)),
            Self::FreezeContract(c) => Box::new(ContractStateChange::new(ContractOp::Freeze, c)),
            Self::UnfreezeContract(c) => {
                Box::new(ContractStateChange::new(ContractOp::Unfreeze, c))
            }
            Self::RevokeContract(c) => Box::new(ContractStateChange::new(ContractOp::Revoke, c)),
            Self::PermissionUpdate(p) => Box::new(p),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
