//! Contract lifecycle records.

use serde::{Deserialize, Serialize};

use crate::policy::ResourceType;
use crate::time::Timestamp;

/// Lifecycle state of a user contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Proposed for installation, not yet on the ledger.
    InitStored,
    InitOk,
    InitFailure,
    UpgradeOk,
    UpgradeFailure,
    FreezeOk,
    FreezeFailure,
    UnfreezeOk,
    UnfreezeFailure,
    RevokeOk,
    RevokeFailure,
}

/// Whether a governance vote is open on the contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiSignStatus {
    Voting,
    #[default]
    NoVoting,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub chain_id: String,
    pub name: String,
    pub version: String,
    pub runtime_type: String,
    pub org_id: String,
    pub status: ContractStatus,
    pub multi_sign_status: MultiSignStatus,
    /// Last transaction that changed the contract, if any.
    pub tx_id: Option<String>,
    pub updated_at: Timestamp,
}

impl Contract {
    pub fn is_voting(&self) -> bool {
        self.multi_sign_status == MultiSignStatus::Voting
    }
}

/// Contract management operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractOp {
    Init,
    Upgrade,
    Freeze,
    Unfreeze,
    Revoke,
}

impl ContractOp {
    /// Method name on the contract management system contract.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Init => "INIT_CONTRACT",
            Self::Upgrade => "UPGRADE_CONTRACT",
            Self::Freeze => "FREEZE_CONTRACT",
            Self::Unfreeze => "UNFREEZE_CONTRACT",
            Self::Revoke => "REVOKE_CONTRACT",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        [
            Self::Init,
            Self::Upgrade,
            Self::Freeze,
            Self::Unfreeze,
            Self::Revoke,
        ]
        .into_iter()
        .find(|op| op.method_name() == method)
    }

    pub fn from_resource(resource: ResourceType) -> Option<Self> {
        match resource {
            ResourceType::InitContract => Some(Self::Init),
            ResourceType::UpgradeContract => Some(Self::Upgrade),
            ResourceType::FreezeContract => Some(Self::Freeze),
            ResourceType::UnfreezeContract => Some(Self::Unfreeze),
            ResourceType::RevokeContract => Some(Self::Revoke),
            ResourceType::BlockUpdate | ResourceType::PermissionUpdate => None,
        }
    }

    pub fn resource(&self) -> ResourceType {
        match self {
            Self::Init => ResourceType::InitContract,
            Self::Upgrade => ResourceType::UpgradeContract,
            Self::Freeze => ResourceType::FreezeContract,
            Self::Unfreeze => ResourceType::UnfreezeContract,
            Self::Revoke => ResourceType::RevokeContract,
        }
    }

    pub fn success_status(&self) -> ContractStatus {
        match self {
            Self::Init => ContractStatus::InitOk,
            Self::Upgrade => ContractStatus::UpgradeOk,
            Self::Freeze => ContractStatus::FreezeOk,
            Self::Unfreeze => ContractStatus::UnfreezeOk,
            Self::Revoke => ContractStatus::RevokeOk,
        }
    }

    pub fn failure_status(&self) -> ContractStatus {
        match self {
            Self::Init => ContractStatus::InitFailure,
            Self::Upgrade => ContractStatus::UpgradeFailure,
            Self::Freeze => ContractStatus::FreezeFailure,
            Self::Unfreeze => ContractStatus::UnfreezeFailure,
            Self::Revoke => ContractStatus::RevokeFailure,
        }
    }

    /// Whether the operation may be applied to a contract in `current`.
    /// `None` means the contract does not exist yet.
    pub fn is_legal_from(&self, current: Option<ContractStatus>) -> bool {
        use ContractStatus::*;
        let Some(status) = current else {
            return *self == Self::Init;
        };
        match self {
            Self::Init => matches!(status, InitStored | InitFailure),
            Self::Upgrade => matches!(
                status,
                InitOk | UpgradeOk | UpgradeFailure | FreezeFailure | UnfreezeOk
            ),
            Self::Freeze => matches!(status, InitOk | UpgradeOk | UnfreezeOk),
            Self::Unfreeze => matches!(status, FreezeOk | UnfreezeFailure),
            Self::Revoke => matches!(
                status,
                InitOk
                    | UpgradeOk
                    | FreezeOk
                    | FreezeFailure
                    | UnfreezeOk
                    | UnfreezeFailure
                    | RevokeFailure
            ),
        }
    }
}
