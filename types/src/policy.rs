//! Governance policy records.
//!
//! A [`Policy`] exists per (chain, [`ResourceType`]) and is derived from the
//! chain's on-ledger resource policies. [`PolicyOrg`] rows record which
//! organizations may vote under it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Privileged operations that require a multi-organization vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    BlockUpdate,
    InitContract,
    UpgradeContract,
    FreezeContract,
    UnfreezeContract,
    RevokeContract,
    PermissionUpdate,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        Self::BlockUpdate,
        Self::InitContract,
        Self::UpgradeContract,
        Self::FreezeContract,
        Self::UnfreezeContract,
        Self::RevokeContract,
        Self::PermissionUpdate,
    ];

    /// Resource name as it appears in the ledger's chain configuration.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::BlockUpdate => "CHAIN_CONFIG-BLOCK_UPDATE",
            Self::InitContract => "CONTRACT_MANAGE-INIT_CONTRACT",
            Self::UpgradeContract => "CONTRACT_MANAGE-UPGRADE_CONTRACT",
            Self::FreezeContract => "CONTRACT_MANAGE-FREEZE_CONTRACT",
            Self::UnfreezeContract => "CONTRACT_MANAGE-UNFREEZE_CONTRACT",
            Self::RevokeContract => "CONTRACT_MANAGE-REVOKE_CONTRACT",
            Self::PermissionUpdate => "CHAIN_CONFIG-PERMISSION_UPDATE",
        }
    }

    pub fn from_resource_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.resource_name() == name)
    }

    /// Numeric code used by the console API.
    pub fn code(&self) -> u8 {
        match self {
            Self::BlockUpdate => 3,
            Self::InitContract => 4,
            Self::UpgradeContract => 5,
            Self::FreezeContract => 6,
            Self::UnfreezeContract => 7,
            Self::RevokeContract => 8,
            Self::PermissionUpdate => 9,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Rule applied when the ledger has no explicit entry for this resource.
    pub fn default_rule(&self) -> PolicyRule {
        match self {
            Self::PermissionUpdate => PolicyRule::All,
            _ => PolicyRule::Majority,
        }
    }

    /// Whether the governed object is a contract.
    pub fn is_contract_op(&self) -> bool {
        !matches!(self, Self::BlockUpdate | Self::PermissionUpdate)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// Quorum rule of a policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyRule {
    Majority,
    Any,
    /// Only the owning org may act. Not supported for multi-org votes.
    SelfOrg,
    All,
    Percentage,
    Forbidden,
}

impl PolicyRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Majority => "MAJORITY",
            Self::Any => "ANY",
            Self::SelfOrg => "SELF",
            Self::All => "ALL",
            Self::Percentage => "PERCENTAGE",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    /// Numeric code used by the console API.
    pub fn code(&self) -> u8 {
        match self {
            Self::Majority => 0,
            Self::Any => 1,
            Self::SelfOrg => 2,
            Self::All => 3,
            Self::Forbidden => 4,
            Self::Percentage => 5,
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyRule {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAJORITY" => Ok(Self::Majority),
            "ANY" => Ok(Self::Any),
            "SELF" => Ok(Self::SelfOrg),
            "ALL" => Ok(Self::All),
            "PERCENTAGE" => Ok(Self::Percentage),
            "FORBIDDEN" => Ok(Self::Forbidden),
            other => Err(TypesError::unknown("policy rule", other)),
        }
    }
}

/// Which certificate role an org must sign with under a policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleType {
    Admin,
    Client,
    All,
}

impl RoleType {
    /// Derive from a ledger role list: exactly one known role selects it,
    /// a single unknown role falls back to admin, anything else is `All`.
    pub fn from_role_list<S: AsRef<str>>(roles: &[S]) -> Self {
        match roles {
            [only] => match only.as_ref().to_ascii_lowercase().as_str() {
                "client" => Self::Client,
                _ => Self::Admin,
            },
            _ => Self::All,
        }
    }

    /// Role names written back to the ledger.
    pub fn role_list(&self) -> Vec<String> {
        match self {
            Self::Admin => vec!["ADMIN".into()],
            Self::Client => vec!["CLIENT".into()],
            Self::All => vec!["ADMIN".into(), "CLIENT".into()],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Client => "CLIENT",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyOrgStatus {
    Selected,
    NotSelected,
}

/// Quorum rule for one resource on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub chain_id: String,
    pub resource: ResourceType,
    pub rule: PolicyRule,
    pub role_type: RoleType,
    /// Raw percentage string, only meaningful for [`PolicyRule::Percentage`].
    pub percent: Option<String>,
}

impl Policy {
    pub fn default_for(chain_id: impl Into<String>, resource: ResourceType) -> Self {
        Self {
            chain_id: chain_id.into(),
            resource,
            rule: resource.default_rule(),
            role_type: RoleType::Admin,
            percent: None,
        }
    }
}

/// Voting eligibility of one organization under a policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOrg {
    pub chain_id: String,
    pub resource: ResourceType,
    pub org_id: String,
    pub org_name: String,
    pub status: PolicyOrgStatus,
}

impl PolicyOrg {
    pub fn is_selected(&self) -> bool {
        self.status == PolicyOrgStatus::Selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_round_trip() {
        for resource in ResourceType::ALL {
            assert_eq!(
                ResourceType::from_resource_name(resource.resource_name()),
                Some(resource)
            );
            assert_eq!(ResourceType::from_code(resource.code()), Some(resource));
        }
        assert_eq!(ResourceType::from_resource_name("CHAIN_CONFIG-CORE_UPDATE"), None);
    }

    #[test]
    fn permission_update_defaults_to_all() {
        assert_eq!(
            Policy::default_for("c1", ResourceType::PermissionUpdate).rule,
            PolicyRule::All
        );
        assert_eq!(
            Policy::default_for("c1", ResourceType::FreezeContract).rule,
            PolicyRule::Majority
        );
    }

    #[test]
    fn role_type_from_role_list() {
        assert_eq!(RoleType::from_role_list(&["admin"]), RoleType::Admin);
        assert_eq!(RoleType::from_role_list(&["CLIENT"]), RoleType::Client);
        assert_eq!(RoleType::from_role_list(&["consensus"]), RoleType::Admin);
        assert_eq!(RoleType::from_role_list(&["admin", "client"]), RoleType::All);
        assert_eq!(RoleType::from_role_list::<&str>(&[]), RoleType::All);
    }

    #[test]
    fn rule_names_parse() {
        assert_eq!("SELF".parse::<PolicyRule>().unwrap(), PolicyRule::SelfOrg);
        assert!("MOST".parse::<PolicyRule>().is_err());
    }
}
