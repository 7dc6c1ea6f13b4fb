//! Per-action validation and payload construction.

use chainops_client::payload::{BlockUpdate, DEFAULT_BLOCK_SIZE};
use chainops_client::{ChainClient, ChainConfig, KeyValuePair, LedgerPolicy, Payload};
use chainops_types::{Chain, Contract, ContractOp, ContractStatus, PolicyRule, RoleType};

use crate::action::{BlockUpdateParams, ContractRef, DeployParams, PermissionParams};
use crate::error::GovernanceError;
use crate::message;
use crate::quorum::parse_percentage;

/// Everything a builder may consult.
pub struct BuildContext<'a> {
    pub client: &'a dyn ChainClient,
    /// Mirrored chain row.
    pub chain: &'a Chain,
    /// Fresh ledger configuration; present at dispatch time.
    pub config: Option<&'a ChainConfig>,
    /// Current row of the governed contract, if any.
    pub contract: Option<&'a Contract>,
}

impl BuildContext<'_> {
    fn sequence(&self) -> u64 {
        self.config
            .map(|config| config.sequence)
            .unwrap_or(self.chain.sequence)
    }
}

pub trait BuildPayload {
    /// Checked once, when the proposal is opened.
    fn validate(&self, ctx: &BuildContext<'_>) -> Result<(), GovernanceError>;

    /// Ledger request for an approved proposal. `None` means the ledger
    /// already holds the requested state.
    fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<Payload>, GovernanceError>;

    fn describe(&self, ctx: &BuildContext<'_>) -> String;
}

impl<T: BuildPayload + ?Sized> BuildPayload for &T {
    fn validate(&self, ctx: &BuildContext<'_>) -> Result<(), GovernanceError> {
        (**self).validate(ctx)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<Payload>, GovernanceError> {
        (**self).build(ctx)
    }

    fn describe(&self, ctx: &BuildContext<'_>) -> String {
        (**self).describe(ctx)
    }
}

impl BuildPayload for BlockUpdateParams {
    fn validate(&self, _ctx: &BuildContext<'_>) -> Result<(), GovernanceError> {
        if self.block_tx_capacity == 0 && self.block_interval == 0 && self.tx_timeout == 0 {
            return Err(GovernanceError::InvalidParams(
                "block update changes nothing".into(),
            ));
        }
        Ok(())
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<Payload>, GovernanceError> {
        let chain = ctx.chain;
        let unchanged = |requested: u32, current: u32| requested == 0 || requested == current;
        if unchanged(self.block_tx_capacity, chain.block_tx_capacity)
            && unchanged(self.block_interval, chain.block_interval)
            && unchanged(self.tx_timeout, chain.tx_timeout)
        {
            return Ok(None);
        }
        let update = BlockUpdate {
            sequence: ctx.sequence(),
            tx_timestamp_verify: ctx
                .config
                .map(|config| config.block.tx_timestamp_verify)
                .unwrap_or(true),
            tx_timeout: self.tx_timeout,
            block_tx_capacity: self.block_tx_capacity,
            block_size: DEFAULT_BLOCK_SIZE,
            block_interval: self.block_interval,
        };
        Ok(Some(
            ctx.client.create_chain_config_block_update_payload(&update),
        ))
    }

    fn describe(&self, ctx: &BuildContext<'_>) -> String {
        message::block_update(ctx.chain, self)
    }
}

/// Install or upgrade of a contract.
pub struct ContractDeploy<'a> {
    op: ContractOp,
    params: &'a DeployParams,
}

impl<'a> ContractDeploy<'a> {
    pub fn new(op: ContractOp, params: &'a DeployParams) -> Self {
        Self { op, params }
    }

    fn init_params(&self) -> Vec<KeyValuePair> {
        self.params
            .params
            .iter()
            .map(|(key, value)| KeyValuePair::new(key.clone(), value.as_bytes().to_vec()))
            .collect()
    }
}

impl BuildPayload for ContractDeploy<'_> {
    fn validate(&self, ctx: &BuildContext<'_>) -> Result<(), GovernanceError> {
        let p = self.params;
        if p.contract_name.is_empty() || p.version.is_empty() || p.runtime_type.is_empty() {
            return Err(GovernanceError::InvalidParams(
                "contract name, version and runtime type are required".into(),
            ));
        }
        if p.bytecode.is_empty() {
            return Err(GovernanceError::InvalidParams("empty contract bytecode".into()));
        }
        match (self.op, ctx.contract) {
            (ContractOp::Init, None) => Ok(()),
            (ContractOp::Init, Some(existing)) => {
                if existing.is_voting() {
                    return Err(GovernanceError::ContractBeingVoted(p.contract_name.clone()));
                }
                if !self.op.is_legal_from(Some(existing.status)) {
                    return Err(GovernanceError::ContractExists(p.contract_name.clone()));
                }
                Ok(())
            }
            (_, None) => Err(GovernanceError::ContractNotFound(p.contract_name.clone())),
            (op, Some(existing)) => {
                check_transition(op, existing)?;
                if existing.runtime_type != p.runtime_type {
                    return Err(GovernanceError::InvalidParams(format!(
                        "runtime type must stay {}",
                        existing.runtime_type
                    )));
                }
                if existing.version == p.version {
                    return Err(GovernanceError::InvalidParams(format!(
                        "contract {} is already at version {}",
                        p.contract_name, p.version
                    )));
                }
                Ok(())
            }
        }
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<Payload>, GovernanceError> {
        let p = self.params;
        let params = self.init_params();
        let payload = match self.op {
            ContractOp::Upgrade => ctx.client.create_contract_upgrade_payload(
                &p.contract_name,
                &p.version,
                &p.bytecode,
                &p.runtime_type,
                &params,
            ),
            _ => ctx.client.create_contract_create_payload(
                &p.contract_name,
                &p.version,
                &p.bytecode,
                &p.runtime_type,
                &params,
            ),
        };
        Ok(Some(payload))
    }

    fn describe(&self, ctx: &BuildContext<'_>) -> String {
        let p = self.params;
        match (self.op, ctx.contract) {
            (ContractOp::Upgrade, Some(existing)) => {
                message::contract_upgrade(&p.contract_name, &existing.version, &p.version)
            }
            _ => message::contract_install(&p.contract_name, &p.version, &p.runtime_type),
        }
    }
}

/// Freeze, unfreeze or revoke.
pub struct ContractStateChange<'a> {
    op: ContractOp,
    target: &'a ContractRef,
}

impl<'a> ContractStateChange<'a> {
    pub fn new(op: ContractOp, target: &'a ContractRef) -> Self {
        Self { op, target }
    }
}

impl BuildPayload for ContractStateChange<'_> {
    fn validate(&self, ctx: &BuildContext<'_>) -> Result<(), GovernanceError> {
        let existing = ctx
            .contract
            .ok_or_else(|| GovernanceError::ContractNotFound(self.target.contract_name.clone()))?;
        check_transition(self.op, existing)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<Payload>, GovernanceError> {
        let name = &self.target.contract_name;
        let payload = match self.op {
            ContractOp::Freeze => ctx.client.create_contract_freeze_payload(name),
            ContractOp::Unfreeze => ctx.client.create_contract_unfreeze_payload(name),
            ContractOp::Revoke => ctx.client.create_contract_revoke_payload(name),
            op => {
                return Err(GovernanceError::InvalidParams(format!(
                    "{} is not a state change",
                    op.method_name()
                )))
            }
        };
        Ok(Some(payload))
    }

    fn describe(&self, _ctx: &BuildContext<'_>) -> String {
        message::contract_state_change(self.op, &self.target.contract_name)
    }
}

fn check_transition(op: ContractOp, existing: &Contract) -> Result<(), GovernanceError> {
    if existing.is_voting() {
        return Err(GovernanceError::ContractBeingVoted(existing.name.clone()));
    }
    if !op.is_legal_from(Some(existing.status)) {
        return Err(illegal(op, &existing.name, Some(existing.status)));
    }
    Ok(())
}

fn illegal(op: ContractOp, name: &str, status: Option<ContractStatus>) -> GovernanceError {
    GovernanceError::IllegalContractState {
        contract: name.to_string(),
        op,
        status,
    }
}

impl PermissionParams {
    fn ledger_policy(&self) -> LedgerPolicy {
        let rule = match (self.rule, &self.percent) {
            (PolicyRule::Percentage, Some(percent)) => percent.clone(),
            (rule, _) => rule.as_str().to_string(),
        };
        LedgerPolicy {
            rule,
            org_list: self.org_list.clone(),
            role_list: self.role_type.role_list(),
        }
    }
}

impl BuildPayload for PermissionParams {
    fn validate(&self, _ctx: &BuildContext<'_>) -> Result<(), GovernanceError> {
        match self.rule {
            PolicyRule::SelfOrg => Err(GovernanceError::InvalidParams(
                "SELF cannot govern multi-organization operations".into(),
            )),
            PolicyRule::Majority if !self.org_list.is_empty() => Err(
                GovernanceError::InvalidParams("MAJORITY applies to every organization".into()),
            ),
            PolicyRule::Majority if self.role_type != RoleType::Admin => Err(
                GovernanceError::InvalidParams("MAJORITY is restricted to the admin role".into()),
            ),
            PolicyRule::Percentage => {
                let percent = self.percent.as_deref().ok_or_else(|| {
                    GovernanceError::MalformedPercentage("missing percentage".into())
                })?;
                parse_percentage(percent).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<Payload>, GovernanceError> {
        let payload = ctx.client.create_chain_config_permission_update_payload(
            ctx.sequence(),
            self.resource.resource_name(),
            &self.ledger_policy(),
        )?;
        Ok(Some(payload))
    }

    fn describe(&self, _ctx: &BuildContext<'_>) -> String {
        message::permission_update(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainops_client::payload::{config_method, param_key, system_contract};
    use chainops_nullables::NullChainClient;
    use chainops_types::{MultiSignStatus, ResourceType, Timestamp};

    fn contract(status: ContractStatus, voting: bool) -> Contract {
        Contract {
            chain_id: "c1".into(),
            name: "asset".into(),
            version: "1.0".into(),
            runtime_type: "WASMER".into(),
            org_id: "org1".into(),
            status,
            multi_sign_status: if voting {
                MultiSignStatus::Voting
            } else {
                MultiSignStatus::NoVoting
            },
            tx_id: None,
            updated_at: Timestamp::EPOCH,
        }
    }

    fn deploy(version: &str) -> DeployParams {
        DeployParams {
            contract_name: "asset".into(),
            version: version.into(),
            runtime_type: "WASMER".into(),
            bytecode: vec![0, 97, 115, 109],
            params: Default::default(),
        }
    }

    fn ctx<'a>(
        client: &'a NullChainClient,
        chain: &'a Chain,
        contract: Option<&'a Contract>,
    ) -> BuildContext<'a> {
        BuildContext {
            client,
            chain,
            config: None,
            contract,
        }
    }

    #[test]
    fn install_over_failed_install_is_allowed() {
        let client = NullChainClient::new(ChainConfig::default());
        let chain = Chain::new("c1", "c1");
        let failed = contract(ContractStatus::InitFailure, false);
        let ok = contract(ContractStatus::InitOk, false);
        let binding = deploy("1.0");
        let install = ContractDeploy::new(ContractOp::Init, &binding);
        assert!(install.validate(&ctx(&client, &chain, None)).is_ok());
        assert!(install.validate(&ctx(&client, &chain, Some(&failed))).is_ok());
        assert!(matches!(
            install.validate(&ctx(&client, &chain, Some(&ok))),
            Err(GovernanceError::ContractExists(_))
        ));
    }

    #[test]
    fn upgrade_requires_new_version_and_same_runtime() {
        let client = NullChainClient::new(ChainConfig::default());
        let chain = Chain::new("c1", "c1");
        let current = contract(ContractStatus::InitOk, false);
        let same = deploy("1.0");
        let upgrade = ContractDeploy::new(ContractOp::Upgrade, &same);
        assert!(matches!(
            upgrade.validate(&ctx(&client, &chain, Some(&current))),
            Err(GovernanceError::InvalidParams(_))
        ));
        let mut other_runtime = deploy("2.0");
        other_runtime.runtime_type = "GASM".into();
        let upgrade = ContractDeploy::new(ContractOp::Upgrade, &other_runtime);
        assert!(upgrade
            .validate(&ctx(&client, &chain, Some(&current)))
            .is_err());
        let next = deploy("2.0");
        let upgrade = ContractDeploy::new(ContractOp::Upgrade, &next);
        assert!(upgrade
            .validate(&ctx(&client, &chain, Some(&current)))
            .is_ok());
        assert_eq!(
            upgrade.describe(&ctx(&client, &chain, Some(&current))),
            "Upgrade contract asset from version 1.0 to 2.0"
        );
    }

    #[test]
    fn state_changes_follow_lifecycle() {
        let client = NullChainClient::new(ChainConfig::default());
        let chain = Chain::new("c1", "c1");
        let target = ContractRef {
            contract_name: "asset".into(),
        };
        let frozen = contract(ContractStatus::FreezeOk, false);
        let freeze = ContractStateChange::new(ContractOp::Freeze, &target);
        assert!(matches!(
            freeze.validate(&ctx(&client, &chain, Some(&frozen))),
            Err(GovernanceError::IllegalContractState { .. })
        ));
        let unfreeze = ContractStateChange::new(ContractOp::Unfreeze, &target);
        assert!(unfreeze.validate(&ctx(&client, &chain, Some(&frozen))).is_ok());

        let voting = contract(ContractStatus::FreezeOk, true);
        assert!(matches!(
            unfreeze.validate(&ctx(&client, &chain, Some(&voting))),
            Err(GovernanceError::ContractBeingVoted(_))
        ));
        assert!(matches!(
            unfreeze.validate(&ctx(&client, &chain, None)),
            Err(GovernanceError::ContractNotFound(_))
        ));

        let payload = unfreeze
            .build(&ctx(&client, &chain, Some(&frozen)))
            .unwrap()
            .unwrap();
        assert_eq!(payload.contract_name, system_contract::CONTRACT_MANAGE);
        assert_eq!(payload.method, "UNFREEZE_CONTRACT");
    }

    #[test]
    fn block_update_equal_to_mirror_builds_nothing() {
        let client = NullChainClient::new(ChainConfig::default());
        let mut chain = Chain::new("c1", "c1");
        chain.block_tx_capacity = 100;
        chain.block_interval = 2000;
        chain.tx_timeout = 600;
        let same = BlockUpdateParams {
            block_tx_capacity: 100,
            block_interval: 0,
            tx_timeout: 600,
        };
        assert!(same.build(&ctx(&client, &chain, None)).unwrap().is_none());

        let bigger = BlockUpdateParams {
            block_tx_capacity: 500,
            block_interval: 0,
            tx_timeout: 0,
        };
        let payload = bigger.build(&ctx(&client, &chain, None)).unwrap().unwrap();
        assert_eq!(payload.method, config_method::BLOCK_UPDATE);
        assert!(payload.parameter(param_key::BLOCK_TX_CAPACITY).is_some());

        let nothing = BlockUpdateParams {
            block_tx_capacity: 0,
            block_interval: 0,
            tx_timeout: 0,
        };
        assert!(nothing.validate(&ctx(&client, &chain, None)).is_err());
    }

    #[test]
    fn permission_update_rejects_restricted_majority() {
        let client = NullChainClient::new(ChainConfig::default());
        let chain = Chain::new("c1", "c1");
        let mut params = PermissionParams {
            resource: ResourceType::FreezeContract,
            rule: PolicyRule::Majority,
            percent: None,
            org_list: vec!["org1".into()],
            role_type: RoleType::Admin,
        };
        assert!(params.validate(&ctx(&client, &chain, None)).is_err());
        params.org_list.clear();
        params.role_type = RoleType::Client;
        assert!(params.validate(&ctx(&client, &chain, None)).is_err());
        params.role_type = RoleType::Admin;
        assert!(params.validate(&ctx(&client, &chain, None)).is_ok());

        params.rule = PolicyRule::Percentage;
        params.percent = Some("abc".into());
        assert!(matches!(
            params.validate(&ctx(&client, &chain, None)),
            Err(GovernanceError::MalformedPercentage(_))
        ));
        params.percent = Some("60".into());
        assert_eq!(params.ledger_policy().rule, "60");
        let payload = params.build(&ctx(&client, &chain, None)).unwrap().unwrap();
        assert_eq!(payload.method, config_method::PERMISSION_UPDATE);
    }
}
