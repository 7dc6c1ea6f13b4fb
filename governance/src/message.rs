//! Audit descriptions rendered into every proposal.

use chainops_types::{Chain, ContractOp, PolicyRule};

use crate::action::{BlockUpdateParams, PermissionParams};

pub fn block_update(current: &Chain, requested: &BlockUpdateParams) -> String {
    let mut changes = Vec::new();
    if requested.block_tx_capacity != 0 {
        changes.push(format!(
            "block transaction capacity {} -> {}",
            current.block_tx_capacity, requested.block_tx_capacity
        ));
    }
    if requested.block_interval != 0 {
        changes.push(format!(
            "block interval {}ms -> {}ms",
            current.block_interval, requested.block_interval
        ));
    }
    if requested.tx_timeout != 0 {
        changes.push(format!(
            "transaction timeout {}s -> {}s",
            current.tx_timeout, requested.tx_timeout
        ));
    }
    format!(
        "Update block parameters of chain {}: {}",
        current.chain_id,
        changes.join(", ")
    )
}

pub fn contract_install(name: &str, version: &str, runtime_type: &str) -> String {
    format!("Install contract {name} version {version} ({runtime_type})")
}

pub fn contract_upgrade(name: &str, from_version: &str, to_version: &str) -> String {
    format!("Upgrade contract {name} from version {from_version} to {to_version}")
}

pub fn contract_state_change(op: ContractOp, name: &str) -> String {
    let verb = match op {
        ContractOp::Init => "Install",
        ContractOp::Upgrade => "Upgrade",
        ContractOp::Freeze => "Freeze",
        ContractOp::Unfreeze => "Unfreeze",
        ContractOp::Revoke => "Revoke",
    };
    format!("{verb} contract {name}")
}

pub fn permission_update(params: &PermissionParams) -> String {
    let rule = match (params.rule, params.percent.as_deref()) {
        (PolicyRule::Percentage, Some(percent)) => format!("PERCENTAGE {percent}"),
        (rule, _) => rule.to_string(),
    };
    let orgs = if params.org_list.is_empty() {
        "all organizations".to_string()
    } else {
        params.org_list.join(", ")
    };
    format!(
        "Set {} policy to {rule} for {orgs} with role {}",
        params.resource, params.role_type
    )
}
