//! Policy derivation from ledger configuration.
//!
//! Every governed resource gets exactly one policy per chain: the ledger's
//! explicit entry when present, otherwise the resource's default rule with
//! the admin role. Refreshing replaces policy and eligibility rows wholesale,
//! so it can run on every config reload.

use chainops_client::{ChainConfig, LedgerPolicy};
use chainops_store::{PolicyStore, RelationStore};
use chainops_types::{
    ChainOrg, Policy, PolicyOrg, PolicyOrgStatus, PolicyRule, ResourceType, RoleType,
};

use crate::quorum::parse_percentage;
use crate::GovernanceError;

/// A policy together with its per-organization eligibility rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedPolicy {
    pub policy: Policy,
    pub orgs: Vec<PolicyOrg>,
}

/// Map a ledger rule string onto a [`PolicyRule`].
///
/// Rule names are matched case-insensitively. A numeric rule (`"60"`,
/// `"60%"`, `"2/3"`) is a percentage and is returned as the percentage
/// string. The bare word `PERCENTAGE` carries no value and fails later,
/// when a threshold is computed from it.
pub fn parse_ledger_rule(rule: &str) -> Result<(PolicyRule, Option<String>), GovernanceError> {
    let trimmed = rule.trim();
    if let Ok(named) = trimmed.to_ascii_uppercase().parse::<PolicyRule>() {
        return Ok((named, None));
    }
    match parse_percentage(trimmed) {
        Ok(_) => Ok((PolicyRule::Percentage, Some(trimmed.to_string()))),
        Err(_) => Err(GovernanceError::InvalidPolicyRule(rule.to_string())),
    }
}

fn eligibility(
    chain_id: &str,
    resource: ResourceType,
    org_list: &[String],
    chain_orgs: &[ChainOrg],
) -> Vec<PolicyOrg> {
    chain_orgs
        .iter()
        .map(|org| {
            let selected = org_list.is_empty() || org_list.iter().any(|id| *id == org.org_id);
            PolicyOrg {
                chain_id: chain_id.to_string(),
                resource,
                org_id: org.org_id.clone(),
                org_name: org.org_name.clone(),
                status: if selected {
                    PolicyOrgStatus::Selected
                } else {
                    PolicyOrgStatus::NotSelected
                },
            }
        })
        .collect()
}

fn from_ledger(
    chain_id: &str,
    resource: ResourceType,
    entry: &LedgerPolicy,
) -> Result<Policy, GovernanceError> {
    let (rule, percent) = parse_ledger_rule(&entry.rule)?;
    Ok(Policy {
        chain_id: chain_id.to_string(),
        resource,
        rule,
        role_type: RoleType::from_role_list(&entry.role_list),
        percent,
    })
}

/// Derive the policy of every governed resource from `config`.
///
/// Resource policies the engine does not govern are ignored. An entry whose
/// rule cannot be parsed is logged and replaced by the default.
pub fn derive_policies(
    chain_id: &str,
    config: &ChainConfig,
    chain_orgs: &[ChainOrg],
) -> Vec<DerivedPolicy> {
    ResourceType::ALL
        .into_iter()
        .map(|resource| {
            let explicit = config
                .resource_policy(resource.resource_name())
                .and_then(|entry| match from_ledger(chain_id, resource, entry) {
                    Ok(policy) => Some((policy, entry.org_list.as_slice())),
                    Err(e) => {
                        tracing::warn!(
                            chain = chain_id,
                            resource = %resource,
                            error = %e,
                            "unusable ledger policy, falling back to default"
                        );
                        None
                    }
                });
            let (policy, org_list) =
                explicit.unwrap_or_else(|| (Policy::default_for(chain_id, resource), &[][..]));
            let orgs = eligibility(chain_id, resource, org_list, chain_orgs);
            DerivedPolicy { policy, orgs }
        })
        .collect()
}

/// Re-derive and store every policy of a chain. Returns the number of
/// policies written.
///
/// Eligibility is computed against the chain's mirrored organizations, or
/// the config's trust roots when none are mirrored yet.
pub fn refresh_policies<S>(
    store: &S,
    chain_id: &str,
    config: &ChainConfig,
) -> Result<usize, GovernanceError>
where
    S: PolicyStore + RelationStore + ?Sized,
{
    let mut chain_orgs = store.chain_orgs(chain_id)?;
    if chain_orgs.is_empty() {
        chain_orgs = config
            .trusted_org_ids()
            .map(|org_id| ChainOrg {
                chain_id: chain_id.to_string(),
                org_id: org_id.to_string(),
                org_name: org_id.to_string(),
            })
            .collect();
    }

    let derived = derive_policies(chain_id, config, &chain_orgs);
    for entry in &derived {
        store.replace_policy(&entry.policy, &entry.orgs)?;
    }
    tracing::debug!(chain = chain_id, policies = derived.len(), "policies refreshed");
    Ok(derived.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainops_client::{ResourcePolicy, TrustRoot};
    use chainops_nullables::NullStore;

    fn entry(name: &str, rule: &str, orgs: &[&str], roles: &[&str]) -> ResourcePolicy {
        ResourcePolicy {
            resource_name: name.into(),
            policy: LedgerPolicy {
                rule: rule.into(),
                org_list: orgs.iter().map(|s| s.to_string()).collect(),
                role_list: roles.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn config(resource_policies: Vec<ResourcePolicy>) -> ChainConfig {
        ChainConfig {
            chain_id: "c1".into(),
            trust_roots: ["org1", "org2", "org3"]
                .iter()
                .map(|id| TrustRoot {
                    org_id: id.to_string(),
                    root: vec![],
                })
                .collect(),
            resource_policies,
            ..ChainConfig::default()
        }
    }

    fn find(derived: &[DerivedPolicy], resource: ResourceType) -> &DerivedPolicy {
        derived
            .iter()
            .find(|d| d.policy.resource == resource)
            .unwrap()
    }

    fn org(id: &str) -> ChainOrg {
        ChainOrg {
            chain_id: "c1".into(),
            org_id: id.into(),
            org_name: id.into(),
        }
    }

    #[test]
    fn ledger_rules_map_canonically() {
        assert_eq!(parse_ledger_rule("MAJORITY").unwrap(), (PolicyRule::Majority, None));
        assert_eq!(parse_ledger_rule("any").unwrap(), (PolicyRule::Any, None));
        assert_eq!(parse_ledger_rule("SELF").unwrap(), (PolicyRule::SelfOrg, None));
        assert_eq!(parse_ledger_rule("FORBIDDEN").unwrap(), (PolicyRule::Forbidden, None));
        assert_eq!(
            parse_ledger_rule("60").unwrap(),
            (PolicyRule::Percentage, Some("60".into()))
        );
        assert_eq!(
            parse_ledger_rule("2/3").unwrap(),
            (PolicyRule::Percentage, Some("2/3".into()))
        );
        assert_eq!(parse_ledger_rule("PERCENTAGE").unwrap(), (PolicyRule::Percentage, None));
        assert!(matches!(
            parse_ledger_rule("SOMETIMES"),
            Err(GovernanceError::InvalidPolicyRule(_))
        ));
    }

    #[test]
    fn missing_resources_get_defaults() {
        let orgs = [org("org1"), org("org2")];
        let derived = derive_policies("c1", &config(vec![]), &orgs);
        assert_eq!(derived.len(), ResourceType::ALL.len());

        let freeze = find(&derived, ResourceType::FreezeContract);
        assert_eq!(freeze.policy.rule, PolicyRule::Majority);
        assert_eq!(freeze.policy.role_type, RoleType::Admin);
        assert!(freeze.orgs.iter().all(PolicyOrg::is_selected));

        let permission = find(&derived, ResourceType::PermissionUpdate);
        assert_eq!(permission.policy.rule, PolicyRule::All);
    }

    #[test]
    fn explicit_entry_is_used_verbatim() {
        let cfg = config(vec![
            entry("CONTRACT_MANAGE-INIT_CONTRACT", "ANY", &["org2"], &["client"]),
            entry("CHAIN_CONFIG-PERMISSION_UPDATE", "MAJORITY", &[], &["admin", "client"]),
            entry("CHAIN_CONFIG-CORE_UPDATE", "ALL", &[], &[]),
        ]);
        let orgs = [org("org1"), org("org2"), org("org3")];
        let derived = derive_policies("c1", &cfg, &orgs);

        let init = find(&derived, ResourceType::InitContract);
        assert_eq!(init.policy.rule, PolicyRule::Any);
        assert_eq!(init.policy.role_type, RoleType::Client);
        let selected: Vec<_> = init
            .orgs
            .iter()
            .filter(|o| o.is_selected())
            .map(|o| o.org_id.as_str())
            .collect();
        assert_eq!(selected, vec!["org2"]);
        assert_eq!(init.orgs.len(), 3);

        let permission = find(&derived, ResourceType::PermissionUpdate);
        assert_eq!(permission.policy.rule, PolicyRule::Majority);
        assert_eq!(permission.policy.role_type, RoleType::All);
    }

    #[test]
    fn unparseable_rule_falls_back_to_default() {
        let cfg = config(vec![entry(
            "CONTRACT_MANAGE-REVOKE_CONTRACT",
            "SOMETIMES",
            &["org1"],
            &[],
        )]);
        let derived = derive_policies("c1", &cfg, &[org("org1"), org("org2")]);
        let revoke = find(&derived, ResourceType::RevokeContract);
        assert_eq!(revoke.policy, Policy::default_for("c1", ResourceType::RevokeContract));
        assert!(revoke.orgs.iter().all(PolicyOrg::is_selected));
    }

    #[test]
    fn refresh_is_idempotent_and_uses_trust_roots() {
        let store = NullStore::new();
        let cfg = config(vec![entry("CONTRACT_MANAGE-FREEZE_CONTRACT", "60", &[], &[])]);

        assert_eq!(refresh_policies(&store, "c1", &cfg).unwrap(), 7);
        assert_eq!(refresh_policies(&store, "c1", &cfg).unwrap(), 7);

        let policy = store
            .get_policy("c1", ResourceType::FreezeContract)
            .unwrap()
            .unwrap();
        assert_eq!(policy.rule, PolicyRule::Percentage);
        assert_eq!(policy.percent.as_deref(), Some("60"));
        assert_eq!(
            store
                .policy_orgs("c1", ResourceType::FreezeContract)
                .unwrap()
                .len(),
            3
        );
    }
}
