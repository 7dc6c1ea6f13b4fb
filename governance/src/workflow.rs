//! The governance workflow: propose → vote → quorum → endorse → submit.

use std::sync::Arc;
use std::time::Duration;

use chainops_client::payload::new_tx_id;
use chainops_client::{ClientError, ClientErrorKind, PayloadSigner};
use chainops_store::{Store, StoreError, VoteRecord};
use chainops_types::{
    Ballot, CertRole, Clock, Contract, ContractStatus, DispatchOutcome, MultiSignStatus, Policy,
    PolicyRule, Proposal, ProposalStatus, ResourceType, RoleType, Timestamp, VoteResult,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::action::GovernedAction;
use crate::builders::BuildContext;
use crate::directory::ChainDirectory;
use crate::error::GovernanceError;
use crate::quorum::required_approvals;

/// Bound on a single ledger submission.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(10);

/// What a successful vote led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Quorum not reached yet.
    Pending { passed: usize, required: usize },
    /// Quorum reached, but another voter finalized the proposal.
    Settled,
    /// This vote finalized the proposal and submitted it.
    Dispatched(DispatchOutcome),
}

pub struct GovernanceWorkflow {
    store: Arc<dyn Store>,
    directory: Arc<dyn ChainDirectory>,
    signer: Arc<dyn PayloadSigner>,
    clock: Arc<dyn Clock>,
    tx_timeout: Duration,
    /// Serializes proposal creation so two proposals cannot both pass the
    /// contract VOTING guard.
    propose_lock: Mutex<()>,
}

impl GovernanceWorkflow {
    pub fn new(
        store: Arc<dyn Store>,
        directory: Arc<dyn ChainDirectory>,
        signer: Arc<dyn PayloadSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            signer,
            clock,
            tx_timeout: DEFAULT_TX_TIMEOUT,
            propose_lock: Mutex::new(()),
        }
    }

    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = timeout;
        self
    }

    /// Open a vote on `action`. One pending ballot is created per
    /// organization selected by the resource's policy.
    pub async fn propose(
        &self,
        chain_id: &str,
        action: GovernedAction,
        reason: &str,
    ) -> Result<Proposal, GovernanceError> {
        let handle = self
            .directory
            .lookup(chain_id)
            .ok_or_else(|| GovernanceError::NotSubscribed(chain_id.to_string()))?;
        let chain = self.store.get_chain(chain_id).map_err(|e| match e {
            StoreError::NotFound(_) => GovernanceError::ChainNotFound(chain_id.to_string()),
            other => other.into(),
        })?;

        let resource = action.resource();
        let policy = self.policy(chain_id, resource)?;
        if policy.rule == PolicyRule::Forbidden {
            return Err(GovernanceError::ForbiddenPolicy(resource));
        }
        let eligible: Vec<_> = self
            .store
            .policy_orgs(chain_id, resource)?
            .into_iter()
            .filter(|org| org.is_selected())
            .collect();
        if eligible.is_empty() {
            return Err(GovernanceError::NoEligibleOrgs(resource));
        }
        if required_approvals(eligible.len(), &policy)? == 0 {
            return Err(GovernanceError::ForbiddenPolicy(resource));
        }

        let _guard = self.propose_lock.lock().await;
        let contract = match action.target() {
            Some(name) => self.store.get_contract(chain_id, name)?,
            None => None,
        };
        let builder = action.builder();
        let ctx = BuildContext {
            client: handle.client.as_ref(),
            chain: &chain,
            config: None,
            contract: contract.as_ref(),
        };
        builder.validate(&ctx)?;
        let description = builder.describe(&ctx);

        let multi_id = new_tx_id();
        let now = self.clock.now();
        let proposal = Proposal {
            multi_id: multi_id.clone(),
            chain_id: chain_id.to_string(),
            resource,
            start_org: handle.org_id.clone(),
            reason: reason.to_string(),
            description,
            params: serde_json::to_string(&action)?,
            target: action.target().map(str::to_string),
            created_at: now,
            status: ProposalStatus::Voting,
            outcome: None,
        };
        let ballots: Vec<Ballot> = eligible
            .iter()
            .map(|org| Ballot::pending(&multi_id, chain_id, &org.org_id, &org.org_name))
            .collect();
        self.store.create_proposal(&proposal, &ballots)?;

        if let Some(row) = voting_row(&action, contract, chain_id, &handle.org_id, now) {
            self.store.put_contract(&row)?;
        }
        info!(
            chain = %chain_id,
            multi_id = %multi_id,
            resource = %resource,
            ballots = ballots.len(),
            "proposal opened"
        );
        Ok(proposal)
    }

    /// Record one organization's vote and, if it completes the quorum,
    /// finalize and submit the proposal.
    pub async fn vote(
        &self,
        multi_id: &str,
        org_id: &str,
        approve: bool,
    ) -> Result<VoteOutcome, GovernanceError> {
        let proposal = self.proposal(multi_id)?;
        if proposal.status.is_final() {
            return Err(GovernanceError::AlreadyFinalized(multi_id.to_string()));
        }
        let ballot_missing = || GovernanceError::BallotNotFound {
            multi_id: multi_id.to_string(),
            org_id: org_id.to_string(),
        };
        if !self
            .store
            .ballots(multi_id)?
            .iter()
            .any(|ballot| ballot.org_id == org_id)
        {
            return Err(ballot_missing());
        }

        let policy = self.policy(&proposal.chain_id, proposal.resource)?;
        let role = signing_role(policy.role_type);
        if self.store.user_cert(org_id, role)?.is_none() {
            return Err(GovernanceError::MissingCertificate {
                org_id: org_id.to_string(),
                role,
            });
        }

        let result = if approve {
            VoteResult::Approve
        } else {
            VoteResult::Reject
        };
        match self
            .store
            .record_vote(multi_id, org_id, result, self.clock.now())
        {
            Ok(VoteRecord::Recorded) => {}
            Ok(VoteRecord::AlreadyVoted) => {
                return Err(GovernanceError::AlreadyVoted {
                    multi_id: multi_id.to_string(),
                    org_id: org_id.to_string(),
                })
            }
            Err(StoreError::NotFound(_)) => return Err(ballot_missing()),
            Err(e) => return Err(e.into()),
        }
        info!(multi_id = %multi_id, org = %org_id, approve, "vote recorded");

        self.tally(&proposal, &policy).await
    }

    async fn tally(
        &self,
        proposal: &Proposal,
        policy: &Policy,
    ) -> Result<VoteOutcome, GovernanceError> {
        let multi_id = &proposal.multi_id;
        let ballots = self.store.ballots(multi_id)?;
        let passed = ballots
            .iter()
            .filter(|ballot| ballot.result == VoteResult::Approve)
            .count();
        let required = required_approvals(ballots.len(), policy)?;

        if required == 0 {
            if self
                .store
                .claim_finalization(multi_id, ProposalStatus::RejectedForbidden)?
            {
                warn!(
                    multi_id = %multi_id,
                    resource = %proposal.resource,
                    "policy became forbidden, vote closed"
                );
                self.settle_contract(proposal, None, None, None)?;
                self.store.set_outcome(
                    multi_id,
                    &DispatchOutcome::Failed {
                        reason: "policy is forbidden".into(),
                    },
                )?;
            }
            return Err(GovernanceError::ForbiddenPolicy(proposal.resource));
        }
        if passed < required {
            return Ok(VoteOutcome::Pending { passed, required });
        }
        if !self
            .store
            .claim_finalization(multi_id, ProposalStatus::Approved)?
        {
            return Ok(VoteOutcome::Settled);
        }
        info!(multi_id = %multi_id, passed, required, "quorum reached");

        let approving: Vec<&Ballot> = ballots
            .iter()
            .filter(|ballot| ballot.result == VoteResult::Approve)
            .collect();
        self.dispatch(proposal, &approving, policy)
            .await
            .map(VoteOutcome::Dispatched)
    }

    async fn dispatch(
        &self,
        proposal: &Proposal,
        approving: &[&Ballot],
        policy: &Policy,
    ) -> Result<DispatchOutcome, GovernanceError> {
        let multi_id = &proposal.multi_id;
        let action: GovernedAction = serde_json::from_str(&proposal.params)?;
        let op = action.contract_op();

        match self.submit(proposal, &action, approving, policy).await {
            Ok(outcome) => {
                let tx_id = match &outcome {
                    DispatchOutcome::Succeeded { tx_id } => Some(tx_id.clone()),
                    _ => None,
                };
                let version = match &action {
                    GovernedAction::UpgradeContract(p) => Some(p.version.clone()),
                    _ => None,
                };
                let status = op.map(|op| op.success_status());
                self.settle_contract(proposal, status, tx_id, version)?;
                self.store.set_outcome(multi_id, &outcome)?;
                info!(multi_id = %multi_id, outcome = ?outcome, "proposal dispatched");
                Ok(outcome)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(multi_id = %multi_id, error = %reason, "dispatch failed");
                self.settle_contract(proposal, op.map(|op| op.failure_status()), None, None)?;
                self.store.set_outcome(
                    multi_id,
                    &DispatchOutcome::Failed {
                        reason: reason.clone(),
                    },
                )?;
                Err(GovernanceError::Dispatch {
                    multi_id: multi_id.clone(),
                    reason,
                })
            }
        }
    }

    async fn submit(
        &self,
        proposal: &Proposal,
        action: &GovernedAction,
        approving: &[&Ballot],
        policy: &Policy,
    ) -> Result<DispatchOutcome, GovernanceError> {
        let chain_id = &proposal.chain_id;
        let handle = self
            .directory
            .lookup(chain_id)
            .ok_or_else(|| GovernanceError::NotSubscribed(chain_id.clone()))?;
        let chain = self.store.get_chain(chain_id)?;
        let config = handle.client.get_chain_config().await?;
        let contract = match action.target() {
            Some(name) => self.store.get_contract(chain_id, name)?,
            None => None,
        };
        let ctx = BuildContext {
            client: handle.client.as_ref(),
            chain: &chain,
            config: Some(&config),
            contract: contract.as_ref(),
        };
        let Some(payload) = action.builder().build(&ctx)? else {
            info!(multi_id = %proposal.multi_id, "ledger already holds the requested values");
            return Ok(DispatchOutcome::Unchanged);
        };

        let role = signing_role(policy.role_type);
        let mut endorsements = Vec::with_capacity(approving.len());
        for ballot in approving {
            let cert = self.store.user_cert(&ballot.org_id, role)?.ok_or_else(|| {
                GovernanceError::MissingCertificate {
                    org_id: ballot.org_id.clone(),
                    role,
                }
            })?;
            endorsements.push(self.signer.sign_payload(
                &ballot.org_id,
                &cert.private_key,
                &cert.cert,
                &payload,
            )?);
        }

        let contract_op = action.contract_op().is_some();
        let request = if contract_op {
            handle
                .client
                .send_contract_manage_request(payload, endorsements, self.tx_timeout, true)
        } else {
            handle
                .client
                .send_chain_config_update_request(payload, endorsements, self.tx_timeout, true)
        };
        let response = tokio::time::timeout(self.tx_timeout, request)
            .await
            .map_err(|_| {
                ClientError::new(
                    ClientErrorKind::Timeout,
                    format!("no response within {:?}", self.tx_timeout),
                )
            })??;

        if contract_op && response.contract_result.is_none() {
            return Err(GovernanceError::Dispatch {
                multi_id: proposal.multi_id.clone(),
                reason: "response carries no contract result".into(),
            });
        }
        if !response.succeeded() {
            let detail = response
                .contract_result
                .as_ref()
                .filter(|result| result.code != 0)
                .map(|result| format!("contract code {}: {}", result.code, result.message))
                .unwrap_or_else(|| format!("{}: {}", response.code.as_str(), response.message));
            return Err(GovernanceError::Dispatch {
                multi_id: proposal.multi_id.clone(),
                reason: detail,
            });
        }
        Ok(DispatchOutcome::Succeeded {
            tx_id: response.tx_id,
        })
    }

    /// Release the governed contract, optionally moving it to `status`.
    fn settle_contract(
        &self,
        proposal: &Proposal,
        status: Option<ContractStatus>,
        tx_id: Option<String>,
        version: Option<String>,
    ) -> Result<(), GovernanceError> {
        let Some(name) = &proposal.target else {
            return Ok(());
        };
        let Some(mut row) = self.store.get_contract(&proposal.chain_id, name)? else {
            return Ok(());
        };
        if let Some(status) = status {
            row.status = status;
        }
        if tx_id.is_some() {
            row.tx_id = tx_id;
        }
        if let Some(version) = version {
            row.version = version;
        }
        row.multi_sign_status = MultiSignStatus::NoVoting;
        row.updated_at = self.clock.now();
        self.store.put_contract(&row)?;
        Ok(())
    }

    fn policy(&self, chain_id: &str, resource: ResourceType) -> Result<Policy, GovernanceError> {
        self.store
            .get_policy(chain_id, resource)?
            .ok_or_else(|| GovernanceError::PolicyNotFound {
                chain_id: chain_id.to_string(),
                resource,
            })
    }

    pub fn proposal(&self, multi_id: &str) -> Result<Proposal, GovernanceError> {
        self.store
            .get_proposal(multi_id)?
            .ok_or_else(|| GovernanceError::ProposalNotFound(multi_id.to_string()))
    }

    pub fn ballots(&self, multi_id: &str) -> Result<Vec<Ballot>, GovernanceError> {
        self.proposal(multi_id)?;
        Ok(self.store.ballots(multi_id)?)
    }

    pub fn proposals(&self, chain_id: &str) -> Result<Vec<Proposal>, GovernanceError> {
        Ok(self.store.list_proposals(chain_id)?)
    }
}

/// Certificate role used to vote and endorse under a policy.
fn signing_role(role_type: RoleType) -> CertRole {
    match role_type {
        RoleType::Client => CertRole::Client,
        RoleType::Admin | RoleType::All => CertRole::Admin,
    }
}

/// Contract row to store when a contract proposal opens.
fn voting_row(
    action: &GovernedAction,
    existing: Option<Contract>,
    chain_id: &str,
    org_id: &str,
    now: Timestamp,
) -> Option<Contract> {
    action.contract_op()?;
    let mut row = match (action, existing) {
        (GovernedAction::InitContract(p), existing) => {
            let mut row = existing.unwrap_or_else(|| Contract {
                chain_id: chain_id.to_string(),
                name: p.contract_name.clone(),
                version: String::new(),
                runtime_type: String::new(),
                org_id: org_id.to_string(),
                status: ContractStatus::InitStored,
                multi_sign_status: MultiSignStatus::NoVoting,
                tx_id: None,
                updated_at: now,
            });
            row.version = p.version.clone();
            row.runtime_type = p.runtime_type.clone();
            row.status = ContractStatus::InitStored;
            row
        }
        (_, existing) => existing?,
    };
    row.multi_sign_status = MultiSignStatus::Voting;
    row.updated_at = now;
    Some(row)
}
