//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chainops_store::{
    BlockBundle, ChainStore, ContractStore, InsertOutcome, LedgerStore, ParticipantStore,
    PolicyStore, RelationStore, StoreError, VoteRecord, VoteStore,
};
use chainops_types::{
    Ballot, BlockRecord, CertRole, Chain, ChainConfigRecord, ChainOrg, ChainOrgNode, ChainParams,
    ChainStatus, Contract, DispatchOutcome, NodeInfo, OrgInfo, Policy, PolicyOrg, Proposal, ProposalStatus,
    ResourceType, Timestamp, TransactionRecord, UserCert, VoteResult,
};

#[derive(Default)]
struct Tables {
    chains: HashMap<String, Chain>,
    chain_orgs: HashMap<String, Vec<ChainOrg>>,
    chain_org_nodes: HashMap<String, Vec<ChainOrgNode>>,
    orgs: HashMap<String, OrgInfo>,
    nodes: BTreeMap<String, NodeInfo>,
    user_certs: HashMap<(String, CertRole), UserCert>,
    blocks: BTreeMap<(String, u64), BlockRecord>,
    txs: HashMap<(String, String), TransactionRecord>,
    config_records: Vec<ChainConfigRecord>,
    contracts: BTreeMap<(String, String), Contract>,
    policies: HashMap<(String, ResourceType), (Policy, Vec<PolicyOrg>)>,
    proposals: HashMap<String, Proposal>,
    ballots: HashMap<String, Vec<Ballot>>,
}

/// An in-memory implementation of every store trait.
///
/// A single lock guards all tables, so multi-row writes and
/// compare-and-swap operations are atomic.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainStore for NullStore {
    fn put_chain(&self, chain: &Chain) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .chains
            .insert(chain.chain_id.clone(), chain.clone());
        Ok(())
    }

    fn get_chain(&self, chain_id: &str) -> Result<Chain, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .chains
            .get(chain_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("chain", chain_id))
    }

    fn list_chains(&self) -> Result<Vec<Chain>, StoreError> {
        Ok(self.tables.lock().unwrap().chains.values().cloned().collect())
    }

    fn set_chain_status(&self, chain_id: &str, status: ChainStatus) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let chain = tables
            .chains
            .get_mut(chain_id)
            .ok_or_else(|| StoreError::not_found("chain", chain_id))?;
        chain.status = status;
        Ok(())
    }

    fn update_chain_params(
        &self,
        chain_id: &str,
        params: &ChainParams,
    ) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .chains
            .entry(chain_id.to_string())
            .or_insert_with(|| Chain::new(chain_id, chain_id))
            .apply_params(params);
        Ok(())
    }
}

impl RelationStore for NullStore {
    fn replace_chain_orgs(&self, chain_id: &str, orgs: &[ChainOrg]) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .chain_orgs
            .insert(chain_id.to_string(), orgs.to_vec());
        Ok(())
    }

    fn chain_orgs(&self, chain_id: &str) -> Result<Vec<ChainOrg>, StoreError> {
        let mut orgs = self
            .tables
            .lock()
            .unwrap()
            .chain_orgs
            .get(chain_id)
            .cloned()
            .unwrap_or_default();
        orgs.sort_by(|a, b| a.org_id.cmp(&b.org_id));
        Ok(orgs)
    }

    fn replace_chain_org_nodes(
        &self,
        chain_id: &str,
        nodes: &[ChainOrgNode],
    ) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .chain_org_nodes
            .insert(chain_id.to_string(), nodes.to_vec());
        Ok(())
    }

    fn chain_org_nodes(&self, chain_id: &str) -> Result<Vec<ChainOrgNode>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .chain_org_nodes
            .get(chain_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl ParticipantStore for NullStore {
    fn put_org(&self, org: &OrgInfo) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .orgs
            .insert(org.org_id.clone(), org.clone());
        Ok(())
    }

    fn org(&self, org_id: &str) -> Result<Option<OrgInfo>, StoreError> {
        Ok(self.tables.lock().unwrap().orgs.get(org_id).cloned())
    }

    fn put_node(&self, node: &NodeInfo) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .nodes
            .insert(node.node_id.clone(), node.clone());
        Ok(())
    }

    fn node(&self, node_id: &str) -> Result<Option<NodeInfo>, StoreError> {
        Ok(self.tables.lock().unwrap().nodes.get(node_id).cloned())
    }

    fn org_nodes(&self, org_id: &str) -> Result<Vec<NodeInfo>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .nodes
            .values()
            .filter(|n| n.org_id == org_id)
            .cloned()
            .collect())
    }

    fn put_user_cert(&self, cert: &UserCert) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .user_certs
            .insert((cert.org_id.clone(), cert.role), cert.clone());
        Ok(())
    }

    fn user_cert(&self, org_id: &str, role: CertRole) -> Result<Option<UserCert>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .user_certs
            .get(&(org_id.to_string(), role))
            .cloned())
    }
}

impl LedgerStore for NullStore {
    fn insert_block(&self, bundle: &BlockBundle) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let chain_id = bundle.block.chain_id.clone();
        let block_key = (chain_id.clone(), bundle.block.height);
        if tables.blocks.contains_key(&block_key) {
            return Ok(InsertOutcome::Duplicate);
        }
        tables.blocks.insert(block_key, bundle.block.clone());
        for tx in &bundle.transactions {
            tables
                .txs
                .entry((chain_id.clone(), tx.tx_id.clone()))
                .or_insert_with(|| tx.clone());
        }
        for contract in &bundle.contracts {
            tables.contracts.insert(
                (chain_id.clone(), contract.name.clone()),
                contract.clone(),
            );
        }
        if let Some(record) = &bundle.config_record {
            tables.config_records.push(record.clone());
        }
        Ok(InsertOutcome::Inserted)
    }

    fn max_block_height(&self, chain_id: &str) -> Result<Option<u64>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .blocks
            .keys()
            .filter(|(chain, _)| chain == chain_id)
            .map(|(_, height)| *height)
            .max())
    }

    fn get_block(&self, chain_id: &str, height: u64) -> Result<BlockRecord, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .blocks
            .get(&(chain_id.to_string(), height))
            .cloned()
            .ok_or_else(|| StoreError::not_found("block", format!("{chain_id}/{height}")))
    }

    fn list_blocks(&self, chain_id: &str) -> Result<Vec<BlockRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .blocks
            .iter()
            .filter(|((chain, _), _)| chain == chain_id)
            .map(|(_, block)| block.clone())
            .collect())
    }

    fn get_transaction(
        &self,
        chain_id: &str,
        tx_id: &str,
    ) -> Result<TransactionRecord, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .txs
            .get(&(chain_id.to_string(), tx_id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found("transaction", format!("{chain_id}/{tx_id}")))
    }

    fn transaction_count(&self, chain_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .txs
            .keys()
            .filter(|(chain, _)| chain == chain_id)
            .count() as u64)
    }

    fn latest_config_record(
        &self,
        chain_id: &str,
        at: Timestamp,
    ) -> Result<Option<ChainConfigRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .config_records
            .iter()
            .filter(|r| r.chain_id == chain_id && r.timestamp <= at)
            .max_by_key(|r| (r.timestamp, r.height))
            .cloned())
    }
}

impl ContractStore for NullStore {
    fn put_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        self.tables.lock().unwrap().contracts.insert(
            (contract.chain_id.clone(), contract.name.clone()),
            contract.clone(),
        );
        Ok(())
    }

    fn get_contract(&self, chain_id: &str, name: &str) -> Result<Option<Contract>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .contracts
            .get(&(chain_id.to_string(), name.to_string()))
            .cloned())
    }

    fn list_contracts(&self, chain_id: &str) -> Result<Vec<Contract>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .contracts
            .iter()
            .filter(|((chain, _), _)| chain == chain_id)
            .map(|(_, c)| c.clone())
            .collect())
    }
}

impl PolicyStore for NullStore {
    fn replace_policy(&self, policy: &Policy, orgs: &[PolicyOrg]) -> Result<(), StoreError> {
        self.tables.lock().unwrap().policies.insert(
            (policy.chain_id.clone(), policy.resource),
            (policy.clone(), orgs.to_vec()),
        );
        Ok(())
    }

    fn get_policy(
        &self,
        chain_id: &str,
        resource: ResourceType,
    ) -> Result<Option<Policy>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .policies
            .get(&(chain_id.to_string(), resource))
            .map(|(policy, _)| policy.clone()))
    }

    fn policy_orgs(
        &self,
        chain_id: &str,
        resource: ResourceType,
    ) -> Result<Vec<PolicyOrg>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .policies
            .get(&(chain_id.to_string(), resource))
            .map(|(_, orgs)| orgs.clone())
            .unwrap_or_default())
    }
}

impl VoteStore for NullStore {
    fn create_proposal(&self, proposal: &Proposal, ballots: &[Ballot]) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.proposals.contains_key(&proposal.multi_id) {
            return Err(StoreError::Duplicate(format!("proposal {}", proposal.multi_id)));
        }
        tables
            .proposals
            .insert(proposal.multi_id.clone(), proposal.clone());
        tables
            .ballots
            .insert(proposal.multi_id.clone(), ballots.to_vec());
        Ok(())
    }

    fn get_proposal(&self, multi_id: &str) -> Result<Option<Proposal>, StoreError> {
        Ok(self.tables.lock().unwrap().proposals.get(multi_id).cloned())
    }

    fn list_proposals(&self, chain_id: &str) -> Result<Vec<Proposal>, StoreError> {
        let mut proposals: Vec<Proposal> = self
            .tables
            .lock()
            .unwrap()
            .proposals
            .values()
            .filter(|p| p.chain_id == chain_id)
            .cloned()
            .collect();
        proposals.sort_by_key(|p| p.created_at);
        Ok(proposals)
    }

    fn ballots(&self, multi_id: &str) -> Result<Vec<Ballot>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .ballots
            .get(multi_id)
            .cloned()
            .unwrap_or_default())
    }

    fn record_vote(
        &self,
        multi_id: &str,
        org_id: &str,
        result: VoteResult,
        at: Timestamp,
    ) -> Result<VoteRecord, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let ballot = tables
            .ballots
            .get_mut(multi_id)
            .and_then(|ballots| ballots.iter_mut().find(|b| b.org_id == org_id))
            .ok_or_else(|| StoreError::not_found("ballot", format!("{multi_id}/{org_id}")))?;
        if ballot.result != VoteResult::Pending {
            return Ok(VoteRecord::AlreadyVoted);
        }
        ballot.result = result;
        ballot.voted_at = Some(at);
        Ok(VoteRecord::Recorded)
    }

    fn claim_finalization(
        &self,
        multi_id: &str,
        status: ProposalStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let proposal = tables
            .proposals
            .get_mut(multi_id)
            .ok_or_else(|| StoreError::not_found("proposal", multi_id))?;
        if proposal.status != ProposalStatus::Voting {
            return Ok(false);
        }
        proposal.status = status;
        Ok(true)
    }

    fn set_outcome(&self, multi_id: &str, outcome: &DispatchOutcome) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let proposal = tables
            .proposals
            .get_mut(multi_id)
            .ok_or_else(|| StoreError::not_found("proposal", multi_id))?;
        proposal.outcome = Some(outcome.clone());
        Ok(())
    }
}
