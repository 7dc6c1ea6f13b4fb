//! Chain metadata mirroring: the chain row, its organizations and nodes,
//! and the governance policies derived from the ledger configuration.

use chainops_client::{ChainClient, ChainConfig};
use chainops_governance::refresh_policies;
use chainops_store::Store;
use chainops_types::{ChainOrg, ChainOrgNode, ChainParams};
use tracing::{debug, warn};

use crate::NodeError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataReport {
    pub orgs: usize,
    /// `None` when the node topology was unavailable and left untouched.
    pub nodes: Option<usize>,
    pub policies: usize,
}

/// The chain fields carried by a ledger configuration.
pub fn chain_params(config: &ChainConfig) -> ChainParams {
    ChainParams {
        consensus: config.consensus.clone(),
        block_tx_capacity: config.block.block_tx_capacity,
        block_interval: config.block.block_interval,
        tx_timeout: config.block.tx_timeout,
        version: config.version.clone(),
        sequence: config.sequence,
    }
}

/// Re-read configuration, trust roots and topology from the ledger and
/// upsert the mirror rows.
pub async fn refresh_metadata(
    store: &dyn Store,
    client: &dyn ChainClient,
) -> Result<MetadataReport, NodeError> {
    let chain_id = client.chain_id();
    let config = client.get_chain_config().await?;

    store.update_chain_params(chain_id, &chain_params(&config))?;

    let mut orgs = Vec::with_capacity(config.trust_roots.len());
    for org_id in config.trusted_org_ids() {
        let org_name = store
            .org(org_id)?
            .map(|org| org.org_name)
            .unwrap_or_else(|| org_id.to_string());
        orgs.push(ChainOrg {
            chain_id: chain_id.to_string(),
            org_id: org_id.to_string(),
            org_name,
        });
    }
    store.replace_chain_orgs(chain_id, &orgs)?;

    let nodes = match client.get_chain_info().await {
        Ok(topology) => {
            let mut nodes = Vec::with_capacity(topology.nodes.len());
            for node in &topology.nodes {
                let Some(info) = store.node(&node.node_id)? else {
                    debug!(chain = %chain_id, node = %node.node_id, "topology node is not registered");
                    continue;
                };
                nodes.push(org_node(chain_id, &orgs, info));
            }
            Some(nodes)
        }
        Err(e) if e.is_busy() => {
            warn!(chain = %chain_id, error = %e, "node busy, keeping mirrored topology");
            None
        }
        Err(e) => {
            warn!(chain = %chain_id, error = %e, "topology unavailable, rebuilding from registered nodes");
            let mut nodes = Vec::new();
            for org in &orgs {
                for info in store.org_nodes(&org.org_id)? {
                    nodes.push(org_node(chain_id, &orgs, info));
                }
            }
            Some(nodes)
        }
    };
    let node_count = match nodes {
        Some(nodes) => {
            store.replace_chain_org_nodes(chain_id, &nodes)?;
            Some(nodes.len())
        }
        None => None,
    };

    let policies = refresh_policies(store, chain_id, &config)?;
    Ok(MetadataReport {
        orgs: orgs.len(),
        nodes: node_count,
        policies,
    })
}

fn org_node(chain_id: &str, orgs: &[ChainOrg], info: chainops_types::NodeInfo) -> ChainOrgNode {
    let org_name = orgs
        .iter()
        .find(|org| org.org_id == info.org_id)
        .map(|org| org.org_name.clone())
        .unwrap_or_else(|| info.org_id.clone());
    ChainOrgNode {
        chain_id: chain_id.to_string(),
        org_id: info.org_id,
        org_name,
        node_id: info.node_id,
        node_name: info.node_name,
    }
}
