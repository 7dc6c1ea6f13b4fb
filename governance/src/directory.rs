use std::sync::Arc;

use chainops_client::ChainClient;

/// A live connection the workflow can submit through.
#[derive(Clone)]
pub struct ChainHandle {
    pub client: Arc<dyn ChainClient>,
    /// Organization the connection authenticates as.
    pub org_id: String,
}

/// Resolves subscribed chains to their live connections.
pub trait ChainDirectory: Send + Sync {
    fn lookup(&self, chain_id: &str) -> Option<ChainHandle>;
}
