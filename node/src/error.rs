use chainops_client::{ClientError, ClientErrorKind};
use chainops_governance::GovernanceError;
use chainops_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("cannot reach ledger node: {0}")]
    ConnectNode(String),

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("chain {0} not found on the ledger node")]
    ChainNotFound(String),

    #[error("block subscription failed: {0}")]
    Subscribe(String),

    #[error("chain {0} is not subscribed")]
    NotSubscribed(String),

    #[error("block ingestion failed: {0}")]
    Ingest(String),

    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Classify a failure raised while establishing a chain subscription.
    pub fn from_subscribe(chain_id: &str, err: ClientError) -> Self {
        match err.kind {
            ClientErrorKind::Connectivity | ClientErrorKind::Busy | ClientErrorKind::Timeout => {
                NodeError::ConnectNode(err.message)
            }
            ClientErrorKind::Authentication => NodeError::Authentication(err.message),
            ClientErrorKind::Tls => NodeError::Tls(err.message),
            ClientErrorKind::ChainNotFound => NodeError::ChainNotFound(chain_id.to_string()),
            _ => NodeError::Subscribe(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_failures_are_classified_by_kind() {
        let classify = |kind| NodeError::from_subscribe("c1", ClientError::new(kind, "x"));
        assert!(matches!(
            classify(ClientErrorKind::Busy),
            NodeError::ConnectNode(_)
        ));
        assert!(matches!(
            classify(ClientErrorKind::Authentication),
            NodeError::Authentication(_)
        ));
        assert!(matches!(classify(ClientErrorKind::Tls), NodeError::Tls(_)));
        assert!(matches!(
            classify(ClientErrorKind::ChainNotFound),
            NodeError::ChainNotFound(id) if id == "c1"
        ));
        assert!(matches!(
            classify(ClientErrorKind::Stream),
            NodeError::Subscribe(_)
        ));
    }
}
