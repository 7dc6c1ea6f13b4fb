//! Span constructors shared by the connection loops and the governance
//! entry points, so traces carry the same names and fields everywhere.

use tracing::{info_span, Span};

pub fn ingest_span(chain_id: &str, height: u64) -> Span {
    info_span!("ingest", chain = %chain_id, height)
}

pub fn metadata_refresh_span(chain_id: &str) -> Span {
    info_span!("metadata_refresh", chain = %chain_id)
}

pub fn subscription_span(chain_id: &str) -> Span {
    info_span!("subscription", chain = %chain_id)
}

pub fn vote_span(multi_id: &str, org_id: &str) -> Span {
    info_span!("vote", multi_id = %multi_id, org = %org_id)
}
