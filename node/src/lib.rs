//! Chain management node.
//!
//! The node keeps a local mirror of every subscribed permissioned chain and
//! runs multi-organization governance against it:
//! - Registers chain connections and replaces them safely on re-subscribe
//! - Mirrors blocks, transactions, contracts and chain configuration
//! - Refreshes organizations, nodes and governance policies periodically
//! - Drives proposals from vote to endorsed ledger submission

pub mod config;
pub mod connection;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metadata;
pub mod metrics;
pub mod node;
pub mod registry;
pub mod shutdown;
pub mod tracing_spans;
pub mod worker_pool;

pub use config::NodeConfig;
pub use connection::{ChainConnection, ConnectionSettings};
pub use error::NodeError;
pub use ingest::{BlockIngestor, IngestReport};
pub use logging::{init_logging, LogFormat};
pub use metadata::{chain_params, refresh_metadata, MetadataReport};
pub use metrics::NodeMetrics;
pub use node::ManagementNode;
pub use registry::ConnectionRegistry;
pub use shutdown::{wait_for_signal, StopHandle, StopSignal};
pub use worker_pool::WorkerPool;
