//! Client-side view of a ledger node.
//!
//! The engine never talks to a ledger directly. It goes through
//! [`ChainClient`], created per chain by a [`ClientFactory`], and signs
//! endorsements through a [`PayloadSigner`]. This crate defines those
//! capabilities together with the ledger wire types they exchange and the
//! canonical system-contract payload builders.

pub mod block;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod tx;

pub use block::{Block, BlockHeader, BlockInfo, Member, MemberType, NodeTopology, TopologyNode};
pub use client::{BlockStream, ChainClient, ClientFactory, PayloadSigner};
pub use config::{BlockConfig, ChainConfig, LedgerPolicy, ResourcePolicy, TrustRoot};
pub use error::{ClientError, ClientErrorKind};
pub use payload::BlockUpdate;
pub use tx::{
    CertInfo, ContractResult, EndorsementEntry, KeyValuePair, Payload, Transaction, TxResponse,
    TxResult, TxStatusCode, TxType,
};
