//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, ledger node, signer, storage) are
//! abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be scripted and inspected programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod client;
pub mod clock;
pub mod signer;
pub mod store;

pub use client::{NullChainClient, NullClientFactory, Submission, SubmissionKind};
pub use clock::NullClock;
pub use signer::NullSigner;
pub use store::NullStore;
