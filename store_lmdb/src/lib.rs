//! LMDB storage backend for the chain management engine.
//!
//! Implements all storage traits from `chainops-store` using the `heed` LMDB
//! bindings. Each logical store maps to one or more databases within a
//! single environment. Multi-row updates and compare-and-swap operations run
//! inside one write transaction, which LMDB serializes.

pub mod chain;
pub mod contract;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod policy;
pub mod relation;
pub mod vote;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
