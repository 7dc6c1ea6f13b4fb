//! LMDB environment setup.

use std::path::Path;

use chainops_types::{
    Ballot, BlockRecord, Chain, ChainConfigRecord, ChainOrg, ChainOrgNode, Contract, NodeInfo,
    OrgInfo, Policy, PolicyOrg, Proposal, TransactionRecord, UserCert,
};
use heed::types::{SerdeBincode, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Number of named databases opened by [`LmdbEnvironment::open`].
pub const DATABASE_COUNT: u32 = 14;

const KEY_SEPARATOR: char = '\0';

/// Wraps the LMDB environment and all database handles.
///
/// Keys are strings; composite keys join their parts with a NUL byte so a
/// chain's rows form one contiguous prefix range.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) chains_db: Database<Str, SerdeBincode<Chain>>,
    pub(crate) chain_orgs_db: Database<Str, SerdeBincode<ChainOrg>>,
    pub(crate) chain_org_nodes_db: Database<Str, SerdeBincode<ChainOrgNode>>,
    pub(crate) orgs_db: Database<Str, SerdeBincode<OrgInfo>>,
    pub(crate) nodes_db: Database<Str, SerdeBincode<NodeInfo>>,
    pub(crate) user_certs_db: Database<Str, SerdeBincode<UserCert>>,
    pub(crate) blocks_db: Database<Str, SerdeBincode<BlockRecord>>,
    pub(crate) txs_db: Database<Str, SerdeBincode<TransactionRecord>>,
    pub(crate) config_records_db: Database<Str, SerdeBincode<ChainConfigRecord>>,
    pub(crate) contracts_db: Database<Str, SerdeBincode<Contract>>,
    pub(crate) policies_db: Database<Str, SerdeBincode<Policy>>,
    pub(crate) policy_orgs_db: Database<Str, SerdeBincode<PolicyOrg>>,
    pub(crate) proposals_db: Database<Str, SerdeBincode<Proposal>>,
    pub(crate) ballots_db: Database<Str, SerdeBincode<Ballot>>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Heed(e.to_string()))?;
        // SAFETY: the environment is opened once per path by this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASE_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let store = Self {
            chains_db: env.create_database(&mut wtxn, Some("chains"))?,
            chain_orgs_db: env.create_database(&mut wtxn, Some("chain_orgs"))?,
            chain_org_nodes_db: env.create_database(&mut wtxn, Some("chain_org_nodes"))?,
            orgs_db: env.create_database(&mut wtxn, Some("orgs"))?,
            nodes_db: env.create_database(&mut wtxn, Some("nodes"))?,
            user_certs_db: env.create_database(&mut wtxn, Some("user_certs"))?,
            blocks_db: env.create_database(&mut wtxn, Some("blocks"))?,
            txs_db: env.create_database(&mut wtxn, Some("transactions"))?,
            config_records_db: env.create_database(&mut wtxn, Some("config_records"))?,
            contracts_db: env.create_database(&mut wtxn, Some("contracts"))?,
            policies_db: env.create_database(&mut wtxn, Some("policies"))?,
            policy_orgs_db: env.create_database(&mut wtxn, Some("policy_orgs"))?,
            proposals_db: env.create_database(&mut wtxn, Some("proposals"))?,
            ballots_db: env.create_database(&mut wtxn, Some("ballots"))?,
            env: env.clone(),
        };
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(store)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}

/// Composite key from its parts.
pub(crate) fn key(parts: &[&str]) -> String {
    parts.join(&KEY_SEPARATOR.to_string())
}

/// Prefix covering every composite key that starts with `parts`.
pub(crate) fn prefix(parts: &[&str]) -> String {
    let mut p = key(parts);
    p.push(KEY_SEPARATOR);
    p
}

/// Zero-padded so lexicographic order matches numeric order.
pub(crate) fn padded(n: u64) -> String {
    format!("{n:020}")
}

#[cfg(test)]
pub(crate) fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), DATABASE_COUNT, 1 << 24).unwrap();
    (dir, env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_keys_sort_numerically() {
        let mut keys = vec![key(&["c1", &padded(10)]), key(&["c1", &padded(9)])];
        keys.sort();
        assert_eq!(keys[0], key(&["c1", &padded(9)]));
    }

    #[test]
    fn prefix_does_not_match_longer_chain_id() {
        let p = prefix(&["c1"]);
        assert!(key(&["c1", "x"]).starts_with(&p));
        assert!(!key(&["c10", "x"]).starts_with(&p));
    }

    #[test]
    fn reopen_existing_environment() {
        let dir = tempfile::tempdir().unwrap();
        drop(LmdbEnvironment::open(dir.path(), DATABASE_COUNT, 1 << 24).unwrap());
        assert!(LmdbEnvironment::open(dir.path(), DATABASE_COUNT, 1 << 24).is_ok());
    }
}
