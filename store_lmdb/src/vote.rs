//! LMDB implementation of VoteStore.
//!
//! Vote commit and finalization each read and write inside a single write
//! transaction; LMDB admits one writer at a time, which makes them atomic.

use chainops_store::{StoreError, VoteRecord, VoteStore};
use chainops_types::{Ballot, DispatchOutcome, Proposal, ProposalStatus, Timestamp, VoteResult};

use crate::environment::{key, prefix};
use crate::relation::collect_prefix;
use crate::{LmdbEnvironment, LmdbError};

impl VoteStore for LmdbEnvironment {
    fn create_proposal(&self, proposal: &Proposal, ballots: &[Ballot]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .proposals_db
            .get(&wtxn, &proposal.multi_id)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("proposal {}", proposal.multi_id)));
        }
        self.proposals_db
            .put(&mut wtxn, &proposal.multi_id, proposal)
            .map_err(LmdbError::from)?;
        for ballot in ballots {
            self.ballots_db
                .put(&mut wtxn, &key(&[&proposal.multi_id, &ballot.org_id]), ballot)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_proposal(&self, multi_id: &str) -> Result<Option<Proposal>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .proposals_db
            .get(&rtxn, multi_id)
            .map_err(LmdbError::from)?)
    }

    fn list_proposals(&self, chain_id: &str) -> Result<Vec<Proposal>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut proposals = Vec::new();
        for entry in self.proposals_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, proposal) = entry.map_err(LmdbError::from)?;
            if proposal.chain_id == chain_id {
                proposals.push(proposal);
            }
        }
        proposals.sort_by_key(|p| p.created_at);
        Ok(proposals)
    }

    fn ballots(&self, multi_id: &str) -> Result<Vec<Ballot>, StoreError> {
        Ok(collect_prefix(self, self.ballots_db, &prefix(&[multi_id]))?)
    }

    fn record_vote(
        &self,
        multi_id: &str,
        org_id: &str,
        result: VoteResult,
        at: Timestamp,
    ) -> Result<VoteRecord, StoreError> {
        let ballot_key = key(&[multi_id, org_id]);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut ballot = self
            .ballots_db
            .get(&wtxn, &ballot_key)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("ballot {multi_id}/{org_id}")))?;
        if ballot.result != VoteResult::Pending {
            return Ok(VoteRecord::AlreadyVoted);
        }
        ballot.result = result;
        ballot.voted_at = Some(at);
        self.ballots_db
            .put(&mut wtxn, &ballot_key, &ballot)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(VoteRecord::Recorded)
    }

    fn claim_finalization(
        &self,
        multi_id: &str,
        status: ProposalStatus,
    ) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut proposal = self
            .proposals_db
            .get(&wtxn, multi_id)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("proposal {multi_id}")))?;
        if proposal.status != ProposalStatus::Voting {
            return Ok(false);
        }
        proposal.status = status;
        self.proposals_db
            .put(&mut wtxn, multi_id, &proposal)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn set_outcome(&self, multi_id: &str, outcome: &DispatchOutcome) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut proposal = self
            .proposals_db
            .get(&wtxn, multi_id)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("proposal {multi_id}")))?;
        proposal.outcome = Some(outcome.clone());
        self.proposals_db
            .put(&mut wtxn, multi_id, &proposal)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::open_test_env;
    use chainops_types::ResourceType;
    use std::sync::Arc;

    fn proposal(multi_id: &str) -> Proposal {
        Proposal {
            multi_id: multi_id.into(),
            chain_id: "c1".into(),
            resource: ResourceType::InitContract,
            start_org: "org1".into(),
            reason: "deploy asset".into(),
            description: "org1 requests deploying contract asset".into(),
            params: "{}".into(),
            target: Some("asset".into()),
            created_at: Timestamp::new(100),
            status: ProposalStatus::Voting,
            outcome: None,
        }
    }

    fn ballots(multi_id: &str, orgs: &[&str]) -> Vec<Ballot> {
        orgs.iter()
            .map(|org| Ballot::pending(multi_id, "c1", *org, *org))
            .collect()
    }

    #[test]
    fn create_rejects_duplicate_multi_id() {
        let (_dir, env) = open_test_env();
        env.create_proposal(&proposal("m1"), &ballots("m1", &["org1"]))
            .unwrap();
        assert!(matches!(
            env.create_proposal(&proposal("m1"), &[]),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(env.ballots("m1").unwrap().len(), 1);
    }

    #[test]
    fn second_vote_is_rejected_and_unchanged() {
        let (_dir, env) = open_test_env();
        env.create_proposal(&proposal("m1"), &ballots("m1", &["org1", "org2"]))
            .unwrap();

        assert_eq!(
            env.record_vote("m1", "org1", VoteResult::Approve, Timestamp::new(5))
                .unwrap(),
            VoteRecord::Recorded
        );
        assert_eq!(
            env.record_vote("m1", "org1", VoteResult::Reject, Timestamp::new(6))
                .unwrap(),
            VoteRecord::AlreadyVoted
        );
        let org1 = env
            .ballots("m1")
            .unwrap()
            .into_iter()
            .find(|b| b.org_id == "org1")
            .unwrap();
        assert_eq!(org1.result, VoteResult::Approve);
        assert_eq!(org1.voted_at, Some(Timestamp::new(5)));

        assert!(matches!(
            env.record_vote("m1", "org9", VoteResult::Approve, Timestamp::new(7)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn finalization_is_claimed_once_under_contention() {
        let (_dir, env) = open_test_env();
        env.create_proposal(&proposal("m1"), &[]).unwrap();
        let env = Arc::new(env);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let env = Arc::clone(&env);
                std::thread::spawn(move || {
                    env.claim_finalization("m1", ProposalStatus::Approved)
                        .unwrap()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(
            env.get_proposal("m1").unwrap().unwrap().status,
            ProposalStatus::Approved
        );
    }

    #[test]
    fn outcome_is_recorded() {
        let (_dir, env) = open_test_env();
        env.create_proposal(&proposal("m1"), &[]).unwrap();
        env.set_outcome(
            "m1",
            &DispatchOutcome::Succeeded {
                tx_id: "tx1".into(),
            },
        )
        .unwrap();
        assert!(env
            .get_proposal("m1")
            .unwrap()
            .unwrap()
            .outcome
            .unwrap()
            .is_success());
        assert_eq!(env.list_proposals("c1").unwrap().len(), 1);
        assert!(env.list_proposals("c2").unwrap().is_empty());
    }
}
