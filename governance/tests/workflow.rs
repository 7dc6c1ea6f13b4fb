use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chainops_client::{ChainConfig, ContractResult, TxResponse, TxStatusCode};
use chainops_governance::{
    BlockUpdateParams, ChainDirectory, ChainHandle, ContractRef, DeployParams, GovernanceError,
    GovernanceWorkflow, GovernedAction, VoteOutcome,
};
use chainops_nullables::{NullChainClient, NullClock, NullSigner, NullStore, SubmissionKind};
use chainops_store::{ChainStore, ContractStore, ParticipantStore, PolicyStore};
use chainops_types::{
    CertRole, Chain, ContractStatus, DispatchOutcome, MultiSignStatus, Policy, PolicyOrg,
    PolicyOrgStatus, PolicyRule, ProposalStatus, ResourceType, RoleType, UserCert, VoteResult,
};

const ORGS: [&str; 4] = ["A", "B", "C", "D"];

struct Directory(HashMap<String, ChainHandle>);

impl ChainDirectory for Directory {
    fn lookup(&self, chain_id: &str) -> Option<ChainHandle> {
        self.0.get(chain_id).cloned()
    }
}

struct Fixture {
    store: Arc<NullStore>,
    client: Arc<NullChainClient>,
    signer: Arc<NullSigner>,
    workflow: Arc<GovernanceWorkflow>,
}

fn set_policy(store: &NullStore, resource: ResourceType, rule: PolicyRule, role: RoleType) {
    let mut policy = Policy::default_for("c1", resource);
    policy.rule = rule;
    policy.role_type = role;
    let orgs: Vec<PolicyOrg> = ORGS
        .iter()
        .map(|org| PolicyOrg {
            chain_id: "c1".into(),
            resource,
            org_id: org.to_string(),
            org_name: format!("org {org}"),
            status: PolicyOrgStatus::Selected,
        })
        .collect();
    store.replace_policy(&policy, &orgs).unwrap();
}

fn fixture(rule: PolicyRule) -> Fixture {
    let store = Arc::new(NullStore::new());
    let mut chain = Chain::new("c1", "chain one");
    chain.block_tx_capacity = 100;
    chain.block_interval = 2000;
    chain.tx_timeout = 600;
    store.put_chain(&chain).unwrap();
    for org in ORGS {
        store
            .put_user_cert(&UserCert {
                org_id: org.into(),
                role: CertRole::Admin,
                user_name: format!("{org}-admin"),
                cert: format!("{org}-cert").into_bytes(),
                private_key: b"key".to_vec(),
            })
            .unwrap();
    }
    for resource in ResourceType::ALL {
        set_policy(&store, resource, rule, RoleType::Admin);
    }

    let client = Arc::new(NullChainClient::new(ChainConfig {
        chain_id: "c1".into(),
        sequence: 4,
        ..Default::default()
    }));
    let mut handles = HashMap::new();
    handles.insert(
        "c1".to_string(),
        ChainHandle {
            client: client.clone(),
            org_id: "A".into(),
        },
    );
    let signer = Arc::new(NullSigner::new());
    let workflow = GovernanceWorkflow::new(
        store.clone(),
        Arc::new(Directory(handles)),
        signer.clone(),
        Arc::new(NullClock::new(1_700_000_000)),
    )
    .with_tx_timeout(Duration::from_secs(2));
    Fixture {
        store,
        client,
        signer,
        workflow: Arc::new(workflow),
    }
}

fn install() -> GovernedAction {
    GovernedAction::InitContract(DeployParams {
        contract_name: "asset".into(),
        version: "1.0".into(),
        runtime_type: "WASMER".into(),
        bytecode: b"\0asm".to_vec(),
        params: Default::default(),
    })
}

#[tokio::test]
async fn install_passes_on_third_approval() {
    let f = fixture(PolicyRule::Majority);
    let proposal = f
        .workflow
        .propose("c1", install(), "first release")
        .await
        .unwrap();
    assert_eq!(proposal.start_org, "A");
    assert_eq!(proposal.description, "Install contract asset version 1.0 (WASMER)");

    let ballots = f.workflow.ballots(&proposal.multi_id).unwrap();
    assert_eq!(ballots.len(), 4);
    assert!(ballots.iter().all(|b| b.result == VoteResult::Pending));

    let row = f.store.get_contract("c1", "asset").unwrap().unwrap();
    assert_eq!(row.status, ContractStatus::InitStored);
    assert_eq!(row.multi_sign_status, MultiSignStatus::Voting);

    let id = &proposal.multi_id;
    assert_eq!(
        f.workflow.vote(id, "A", true).await.unwrap(),
        VoteOutcome::Pending {
            passed: 1,
            required: 3
        }
    );
    assert_eq!(
        f.workflow.vote(id, "B", true).await.unwrap(),
        VoteOutcome::Pending {
            passed: 2,
            required: 3
        }
    );
    assert!(f.client.submissions().is_empty());

    let outcome = f.workflow.vote(id, "C", true).await.unwrap();
    assert!(matches!(
        outcome,
        VoteOutcome::Dispatched(DispatchOutcome::Succeeded { .. })
    ));

    let submissions = f.client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].kind, SubmissionKind::ContractManage);
    assert_eq!(submissions[0].payload.method, "INIT_CONTRACT");
    let endorsers: Vec<_> = submissions[0]
        .endorsements
        .iter()
        .map(|e| e.signer.org_id.as_str())
        .collect();
    assert_eq!(endorsers, ["A", "B", "C"]);
    assert_eq!(f.signer.signed_orgs(), ["A", "B", "C"]);

    let row = f.store.get_contract("c1", "asset").unwrap().unwrap();
    assert_eq!(row.status, ContractStatus::InitOk);
    assert_eq!(row.multi_sign_status, MultiSignStatus::NoVoting);
    assert_eq!(row.tx_id.as_deref(), Some(submissions[0].payload.tx_id.as_str()));

    let stored = f.workflow.proposal(id).unwrap();
    assert_eq!(stored.status, ProposalStatus::Approved);
    assert!(matches!(
        f.workflow.vote(id, "D", true).await,
        Err(GovernanceError::AlreadyFinalized(_))
    ));
    assert_eq!(f.client.submissions().len(), 1);
}

#[tokio::test]
async fn failing_contract_result_marks_install_failed() {
    let f = fixture(PolicyRule::Majority);
    f.client.queue_response(Ok(TxResponse {
        code: TxStatusCode::Success,
        message: "OK".into(),
        tx_id: "tx-1".into(),
        contract_result: Some(ContractResult {
            code: 1,
            message: "bad bytecode".into(),
            ..Default::default()
        }),
    }));
    let proposal = f.workflow.propose("c1", install(), "").await.unwrap();
    let id = &proposal.multi_id;
    f.workflow.vote(id, "A", true).await.unwrap();
    f.workflow.vote(id, "B", true).await.unwrap();
    let err = f.workflow.vote(id, "C", true).await.unwrap_err();
    assert!(matches!(err, GovernanceError::Dispatch { .. }));

    let row = f.store.get_contract("c1", "asset").unwrap().unwrap();
    assert_eq!(row.status, ContractStatus::InitFailure);
    assert_eq!(row.multi_sign_status, MultiSignStatus::NoVoting);
    assert!(matches!(
        f.workflow.proposal(id).unwrap().outcome,
        Some(DispatchOutcome::Failed { .. })
    ));

    // A failed install may be proposed again.
    assert!(f.workflow.propose("c1", install(), "retry").await.is_ok());
}

#[tokio::test]
async fn second_vote_by_same_org_is_rejected() {
    let f = fixture(PolicyRule::Majority);
    let proposal = f.workflow.propose("c1", install(), "").await.unwrap();
    let id = &proposal.multi_id;
    f.workflow.vote(id, "A", true).await.unwrap();
    assert!(matches!(
        f.workflow.vote(id, "A", false).await,
        Err(GovernanceError::AlreadyVoted { .. })
    ));
    assert_eq!(
        f.workflow.vote(id, "B", true).await.unwrap(),
        VoteOutcome::Pending {
            passed: 2,
            required: 3
        }
    );
    assert!(matches!(
        f.workflow.vote(id, "E", true).await,
        Err(GovernanceError::BallotNotFound { .. })
    ));
    assert!(matches!(
        f.workflow.vote("missing", "A", true).await,
        Err(GovernanceError::ProposalNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_final_votes_dispatch_once() {
    let f = fixture(PolicyRule::Majority);
    f.client.delay_submissions(Duration::from_millis(50));
    let proposal = f.workflow.propose("c1", install(), "").await.unwrap();
    let id = proposal.multi_id.clone();
    f.workflow.vote(&id, "A", true).await.unwrap();
    f.workflow.vote(&id, "B", true).await.unwrap();

    let tasks: Vec<_> = ["C", "D"]
        .into_iter()
        .map(|org| {
            let workflow = f.workflow.clone();
            let id = id.clone();
            tokio::spawn(async move { workflow.vote(&id, org, true).await })
        })
        .collect();
    let mut dispatched = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(VoteOutcome::Dispatched(_)) => dispatched += 1,
            Ok(VoteOutcome::Settled) | Err(GovernanceError::AlreadyFinalized(_)) => {}
            other => panic!("unexpected vote result {other:?}"),
        }
    }
    assert_eq!(dispatched, 1);
    assert_eq!(f.client.submissions().len(), 1);
}

#[tokio::test]
async fn forbidden_policy_refuses_and_closes_votes() {
    let f = fixture(PolicyRule::Forbidden);
    assert!(matches!(
        f.workflow.propose("c1", install(), "").await,
        Err(GovernanceError::ForbiddenPolicy(ResourceType::InitContract))
    ));

    let f = fixture(PolicyRule::Majority);
    let proposal = f.workflow.propose("c1", install(), "").await.unwrap();
    set_policy(
        &f.store,
        ResourceType::InitContract,
        PolicyRule::Forbidden,
        RoleType::Admin,
    );
    assert!(matches!(
        f.workflow.vote(&proposal.multi_id, "A", true).await,
        Err(GovernanceError::ForbiddenPolicy(_))
    ));
    let stored = f.workflow.proposal(&proposal.multi_id).unwrap();
    assert_eq!(stored.status, ProposalStatus::RejectedForbidden);
    let row = f.store.get_contract("c1", "asset").unwrap().unwrap();
    assert_eq!(row.multi_sign_status, MultiSignStatus::NoVoting);
    assert!(f.client.submissions().is_empty());
}

#[tokio::test]
async fn contract_under_vote_cannot_be_proposed_again() {
    let f = fixture(PolicyRule::Majority);
    f.workflow.propose("c1", install(), "").await.unwrap();
    assert!(matches!(
        f.workflow.propose("c1", install(), "").await,
        Err(GovernanceError::ContractBeingVoted(_))
    ));
    let freeze = GovernedAction::FreezeContract(ContractRef {
        contract_name: "asset".into(),
    });
    assert!(matches!(
        f.workflow.propose("c1", freeze, "").await,
        Err(GovernanceError::ContractBeingVoted(_))
    ));
}

#[tokio::test]
async fn client_role_policy_requires_client_certificates() {
    let f = fixture(PolicyRule::Any);
    set_policy(
        &f.store,
        ResourceType::InitContract,
        PolicyRule::Any,
        RoleType::Client,
    );
    let proposal = f.workflow.propose("c1", install(), "").await.unwrap();
    assert!(matches!(
        f.workflow.vote(&proposal.multi_id, "B", true).await,
        Err(GovernanceError::MissingCertificate {
            role: CertRole::Client,
            ..
        })
    ));
}

#[tokio::test]
async fn block_update_matching_mirror_is_not_submitted() {
    let f = fixture(PolicyRule::Any);
    let same = GovernedAction::BlockUpdate(BlockUpdateParams {
        block_tx_capacity: 100,
        block_interval: 2000,
        tx_timeout: 600,
    });
    let proposal = f.workflow.propose("c1", same, "").await.unwrap();
    assert_eq!(
        f.workflow.vote(&proposal.multi_id, "A", true).await.unwrap(),
        VoteOutcome::Dispatched(DispatchOutcome::Unchanged)
    );
    assert!(f.client.submissions().is_empty());

    let bigger = GovernedAction::BlockUpdate(BlockUpdateParams {
        block_tx_capacity: 500,
        block_interval: 0,
        tx_timeout: 0,
    });
    let proposal = f.workflow.propose("c1", bigger, "").await.unwrap();
    f.workflow.vote(&proposal.multi_id, "D", true).await.unwrap();
    let submissions = f.client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].kind, SubmissionKind::ChainConfigUpdate);
    assert_eq!(submissions[0].payload.sequence, 5);
}

#[tokio::test]
async fn unsubscribed_chain_is_refused() {
    let f = fixture(PolicyRule::Majority);
    assert!(matches!(
        f.workflow.propose("c2", install(), "").await,
        Err(GovernanceError::NotSubscribed(_))
    ));
    assert!(f.workflow.proposals("c1").unwrap().is_empty());
}
