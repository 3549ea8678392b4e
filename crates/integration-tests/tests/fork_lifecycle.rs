//! End-to-end lifecycle runs against a scripted chain with file-backed inputs

use ethers_core::types::{Address, U256};
use fip_core::application::calldata::{
    GovernorProposal, GOVERNOR_EXECUTE, GOVERNOR_PROPOSE, GOVERNOR_QUEUE, TIMELOCK_EXECUTE_BATCH,
    TIMELOCK_SCHEDULE_BATCH,
};
use fip_core::application::{
    construct_proposal, GovernanceConfig, UpgradeCoordinator, UpgradeOptions,
};
use fip_core::domain::abi::selector_of;
use fip_core::port::chain::mocks::{MockChain, MockResponse};
use fip_core::port::ProposalSource;
use fip_infra_fs::{FsArtifactStore, FsProposalSource};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const GUARDIAN_ROLE: &str = "0x5555555555555555555555555555555555555555555555555555555555555555";

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn hex(n: u64) -> String {
    format!("{:?}", addr(n))
}

fn write_json(root: &Path, relative: &str, value: serde_json::Value) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// Repository layout with an OA proposal that deploys a guard and a DAO proposal
fn fixture(guard_already_deployed: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let mut registry = json!({
        "core": { "address": hex(0xc0), "artifactName": "Core", "category": "Core" },
        "fei": { "address": hex(0xfe1), "artifactName": "Fei", "category": "Core" },
        "daiPSM": { "address": hex(0xd41), "artifactName": "PegStabilityModule", "category": "Peg" },
        "feiDAO": { "address": hex(0xda0), "artifactName": "FeiDAO", "category": "Governance" },
        "feiDAOTimelock": { "address": hex(0xda1), "artifactName": "Timelock", "category": "Governance" },
        "daoVoter": { "address": hex(0xda2), "artifactName": "", "category": "External" },
        "optimisticTimelock": { "address": hex(0x71), "artifactName": "TimelockController", "category": "Governance" },
        "optimisticMultisig": { "address": hex(0x72), "artifactName": "", "category": "Governance" }
    });
    if guard_already_deployed {
        registry["newGuard"] = json!({ "address": hex(0x9d), "artifactName": "PSMGuard", "category": "Peg" });
    }
    write_json(root, "protocol-configuration/mainnet_addresses.json", registry);

    write_json(
        root,
        "proposals/proposals_config.json",
        json!({
            "oa_psm_guard": {
                "deploy": true,
                "category": "OA",
                "totalValue": 0,
                "affectedContractSignoff": ["core", "daiPSM", "newGuard"],
                "deprecatedContractSignoff": []
            },
            "fip_pause_fei": {
                "deploy": false,
                "category": "DAO",
                "totalValue": 0,
                "proposalId": "",
                "affectedContractSignoff": ["fei"],
                "deprecatedContractSignoff": []
            }
        }),
    );

    write_json(
        root,
        "proposals/description/oa_psm_guard.json",
        json!({
            "title": "OA: PSM guard",
            "description": "Deploys a guard able to pause the DAI PSM.",
            "deploy": [{
                "name": "newGuard",
                "artifact": "PSMGuard",
                "args": ["{core}", "{daiPSM}"],
                "category": "Peg"
            }],
            "setup": [{
                "from": "optimisticMultisig",
                "target": "daiPSM",
                "method": "setGuardian(address)",
                "arguments": ["{newGuard}"],
                "description": "Point the PSM at the guard"
            }],
            "commands": [
                {
                    "target": "core",
                    "method": "grantRole(bytes32,address)",
                    "arguments": [GUARDIAN_ROLE, "{newGuard}"],
                    "description": "Grant the guardian role to the guard"
                },
                {
                    "target": "daiPSM",
                    "method": "pause()",
                    "description": "Pause the PSM"
                }
            ],
            "checks": [
                {
                    "target": "daiPSM",
                    "method": "paused()",
                    "returns": ["bool"],
                    "expected": [true],
                    "description": "PSM is paused"
                },
                {
                    "target": "core",
                    "method": "hasRole(bytes32,address)",
                    "arguments": [GUARDIAN_ROLE, "{newGuard}"],
                    "returns": ["bool"],
                    "expected": [true],
                    "description": "Guard holds the guardian role"
                }
            ]
        }),
    );

    write_json(
        root,
        "proposals/description/fip_pause_fei.json",
        json!({
            "title": "FIP-200: Pause FEI",
            "description": "Pauses FEI transfers.",
            "commands": [{
                "target": "fei",
                "method": "pause()",
                "description": "Pause FEI"
            }],
            "checks": [{
                "target": "fei",
                "method": "paused()",
                "returns": ["bool"],
                "expected": [true],
                "description": "FEI is paused"
            }]
        }),
    );

    write_json(
        root,
        "artifacts/contracts/peg/PSMGuard.sol/PSMGuard.json",
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": "PSMGuard",
            "sourceName": "contracts/peg/PSMGuard.sol",
            "abi": [{
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "core", "type": "address", "internalType": "address" },
                    { "name": "psm", "type": "address", "internalType": "address" }
                ]
            }],
            "bytecode": "0x60806040",
            "deployedBytecode": "0x"
        }),
    );

    dir
}

fn coordinator(dir: &TempDir, chain: Arc<MockChain>) -> UpgradeCoordinator {
    UpgradeCoordinator::new(
        Arc::new(FsProposalSource::new(dir.path())),
        chain,
        Arc::new(FsArtifactStore::new(dir.path().join("artifacts"))),
        GovernanceConfig::default(),
        addr(0xde9),
    )
}

fn script_optimistic_timelock(chain: &MockChain) {
    let timelock = addr(0x71);
    chain.respond(timelock, selector_of("getMinDelay()"), vec![MockResponse::uint(345_600)]);
    chain.respond(timelock, selector_of("isOperation(bytes32)"), vec![MockResponse::bool(false)]);
    chain.respond(timelock, selector_of("isOperationDone(bytes32)"), vec![MockResponse::bool(false)]);
    chain.respond(timelock, selector_of("isOperationReady(bytes32)"), vec![MockResponse::bool(true)]);
    chain.respond(addr(0xd41), selector_of("paused()"), vec![MockResponse::bool(true)]);
    chain.respond(addr(0xc0), selector_of("hasRole(bytes32,address)"), vec![MockResponse::bool(true)]);
}

#[tokio::test]
async fn test_optimistic_proposal_with_deploy() {
    let dir = fixture(false);
    let chain = Arc::new(MockChain::new());
    script_optimistic_timelock(&chain);

    let report = coordinator(&dir, chain.clone())
        .apply("oa_psm_guard", &UpgradeOptions::default())
        .await
        .unwrap();

    let guard = MockChain::deployment_address(1);
    assert_eq!(report.deployed.len(), 1);
    assert_eq!(report.deployed[0].address, guard);
    assert_eq!(report.setup.len(), 1);
    assert!(report.teardown.is_empty());
    assert!(report.passed(), "{:?}", report.checks);

    let simulation = report.simulation.as_ref().unwrap();
    assert!(!simulation.already_executed);
    assert_eq!(simulation.transactions.len(), 2);
    assert_eq!(chain.elapsed_seconds(), 345_600);

    let sent = chain.sent();
    // deploy, setGuardian, scheduleBatch, executeBatch
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0].to, None);
    assert_eq!(sent[0].from, addr(0xde9));
    assert_eq!(sent[0].data.len(), 4 + 2 * 32);
    assert_eq!(
        chain.sent_selectors()[1..],
        [
            selector_of(TIMELOCK_SCHEDULE_BATCH),
            selector_of(TIMELOCK_EXECUTE_BATCH)
        ]
    );
    assert_eq!(sent[2].from, addr(0x72));

    // the governance batch targets the freshly deployed guard
    assert!(sent[2]
        .data
        .windows(20)
        .any(|window| window == guard.as_bytes()));
}

#[tokio::test]
async fn test_skip_deploy_uses_registry_address() {
    let dir = fixture(true);
    let chain = Arc::new(MockChain::new());
    script_optimistic_timelock(&chain);

    let report = coordinator(&dir, chain.clone())
        .apply("oa_psm_guard", &UpgradeOptions { skip_deploy: true })
        .await
        .unwrap();

    assert!(report.deployed.is_empty());
    assert!(chain.sent().iter().all(|tx| tx.to.is_some()));
    assert!(chain.sent()[1]
        .data
        .windows(20)
        .any(|window| window == addr(0x9d).as_bytes()));
    assert!(report.passed());
}

#[tokio::test]
async fn test_failing_check_is_reported_not_raised() {
    let dir = fixture(false);
    let chain = Arc::new(MockChain::new());
    script_optimistic_timelock(&chain);
    chain.respond(addr(0xd41), selector_of("paused()"), vec![MockResponse::bool(false)]);

    let report = coordinator(&dir, chain)
        .apply("oa_psm_guard", &UpgradeOptions::default())
        .await
        .unwrap();

    assert!(!report.passed());
    assert!(!report.checks[0].passed);
    assert!(report.checks[1].passed);
}

#[tokio::test]
async fn test_dao_proposal_full_lifecycle() {
    let dir = fixture(false);
    let chain = Arc::new(MockChain::new());
    let governor = addr(0xda0);
    chain.respond(
        governor,
        selector_of("state(uint256)"),
        vec![
            MockResponse::Revert("Governor: unknown proposal id".to_string()),
            MockResponse::uint(0),
            MockResponse::uint(1),
            MockResponse::uint(4),
            MockResponse::uint(5),
            MockResponse::uint(7),
        ],
    );
    chain.respond(governor, selector_of("votingDelay()"), vec![MockResponse::uint(1)]);
    chain.respond(governor, selector_of("votingPeriod()"), vec![MockResponse::uint(13_000)]);
    chain.respond(addr(0xda1), selector_of("getMinDelay()"), vec![MockResponse::uint(172_800)]);
    chain.respond(addr(0xfe1), selector_of("paused()"), vec![MockResponse::bool(true)]);

    let report = coordinator(&dir, chain.clone())
        .apply("fip_pause_fei", &UpgradeOptions::default())
        .await
        .unwrap();

    assert_eq!(
        chain.sent_selectors(),
        vec![
            selector_of(GOVERNOR_PROPOSE),
            selector_of("castVote(uint256,uint8)"),
            selector_of(GOVERNOR_QUEUE),
            selector_of(GOVERNOR_EXECUTE),
        ]
    );
    assert!(chain.sent().iter().all(|tx| tx.from == addr(0xda2)));
    assert_eq!(chain.elapsed_seconds(), 172_801);
    assert!(report.passed());

    // reported id is the governor hash of the proposal
    let source = FsProposalSource::new(dir.path());
    let proposal = construct_proposal(
        &source.description("fip_pause_fei").await.unwrap(),
        &source.registry().await.unwrap(),
    )
    .unwrap();
    let expected_id: U256 = GovernorProposal::from_proposal(&proposal).proposal_id();
    assert_eq!(report.simulation.unwrap().id, expected_id.to_string());
}

#[tokio::test]
async fn test_defeated_dao_proposal_fails_the_run() {
    let dir = fixture(false);
    let chain = Arc::new(MockChain::new());
    chain.respond(addr(0xda0), selector_of("state(uint256)"), vec![MockResponse::uint(3)]);

    let err = coordinator(&dir, chain.clone())
        .apply("fip_pause_fei", &UpgradeOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Defeated"));
    assert!(chain.sent().is_empty());
}
