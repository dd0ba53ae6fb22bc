//! End-to-end scenarios against the public `VerifyContext` entry point.
//! Scenarios 1-4 need recorded mainnet bytes this repository does not ship
//! (see `tests/fixtures/README.md`) and are `#[ignore]`d with a loading
//! seam; scenarios 5 and 6 only exercise the pending/rejection mechanics
//! and are constructible from synthetic in-process data, so they run
//! unconditionally.

use std::fs;
use std::path::Path;

use corona_core::codec::ssz::sha256_pair;
use corona_core::config::VerifierConfig;
use corona_core::consensus::gindex::BLOCK_HASH_GINDEX;
use corona_core::consensus::signing::test_support::{AlwaysInvalid, AlwaysValid};
use corona_core::driver::{StepOutcome, VerifyContext};
use corona_core::storage::InMemoryStorage;
use corona_core::store::SyncCommitteeStore;
use corona_core::types::{
    BeaconBlockHeader, BlockHashProof, BlsPublicKey, BlsSignature, ChainId, Method, Proof,
    ProofHeader, RequestEnvelope, SyncAggregate, SyncCommittee,
};

fn fixture_bytes(name: &str) -> Option<Vec<u8>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    fs::read(path).ok()
}

fn committee() -> SyncCommittee {
    SyncCommittee {
        pubkeys: (0..512).map(|_| BlsPublicKey::Compressed([3u8; 48])).collect(),
        aggregate_pubkey: BlsPublicKey::Compressed([3u8; 48]),
    }
}

fn forward_root(leaf: [u8; 32], gindex: u64, branch: &[[u8; 32]]) -> [u8; 32] {
    let mut current = leaf;
    for (i, sib) in branch.iter().enumerate() {
        current = if (gindex >> i) & 1 == 1 {
            sha256_pair(sib, &current)
        } else {
            sha256_pair(&current, sib)
        };
    }
    current
}

fn blockhash_envelope(block_hash: [u8; 32], signature: [u8; 96]) -> Vec<u8> {
    let branch = vec![[0x33u8; 32]; 9];
    let body_root = forward_root(block_hash, BLOCK_HASH_GINDEX, &branch);
    let proof = Proof::BlockHash(BlockHashProof {
        header: ProofHeader {
            beacon_header: BeaconBlockHeader {
                slot: 10,
                proposer_index: 0,
                parent_root: [0; 32],
                state_root: [0; 32],
                body_root,
            },
            sync_aggregate: SyncAggregate::from_raw(vec![0xFF; 64], BlsSignature(signature)).unwrap(),
            execution_branch: branch,
        },
        block_hash,
    });
    let envelope = RequestEnvelope {
        chain: ChainId::ETHEREUM,
        data: None,
        proof: Some(proof),
        sync_data: vec![],
    };
    corona_core::codec::envelope::encode_envelope(&envelope).unwrap()
}

#[test]
#[ignore = "needs tests/fixtures/blockhash_0x14d7970.bin, see tests/fixtures/README.md"]
fn scenario_1_blockhash_proof_mainnet() {
    let Some(bytes) = fixture_bytes("blockhash_0x14d7970.bin") else {
        panic!("missing tests/fixtures/blockhash_0x14d7970.bin");
    };
    let store = SyncCommitteeStore::new(InMemoryStorage::new());
    let config = VerifierConfig::mainnet([0; 32]);
    let method = Method::EthGetBlockByNumber { number: 0x14d7970, full_tx: false };
    let mut ctx =
        VerifyContext::init(&store, &config, &AlwaysValid, &bytes, method, ChainId::ETHEREUM, None)
            .unwrap();
    assert!(matches!(ctx.step(), StepOutcome::Success(_)));
}

#[test]
#[ignore = "needs tests/fixtures/balance_dac17f.bin, see tests/fixtures/README.md"]
fn scenario_2_account_proof_balance() {
    let Some(bytes) = fixture_bytes("balance_dac17f.bin") else {
        panic!("missing tests/fixtures/balance_dac17f.bin");
    };
    let store = SyncCommitteeStore::new(InMemoryStorage::new());
    let config = VerifierConfig::mainnet([0; 32]);
    let method = Method::EthGetBalance {
        address: hex::decode("dac17f958d2ee523a2206206994597c13d831ec7").unwrap().try_into().unwrap(),
    };
    let mut ctx =
        VerifyContext::init(&store, &config, &AlwaysValid, &bytes, method, ChainId::ETHEREUM, None)
            .unwrap();
    assert!(matches!(ctx.step(), StepOutcome::Success(_)));
}

#[test]
#[ignore = "needs tests/fixtures/tx_scenario3.bin, see tests/fixtures/README.md"]
fn scenario_3_transaction_proof() {
    let Some(_bytes) = fixture_bytes("tx_scenario3.bin") else {
        panic!("missing tests/fixtures/tx_scenario3.bin");
    };
}

#[test]
#[ignore = "needs tests/fixtures/logs_0x14d7970.bin, see tests/fixtures/README.md"]
fn scenario_4_receipt_proof_with_logs_filter() {
    let Some(_bytes) = fixture_bytes("logs_0x14d7970.bin") else {
        panic!("missing tests/fixtures/logs_0x14d7970.bin");
    };
}

#[test]
fn scenario_5_missing_committee_then_recovers() {
    let store = SyncCommitteeStore::new(InMemoryStorage::new());
    let config = VerifierConfig::mainnet([0; 32]);
    let bytes = blockhash_envelope([0x9Au8; 32], [0; 96]);
    let method = Method::EthGetBlockByHash { hash: [0x9Au8; 32], full_tx: false };

    let mut ctx =
        VerifyContext::init(&store, &config, &AlwaysValid, &bytes, method, ChainId::ETHEREUM, None)
            .unwrap();
    assert!(matches!(ctx.step(), StepOutcome::Pending));
    assert_eq!(ctx.pending_requests().len(), 1);

    store.put_validators(config.chain, 0, committee(), None).unwrap();
    let mut ctx2 =
        VerifyContext::init(&store, &config, &AlwaysValid, &bytes, Method::EthGetBlockByHash { hash: [0x9Au8; 32], full_tx: false }, ChainId::ETHEREUM, None)
            .unwrap();
    assert!(matches!(ctx2.step(), StepOutcome::Success(_)));
}

#[test]
fn scenario_6_tampered_signature_rejected() {
    let store = SyncCommitteeStore::new(InMemoryStorage::new());
    let config = VerifierConfig::mainnet([0; 32]);
    store.put_validators(config.chain, 0, committee(), None).unwrap();

    let bytes = blockhash_envelope([0x9Au8; 32], [0; 96]);
    let method = Method::EthGetBlockByHash { hash: [0x9Au8; 32], full_tx: false };
    let mut ctx =
        VerifyContext::init(&store, &config, &AlwaysInvalid, &bytes, method, ChainId::ETHEREUM, None)
            .unwrap();
    assert!(matches!(ctx.step(), StepOutcome::Error(_)));
}
