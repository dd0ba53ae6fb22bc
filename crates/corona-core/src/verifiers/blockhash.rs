//! Blockhash proof verifier (`spec.md` §4.8): the cheapest of the eight
//! per-proof verifiers, and the one the README-level worked example
//! (scenario 1 of `spec.md` §8) is built from.

use crate::config::VerifierConfig;
use crate::consensus::gindex::BLOCK_HASH_GINDEX;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::merkle::verify_single_leaf;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::types::proof::{BlockHashProof, RpcData};
use crate::types::request::Method;

use super::common::verify_proof_header;

pub fn verify_blockhash_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &BlockHashProof,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    verify_single_leaf(
        &proof.block_hash,
        BLOCK_HASH_GINDEX,
        &proof.header.execution_branch,
        &proof.header.beacon_header.body_root,
    )?;

    verify_proof_header(&proof.header, store, config, bls)?;

    match method {
        Method::EthGetBlockByHash { hash, .. } => {
            if *hash != proof.block_hash {
                return Err(VerifyError::DataMismatch {
                    reason: "requested block hash does not match the proven block hash".into(),
                });
            }
            Ok(RpcData::BlockHash(proof.block_hash))
        }
        Method::EthGetBlockByNumber { .. } => Ok(RpcData::BlockHash(proof.block_hash)),
        other => Err(VerifyError::MethodNotProofable {
            reason: format!("{other:?} cannot be substantiated by a blockhash proof"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ssz::sha256_pair;
    use crate::consensus::signing::test_support::AlwaysValid;
    use crate::storage::InMemoryStorage;
    use crate::types::beacon::{BeaconBlockHeader, BlsPublicKey, BlsSignature, SyncAggregate, SyncCommittee};
    use crate::types::proof::ProofHeader;

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

    fn honest_proof() -> BlockHashProof {
        let block_hash = [0xABu8; 32];
        let branch = vec![[0x11u8; 32]; 9];
        let body_root = forward_root(block_hash, BLOCK_HASH_GINDEX, &branch);
        BlockHashProof {
            header: ProofHeader {
                beacon_header: BeaconBlockHeader {
                    slot: 10,
                    proposer_index: 0,
                    parent_root: [0; 32],
                    state_root: [0; 32],
                    body_root,
                },
                sync_aggregate: SyncAggregate::from_raw(vec![0xFF; 64], BlsSignature([0; 96])).unwrap(),
                execution_branch: branch,
            },
            block_hash,
        }
    }

    #[test]
    fn accepts_honest_proof_and_matching_method() {
        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let proof = honest_proof();
        let method = Method::EthGetBlockByHash {
            hash: proof.block_hash,
            full_tx: false,
        };
        let result = verify_blockhash_proof(&proof, &method, &store, &config, &AlwaysValid).unwrap();
        assert!(matches!(result, RpcData::BlockHash(h) if h == proof.block_hash));
    }

    #[test]
    fn rejects_tampered_branch() {
        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let mut proof = honest_proof();
        proof.header.execution_branch[0][0] ^= 0xFF;
        let method = Method::EthGetBlockByNumber {
            number: 1,
            full_tx: false,
        };
        assert!(verify_blockhash_proof(&proof, &method, &store, &config, &AlwaysValid).is_err());
    }

    #[test]
    fn rejects_hash_mismatch_against_request() {
        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let proof = honest_proof();
        let method = Method::EthGetBlockByHash {
            hash: [0xFFu8; 32],
            full_tx: false,
        };
        assert!(matches!(
            verify_blockhash_proof(&proof, &method, &store, &config, &AlwaysValid),
            Err(VerifyError::DataMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unrelated_method() {
        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let proof = honest_proof();
        let method = Method::EthGetTransactionCount {
            address: [0u8; 20],
        };
        assert!(matches!(
            verify_blockhash_proof(&proof, &method, &store, &config, &AlwaysValid),
            Err(VerifyError::MethodNotProofable { .. })
        ));
    }
}
