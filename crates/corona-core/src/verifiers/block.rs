//! Block proof verifier (`spec.md` §4.8): binds a full
//! `ExecutionPayloadHeader` into a beacon header via
//! `EXECUTION_PAYLOAD_GINDEX`, substantiating `eth_getBlockByHash` and
//! `eth_getBlockByNumber` when the full header (not just the hash, see
//! `verifiers::blockhash`) is requested.

use crate::codec::ssz::hash_tree_root_execution_payload_header;
use crate::config::VerifierConfig;
use crate::consensus::gindex::EXECUTION_PAYLOAD_GINDEX;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::merkle::verify_single_leaf;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::types::proof::{BlockProofData, RpcData};
use crate::types::request::Method;

use super::common::verify_proof_header;

pub fn verify_block_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &BlockProofData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    let payload_root = hash_tree_root_execution_payload_header(&proof.execution_payload_header);
    verify_single_leaf(
        &payload_root,
        EXECUTION_PAYLOAD_GINDEX,
        &proof.header.execution_branch,
        &proof.header.beacon_header.body_root,
    )?;
    verify_proof_header(&proof.header, store, config, bls)?;

    match method {
        Method::EthGetBlockByHash { hash, .. } => {
            if *hash != proof.execution_payload_header.block_hash {
                return Err(VerifyError::DataMismatch {
                    reason: "requested block hash does not match the proven block header".into(),
                });
            }
            Ok(RpcData::BlockHeader(Box::new(proof.execution_payload_header.clone())))
        }
        Method::EthGetBlockByNumber { number, .. } => {
            if *number != proof.execution_payload_header.block_number {
                return Err(VerifyError::DataMismatch {
                    reason: "requested block number does not match the proven block header".into(),
                });
            }
            Ok(RpcData::BlockHeader(Box::new(proof.execution_payload_header.clone())))
        }
        other => Err(VerifyError::MethodNotProofable {
            reason: format!("{other:?} cannot be substantiated by a block proof"),
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
    use crate::types::execution::ExecutionPayloadHeader;
    use crate::types::proof::ProofHeader;

    fn committee() -> SyncCommittee {
        SyncCommittee {
            pubkeys: (0..512).map(|_| BlsPublicKey::Compressed([8u8; 48])).collect(),
            aggregate_pubkey: BlsPublicKey::Compressed([8u8; 48]),
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

    fn payload_header() -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: [0x01; 32],
            fee_recipient: [0x02; 20],
            state_root: [0x03; 32],
            receipts_root: [0x04; 32],
            logs_bloom: [0u8; 256],
            prev_randao: [0x08; 32],
            block_number: 19_000_000,
            gas_limit: 30_000_000,
            gas_used: 12_000_000,
            timestamp: 1_700_000_000,
            extra_data: vec![],
            base_fee_per_gas: [0u8; 32],
            block_hash: [0x05; 32],
            transactions_root: [0x06; 32],
            withdrawals_root: [0x07; 32],
            blob_gas_used: 0,
            excess_blob_gas: 0,
        }
    }

    #[test]
    fn accepts_honest_block_header_proof() {
        let header_data = payload_header();
        let payload_root = hash_tree_root_execution_payload_header(&header_data);
        let branch = vec![[0x13u8; 32]; 5];
        let body_root = forward_root(payload_root, EXECUTION_PAYLOAD_GINDEX, &branch);

        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let proof = BlockProofData {
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
            execution_payload_header: header_data.clone(),
        };

        let method = Method::EthGetBlockByNumber { number: header_data.block_number, full_tx: false };
        let result = verify_block_proof(&proof, &method, &store, &config, &AlwaysValid).unwrap();
        match result {
            RpcData::BlockHeader(h) => assert_eq!(h.block_hash, header_data.block_hash),
            _ => panic!("expected BlockHeader"),
        }
    }
}
