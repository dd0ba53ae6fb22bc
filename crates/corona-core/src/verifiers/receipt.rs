//! Receipt proof verifier (`spec.md` §4.8): binds a receipts-trie proof to
//! a beacon header via `executionPayload.receiptsRoot`, substantiating
//! `eth_getTransactionReceipt`.

use crate::codec::execution::decode_receipt;
use crate::config::VerifierConfig;
use crate::consensus::gindex::RECEIPTS_ROOT_GINDEX;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::merkle::verify_single_leaf;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::trie::{verify_trie_proof, TrieOutcome};
use crate::types::execution::TransactionReceipt;
use crate::types::proof::{ReceiptProofData, RpcData};
use crate::types::request::Method;

use super::common::verify_proof_header;

/// Encode the RLP index key a receipt at `tx_index` occupies in the
/// receipts trie: the transaction index itself, RLP-encoded as the trie
/// key (per EIP-2718 / standard execution-layer trie convention).
fn receipt_trie_key(tx_index: u64) -> Vec<u8> {
    crate::codec::rlp::encode_uint64(tx_index)
}

pub fn verify_receipt_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &ReceiptProofData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    verify_single_leaf(
        &proof.receipts_root,
        RECEIPTS_ROOT_GINDEX,
        &proof.receipts_root_branch,
        &proof.header.beacon_header.body_root,
    )?;
    verify_proof_header(&proof.header, store, config, bls)?;

    let key = receipt_trie_key(proof.receipt_proof.tx_index);
    let nodes: Vec<Vec<u8>> = proof.receipt_proof.proof.iter().map(|b| b.to_vec()).collect();
    let receipt: TransactionReceipt = match verify_trie_proof(&proof.receipts_root, &key, &nodes)? {
        TrieOutcome::Value(rlp) => decode_receipt(&rlp)?,
        TrieOutcome::Absent => {
            return Err(VerifyError::BadProof {
                reason: "receipt proof establishes absence, but a receipt was expected".into(),
            })
        }
    };

    match method {
        Method::EthGetTransactionReceipt { .. } => Ok(RpcData::Receipt(Box::new(receipt))),
        other => Err(VerifyError::MethodNotProofable {
            reason: format!("{other:?} cannot be substantiated by a receipt proof"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ssz::sha256_pair;
    use crate::consensus::signing::test_support::AlwaysValid;
    use crate::storage::InMemoryStorage;
    use crate::trie::keccak256;
    use crate::types::beacon::{BeaconBlockHeader, BlsPublicKey, BlsSignature, SyncAggregate, SyncCommittee};
    use crate::types::execution::ReceiptProof;
    use crate::types::proof::ProofHeader;
    use alloy_primitives::Bytes;
    use alloy_rlp::Encodable;

    fn rlp_list(items: Vec<Vec<u8>>) -> Vec<u8> {
        let payload: Vec<u8> = items.concat();
        let mut out = Vec::new();
        alloy_rlp::Header { list: true, payload_length: payload.len() }.encode(&mut out);
        out.extend_from_slice(&payload);
        out
    }

    fn rlp_str(bytes: &[u8]) -> Vec<u8> {
        if bytes.len() == 1 && bytes[0] < 0x80 {
            return vec![bytes[0]];
        }
        let mut out = Vec::new();
        bytes.encode(&mut out);
        out
    }

    fn rlp_uint(v: u64) -> Vec<u8> {
        if v == 0 {
            return vec![0x80];
        }
        let be = v.to_be_bytes();
        let start = be.iter().position(|&b| b != 0).unwrap();
        rlp_str(&be[start..])
    }

    fn committee() -> SyncCommittee {
        SyncCommittee {
            pubkeys: (0..512).map(|_| BlsPublicKey::Compressed([5u8; 48])).collect(),
            aggregate_pubkey: BlsPublicKey::Compressed([5u8; 48]),
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

    #[test]
    fn accepts_honest_receipt_proof() {
        let receipt_rlp = rlp_list(vec![
            rlp_uint(1),
            rlp_uint(21000),
            rlp_str(&[0u8; 256]),
            rlp_list(vec![]),
        ]);
        let tx_index = 2u64;
        let key = receipt_trie_key(tx_index);
        let nibbles: Vec<u8> = key.iter().flat_map(|b| [b >> 4, b & 0xF]).collect();
        let mut compact = vec![0x20u8];
        for pair in nibbles.chunks(2) {
            compact.push((pair[0] << 4) | pair[1]);
        }
        let leaf_node = rlp_list(vec![compact, receipt_rlp]);
        let receipts_root = keccak256(&leaf_node);

        let branch = vec![[0x44u8; 32]; 9];
        let body_root = forward_root(receipts_root, RECEIPTS_ROOT_GINDEX, &branch);

        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let proof = ReceiptProofData {
            header: ProofHeader {
                beacon_header: BeaconBlockHeader {
                    slot: 10,
                    proposer_index: 0,
                    parent_root: [0; 32],
                    state_root: [0; 32],
                    body_root,
                },
                sync_aggregate: SyncAggregate::from_raw(vec![0xFF; 64], BlsSignature([0; 96])).unwrap(),
                execution_branch: vec![],
            },
            receipts_root,
            receipts_root_branch: branch,
            receipt_proof: ReceiptProof {
                tx_index,
                proof: vec![Bytes::from(leaf_node)],
            },
        };

        let method = Method::EthGetTransactionReceipt { hash: [0u8; 32] };
        let result = verify_receipt_proof(&proof, &method, &store, &config, &AlwaysValid).unwrap();
        match result {
            RpcData::Receipt(r) => assert_eq!(r.status, 1),
            _ => panic!("expected Receipt"),
        }
    }
}
