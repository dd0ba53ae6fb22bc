//! Account proof verifier (`spec.md` §4.8): binds an `eth_getProof`-style
//! account (and optional storage slot) proof to a beacon header via the
//! execution `stateRoot`, substantiating `eth_getBalance`,
//! `eth_getStorageAt`, and `eth_getTransactionCount`.

use alloy_primitives::U256;

use crate::codec::execution::decode_account;
use crate::codec::rlp::decode_bytes;
use crate::config::VerifierConfig;
use crate::consensus::gindex::STATE_ROOT_GINDEX;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::merkle::verify_single_leaf;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::trie::{keccak256, verify_trie_proof, TrieOutcome};
use crate::types::execution::{AccountProof, AccountState, StorageProof};
use crate::types::proof::{AccountProofData, RpcData};
use crate::types::request::Method;

use super::common::verify_proof_header;

/// Walk an account's Merkle-Patricia proof against a trusted `state_root`
/// and decode the leaf, without touching the beacon layer at all. Shared
/// between the top-level account verifier and the call-proof verifier,
/// which replays against a set of these without re-checking the BLS
/// signature per nested account (`spec.md` §4.8).
pub fn verify_account_state(
    state_root: &[u8; 32],
    account_proof: &AccountProof,
) -> Result<AccountState, VerifyError> {
    let key = keccak256(account_proof.address.as_slice());
    let nodes: Vec<Vec<u8>> = account_proof.proof.iter().map(|b| b.to_vec()).collect();
    match verify_trie_proof(state_root, &key, &nodes)? {
        TrieOutcome::Value(rlp) => Ok(decode_account(&rlp)?),
        TrieOutcome::Absent => Err(VerifyError::BadProof {
            reason: "account proof establishes absence, but a value was expected".into(),
        }),
    }
}

/// Walk a single storage slot's proof against an account's `storage_root`.
pub fn verify_storage_value(
    storage_root: &alloy_primitives::B256,
    proof: &StorageProof,
) -> Result<U256, VerifyError> {
    let key = keccak256(proof.key.as_slice());
    let nodes: Vec<Vec<u8>> = proof.proof.iter().map(|b| b.to_vec()).collect();
    match verify_trie_proof(&storage_root.0, &key, &nodes)? {
        TrieOutcome::Value(rlp) => {
            let value = decode_bytes(&rlp)?;
            Ok(U256::from_be_slice(&value))
        }
        TrieOutcome::Absent => Ok(U256::ZERO),
    }
}

pub fn verify_account_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &AccountProofData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    verify_single_leaf(
        &proof.state_root,
        STATE_ROOT_GINDEX,
        &proof.state_root_branch,
        &proof.header.beacon_header.body_root,
    )?;
    verify_proof_header(&proof.header, store, config, bls)?;

    let account = verify_account_state(&proof.state_root, &proof.account_proof)?;

    match method {
        Method::EthGetBalance { address } => {
            if proof.account_proof.address.as_slice() != address {
                return Err(VerifyError::DataMismatch {
                    reason: "requested address does not match the proven account".into(),
                });
            }
            Ok(RpcData::Balance(account.balance))
        }
        Method::EthGetTransactionCount { address } => {
            if proof.account_proof.address.as_slice() != address {
                return Err(VerifyError::DataMismatch {
                    reason: "requested address does not match the proven account".into(),
                });
            }
            Ok(RpcData::TransactionCount(account.nonce))
        }
        Method::EthGetStorageAt { address, slot } => {
            if proof.account_proof.address.as_slice() != address {
                return Err(VerifyError::DataMismatch {
                    reason: "requested address does not match the proven account".into(),
                });
            }
            let storage_proof = proof
                .storage_proofs
                .iter()
                .find(|sp| sp.key.as_slice() == slot)
                .ok_or_else(|| VerifyError::DataMismatch {
                    reason: "no storage proof supplied for the requested slot".into(),
                })?;
            let value = verify_storage_value(&account.storage_root, storage_proof)?;
            Ok(RpcData::StorageValue(alloy_primitives::B256::from(
                value.to_be_bytes::<32>(),
            )))
        }
        other => Err(VerifyError::MethodNotProofable {
            reason: format!("{other:?} cannot be substantiated by an account proof"),
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
    use alloy_primitives::{Address, Bytes};
    use alloy_rlp::Encodable;

    fn rlp_list(items: Vec<Vec<u8>>) -> Vec<u8> {
        let payload: Vec<u8> = items.iter().flat_map(|i| {
            let mut out = Vec::new();
            i.as_slice().encode(&mut out);
            out
        }).collect();
        let mut out = Vec::new();
        alloy_rlp::Header { list: true, payload_length: payload.len() }.encode(&mut out);
        out.extend_from_slice(&payload);
        out
    }

    fn leaf_for(address: Address, account_rlp: Vec<u8>) -> (Vec<u8>, [u8; 32]) {
        let key = keccak256(address.as_slice());
        let mut nibbles = Vec::with_capacity(64);
        for b in key {
            nibbles.push(b >> 4);
            nibbles.push(b & 0xF);
        }
        let mut compact = vec![0x20u8];
        for pair in nibbles.chunks(2) {
            compact.push((pair[0] << 4) | pair[1]);
        }
        let node = rlp_list(vec![compact, account_rlp]);
        let root = keccak256(&node);
        (node, root)
    }

    fn committee() -> SyncCommittee {
        SyncCommittee {
            pubkeys: (0..512).map(|_| BlsPublicKey::Compressed([2u8; 48])).collect(),
            aggregate_pubkey: BlsPublicKey::Compressed([2u8; 48]),
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

    fn rlp_uint(v: u64) -> Vec<u8> {
        if v == 0 {
            return vec![0x80];
        }
        let be = v.to_be_bytes();
        let start = be.iter().position(|&b| b != 0).unwrap();
        let bytes = &be[start..];
        let mut out = Vec::new();
        bytes.encode(&mut out);
        out
    }

    #[test]
    fn resolves_balance_for_requested_address() {
        let address = Address::repeat_byte(0x11);
        let account_rlp = rlp_list(vec![
            rlp_uint(3),
            rlp_uint(500),
            vec![0x80],
            vec![0x80],
        ]);
        let (node, state_root) = leaf_for(address, account_rlp);

        let branch = vec![[0x55u8; 32]; 9];
        let body_root = forward_root(state_root, STATE_ROOT_GINDEX, &branch);

        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let proof = AccountProofData {
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
            state_root,
            state_root_branch: branch,
            account_proof: AccountProof {
                address,
                proof: vec![Bytes::from(node)],
            },
            storage_proofs: vec![],
        };

        let method = Method::EthGetBalance { address: address.into_array() };
        let result = verify_account_proof(&proof, &method, &store, &config, &AlwaysValid).unwrap();
        assert!(matches!(result, RpcData::Balance(b) if b == U256::from(500u64)));
    }
}
