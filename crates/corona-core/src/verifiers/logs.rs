//! Logs proof verifier (`spec.md` §4.8): substantiates `eth_getLogs` over
//! a block range. A filter can span several execution blocks, so the
//! proof is a sequence of per-block sub-proofs, each independently bound
//! to its own beacon header; every receipt named in a block's sub-proof
//! is decoded and its logs filtered against the request.

use crate::codec::execution::decode_receipt;
use crate::config::VerifierConfig;
use crate::consensus::gindex::RECEIPTS_ROOT_GINDEX;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::merkle::verify_single_leaf;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::trie::{verify_trie_proof, TrieOutcome};
use crate::types::execution::Log;
use crate::types::proof::{LogsBlockProof, LogsProofData, RpcData};
use crate::types::request::{LogFilter, Method};

use super::common::verify_proof_header;

fn receipt_trie_key(tx_index: u64) -> Vec<u8> {
    crate::codec::rlp::encode_uint64(tx_index)
}

fn verify_block(
    block: &LogsBlockProof,
    filter: &LogFilter,
) -> Result<Vec<Log>, VerifyError> {
    verify_single_leaf(
        &block.receipts_root,
        RECEIPTS_ROOT_GINDEX,
        &block.receipts_root_branch,
        &block.header.beacon_header.body_root,
    )?;

    if block.block_number < filter.from_block || block.block_number > filter.to_block {
        return Err(VerifyError::DataMismatch {
            reason: "block number in logs proof falls outside the requested range".into(),
        });
    }

    let addresses: Vec<alloy_primitives::Address> =
        filter.addresses.iter().map(|a| alloy_primitives::Address::from(*a)).collect();
    let topics: Vec<Vec<alloy_primitives::B256>> = filter
        .topics
        .iter()
        .map(|position| position.iter().map(|t| alloy_primitives::B256::from(*t)).collect())
        .collect();

    let mut matched = Vec::new();
    for receipt_proof in &block.receipt_proofs {
        let key = receipt_trie_key(receipt_proof.tx_index);
        let nodes: Vec<Vec<u8>> = receipt_proof.proof.iter().map(|b| b.to_vec()).collect();
        let receipt = match verify_trie_proof(&block.receipts_root, &key, &nodes)? {
            TrieOutcome::Value(rlp) => decode_receipt(&rlp)?,
            TrieOutcome::Absent => continue,
        };
        for log in receipt.logs {
            if log.matches_filter(&addresses, &topics) {
                matched.push(log);
            }
        }
    }
    Ok(matched)
}

pub fn verify_logs_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &LogsProofData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    let filter = match method {
        Method::EthGetLogs { filter } => filter,
        other => {
            return Err(VerifyError::MethodNotProofable {
                reason: format!("{other:?} cannot be substantiated by a logs proof"),
            })
        }
    };

    let mut logs = Vec::new();
    for block in &proof.blocks {
        verify_proof_header(&block.header, store, config, bls)?;
        logs.extend(verify_block(block, filter)?);
    }
    Ok(RpcData::Logs(logs))
}
