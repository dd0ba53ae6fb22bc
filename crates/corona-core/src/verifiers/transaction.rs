//! Transaction proof verifier (`spec.md` §4.8): a multi-leaf SSZ branch
//! binding `{blockHash, blockNumber, baseFeePerGas, transactions[i]}`
//! together into one beacon header, plus an RLP decode of the raw
//! transaction cross-checked against the prover's claim.
//!
//! `from` and `hash` for signed envelopes require ECDSA recovery, out of
//! scope here (see `codec::execution::DecodedTx`), so the claimed `TxData`
//! carrying those is taken as an explicit input and cross-checked against
//! everything the raw bytes themselves do establish.

use crate::codec::execution::{decode_transaction, transaction_hash};
use crate::codec::ssz::{hash_tree_root_transaction_bytes, uint64_to_leaf};
use crate::config::VerifierConfig;
use crate::consensus::gindex::{
    transaction_combined_gindex, BASE_FEE_PER_GAS_GINDEX, BLOCK_HASH_GINDEX, BLOCK_NUMBER_GINDEX,
};
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::merkle::{verify_multi_leaf, IndexedLeaf};
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::types::execution::TxData;
use crate::types::proof::{RpcData, TransactionProofData};
use crate::types::request::Method;

use super::common::verify_proof_header;

pub fn verify_transaction_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &TransactionProofData,
    claimed: &TxData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    let leaves = [
        IndexedLeaf {
            gindex: BLOCK_HASH_GINDEX,
            leaf: proof.block_hash,
        },
        IndexedLeaf {
            gindex: BLOCK_NUMBER_GINDEX,
            leaf: uint64_to_leaf(proof.block_number),
        },
        IndexedLeaf {
            gindex: BASE_FEE_PER_GAS_GINDEX,
            leaf: proof.base_fee_per_gas,
        },
        IndexedLeaf {
            gindex: transaction_combined_gindex(proof.transaction_index),
            leaf: hash_tree_root_transaction_bytes(&proof.raw_transaction),
        },
    ];
    verify_multi_leaf(&leaves, &proof.multi_branch, &proof.header.beacon_header.body_root)?;
    verify_proof_header(&proof.header, store, config, bls)?;

    let decoded = decode_transaction(&proof.raw_transaction)?;
    if !decoded.matches_claim(claimed) {
        return Err(VerifyError::DataMismatch {
            reason: "claimed transaction fields do not match the raw transaction bytes".into(),
        });
    }
    if transaction_hash(&proof.raw_transaction) != claimed.hash() {
        return Err(VerifyError::DataMismatch {
            reason: "claimed transaction hash does not match the raw transaction bytes".into(),
        });
    }

    match method {
        Method::EthGetTransactionByHash { hash } => {
            if claimed.hash().as_slice() != hash {
                return Err(VerifyError::DataMismatch {
                    reason: "requested hash does not match the proven transaction".into(),
                });
            }
            Ok(RpcData::Transaction(Box::new(claimed.clone())))
        }
        other => Err(VerifyError::MethodNotProofable {
            reason: format!("{other:?} cannot be substantiated by a transaction proof"),
        }),
    }
}
