//! Call proof verifier (`spec.md` §4.8): substantiates `eth_call` by
//! proving every account the EVM touches against one `stateRoot`, then
//! replaying the call against an externally supplied `EvmHost` seeded
//! from those proven accounts. The EVM itself is an out-of-scope
//! collaborator (`spec.md` §1) — this module only wires proven state
//! into whatever `EvmHost` the embedder provides and checks the output
//! the prover claimed against what that host actually returns.

use alloy_primitives::{Address, U256};

use crate::config::VerifierConfig;
use crate::consensus::gindex::STATE_ROOT_GINDEX;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::evm::EvmHost;
use crate::merkle::verify_single_leaf;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::types::proof::{CallProofData, RpcData};
use crate::types::request::Method;

use super::account::verify_account_state;
use super::common::{headers_agree, verify_proof_header};

pub fn verify_call_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &CallProofData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
    host: &mut dyn EvmHost,
) -> Result<RpcData, VerifyError> {
    let (call_to, call_data) = match method {
        Method::EthCall { to, data } => (to, data),
        other => {
            return Err(VerifyError::MethodNotProofable {
                reason: format!("{other:?} cannot be substantiated by a call proof"),
            })
        }
    };

    let state_root = proof
        .accounts
        .first()
        .map(|a| a.state_root)
        .ok_or_else(|| VerifyError::BadProof {
            reason: "call proof supplies no account proofs to verify against".into(),
        })?;
    if proof.accounts.iter().any(|a| a.state_root != state_root) {
        return Err(VerifyError::DataMismatch {
            reason: "nested account proofs disagree on the execution state root".into(),
        });
    }

    verify_single_leaf(
        &state_root,
        STATE_ROOT_GINDEX,
        &proof.state_root_branch,
        &proof.header.beacon_header.body_root,
    )?;
    verify_proof_header(&proof.header, store, config, bls)?;

    for account_proof in &proof.accounts {
        if !headers_agree(&account_proof.header.beacon_header, &proof.header.beacon_header) {
            return Err(VerifyError::DataMismatch {
                reason: "nested account proof header disagrees with the call proof header".into(),
            });
        }
        verify_account_state(&state_root, &account_proof.account_proof)?;
        if !host.access_account(&account_proof.account_proof.address) {
            return Err(VerifyError::DataMismatch {
                reason: "EVM host touched an account with no accompanying proof".into(),
            });
        }
    }

    if *call_to != proof.call_to.into_array() {
        return Err(VerifyError::DataMismatch {
            reason: "requested call target does not match the proven call target".into(),
        });
    }
    if call_data.as_slice() != proof.call_data.as_ref() {
        return Err(VerifyError::DataMismatch {
            reason: "requested call data does not match the proven call data".into(),
        });
    }

    let output = host
        .call(&proof.call_to, call_data, U256::ZERO, u64::MAX)
        .map_err(|reason| VerifyError::DataMismatch { reason })?;

    if output.as_ref() != proof.call_output.as_ref() {
        return Err(VerifyError::DataMismatch {
            reason: "EVM replay output does not match the prover's claimed call output".into(),
        });
    }

    Ok(RpcData::CallResult(output))
}
