//! Sync proof verifier (`spec.md` §4.8): the thin verifier wrapper around
//! C5's light-client update processing, applied to a batch of updates
//! carried directly in the proof rather than pulled from the store.

use crate::config::VerifierConfig;
use crate::consensus::light_client::process_updates;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::types::beacon::period_at_slot;
use crate::types::proof::{RpcData, SyncProofData};
use crate::types::request::Method;

pub fn verify_sync_proof<S: StoragePlugin, B: BlsVerifier>(
    proof: &SyncProofData,
    method: &Method,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<RpcData, VerifyError> {
    if !matches!(method, Method::LightClientSync) {
        return Err(VerifyError::MethodNotProofable {
            reason: format!("{method:?} cannot be substantiated by a sync proof"),
        });
    }

    let outcome = process_updates(store, config, bls, &proof.updates)?;
    if let Some((first, last)) = outcome.missing {
        return Err(VerifyError::CommitteeMissing {
            first_missing_period: first,
            last_missing_period: last,
        });
    }

    let latest_period = proof
        .updates
        .iter()
        .map(|u| period_at_slot(u.finalized_header.slot))
        .max()
        .ok_or_else(|| VerifyError::BadFormat {
            reason: "sync proof carries no updates".into(),
        })?;

    Ok(RpcData::SyncPeriod(latest_period))
}
