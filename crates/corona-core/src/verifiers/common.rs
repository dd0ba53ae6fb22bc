//! Shared plumbing every per-proof verifier (C8) in this module uses: the
//! "verify the header's aggregate signature" step every proof kind ends
//! with (`spec.md` §4.8 step 4), factored out once instead of repeated in
//! each `verifiers::*` file.

use tracing::{debug, warn};

use crate::config::VerifierConfig;
use crate::consensus::light_client::verify_header_signature;
use crate::consensus::signing::BlsVerifier;
use crate::error::VerifyError;
use crate::storage::StoragePlugin;
use crate::store::SyncCommitteeStore;
use crate::types::beacon::BeaconBlockHeader;
use crate::types::proof::ProofHeader;

/// Verify a proof's beacon header against the committee for its slot
/// (`spec.md` §4.8 step 4, composing C5's committee resolution with C6's
/// BLS check). Every per-proof verifier calls this exactly once, after
/// its own Merkle/Patricia checks, per the verifier shape `spec.md` §4.8
/// lays out.
pub fn verify_proof_header<S: StoragePlugin, B: BlsVerifier>(
    header: &ProofHeader,
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
) -> Result<(), VerifyError> {
    debug!(slot = header.beacon_header.slot, "verifying proof header signature");
    verify_header_signature(store, config, bls, &header.beacon_header, &header.sync_aggregate)
        .map_err(|e| {
            warn!(slot = header.beacon_header.slot, error = %e, "proof header signature check failed");
            e
        })?;
    Ok(())
}

/// Sanity-check that two headers embedded in the same proof agree, used
/// where a proof carries more than one `ProofHeader` (the call-proof
/// verifier's nested account proofs) and they must all describe the same
/// block.
pub fn headers_agree(a: &BeaconBlockHeader, b: &BeaconBlockHeader) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::signing::test_support::AlwaysValid;
    use crate::storage::InMemoryStorage;
    use crate::types::beacon::{BlsPublicKey, BlsSignature, SyncAggregate, SyncCommittee};

    fn committee() -> SyncCommittee {
        SyncCommittee {
            pubkeys: (0..512).map(|_| BlsPublicKey::Compressed([1u8; 48])).collect(),
            aggregate_pubkey: BlsPublicKey::Compressed([1u8; 48]),
        }
    }

    #[test]
    fn verify_proof_header_delegates_to_signing() {
        let store = SyncCommitteeStore::new(InMemoryStorage::with_capacity(8));
        let config = VerifierConfig::mainnet([0; 32]);
        store.put_validators(config.chain, 0, committee(), None).unwrap();

        let header = ProofHeader {
            beacon_header: BeaconBlockHeader {
                slot: 10,
                proposer_index: 0,
                parent_root: [0; 32],
                state_root: [0; 32],
                body_root: [0; 32],
            },
            sync_aggregate: SyncAggregate::from_raw(vec![0xFF; 64], BlsSignature([0; 96])).unwrap(),
            execution_branch: vec![],
        };

        assert!(verify_proof_header(&header, &store, &config, &AlwaysValid).is_ok());
    }

    #[test]
    fn headers_agree_detects_mismatch() {
        let h1 = BeaconBlockHeader {
            slot: 1,
            proposer_index: 0,
            parent_root: [0; 32],
            state_root: [0; 32],
            body_root: [0; 32],
        };
        let mut h2 = h1.clone();
        h2.slot = 2;
        assert!(headers_agree(&h1, &h1));
        assert!(!headers_agree(&h1, &h2));
    }
}
