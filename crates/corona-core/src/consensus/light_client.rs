//! C5: the light-client update handler. Generalizes the teacher's
//! `process_light_client_update`/`initialize_from_bootstrap` (which mutate
//! an in-memory `LightClientState`) to operate against the persistent
//! `SyncCommitteeStore` (C4) instead, since this crate has no long-lived
//! client object of its own — every verification call rehydrates whatever
//! state it needs from the store.

use thiserror::Error;

use super::gindex;
use super::signing::{compute_domain, compute_signing_root, BlsVerifier, SigningError};
use crate::codec::ssz::{hash_tree_root_beacon_header, hash_tree_root_sync_committee};
use crate::config::VerifierConfig;
use crate::merkle::{verify_single_leaf, MerkleError};
use crate::store::{hash_committee_pubkeys, CommitteeLookup, StoreError, SyncCommitteeStore};
use crate::storage::StoragePlugin;
use crate::types::beacon::{
    epoch_at_slot, period_at_slot, BeaconBlockHeader, LightClientBootstrap, LightClientUpdate,
    SyncAggregate, SyncCommittee, MIN_SYNC_COMMITTEE_PARTICIPANTS, SLOTS_PER_SYNC_COMMITTEE_PERIOD,
};
use crate::types::request::ChainId;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("sync committee participation {got} below required {required}")]
    InsufficientParticipation { got: usize, required: usize },
    #[error("finality branch does not verify under the attested header's state root")]
    InvalidFinalityBranch,
    #[error("next-sync-committee branch does not verify under the attested header's state root")]
    InvalidNextSyncCommitteeBranch,
    #[error("sync committee missing for period(s) {first_missing_period}..={last_missing_period}")]
    CommitteeMissing {
        first_missing_period: u64,
        last_missing_period: u64,
    },
    #[error("chain state is not a pending checkpoint")]
    NotCheckpoint,
    #[error("bootstrap header root does not match the pending checkpoint")]
    BootstrapHeaderMismatch,
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of resolving which committee should verify a header at a given
/// slot: either a committee ready to use, or the period range the store
/// still needs (`spec.md` §7's `CommitteeMissing`).
pub enum CommitteeOutcome {
    Ready(SyncCommittee),
    Missing { first_missing_period: u64, last_missing_period: u64 },
}

/// Resolve the committee that should have signed a header at `slot`
/// (`spec.md` §4.5 rule 4): the committee stored for `slot`'s own period,
/// or — only at the first slot of a period, when that period's committee
/// hasn't arrived yet — the predecessor period's committee (`spec.md`
/// property P5).
///
/// The predecessor is only trusted as a stand-in when its own
/// `previous_pubkeys_hash` is consistent with whatever we independently
/// know about the period before *it* (period - 2), when that's on hand;
/// with nothing to contradict it, or no predecessor data at all to check
/// against, the fallback is allowed through.
pub fn resolve_signing_committee<S: StoragePlugin>(
    store: &SyncCommitteeStore<S>,
    chain: ChainId,
    slot: u64,
) -> Result<CommitteeOutcome, StoreError> {
    let period = period_at_slot(slot);
    if let CommitteeLookup::Found(record) = store.get_validators(chain, period)? {
        return Ok(CommitteeOutcome::Ready(record.committee));
    }

    if slot % SLOTS_PER_SYNC_COMMITTEE_PERIOD == 0 && period > 0 {
        if let CommitteeLookup::Found(prev) = store.get_validators(chain, period - 1)? {
            let fallback_ok = match prev.previous_pubkeys_hash {
                None => true,
                Some(expected) if period >= 2 => match store.get_validators(chain, period - 2)? {
                    CommitteeLookup::Found(grandparent) => {
                        hash_committee_pubkeys(&grandparent.committee) == Ok(expected)
                    }
                    CommitteeLookup::Missing => true,
                },
                Some(_) => true,
            };
            if fallback_ok {
                return Ok(CommitteeOutcome::Ready(prev.committee));
            }
        }
    }

    Ok(CommitteeOutcome::Missing {
        first_missing_period: period,
        last_missing_period: period,
    })
}

/// Verify a header's aggregate signature against whichever committee
/// `resolve_signing_committee` resolves for its slot (`spec.md` §4.6,
/// composed with the committee lookup of §4.5 rule 4).
pub fn verify_header_signature<S: StoragePlugin, B: BlsVerifier>(
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
    header: &BeaconBlockHeader,
    sync_aggregate: &SyncAggregate,
) -> Result<(), UpdateError> {
    let num_participants = sync_aggregate.num_participants();
    if num_participants < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(UpdateError::InsufficientParticipation {
            got: num_participants,
            required: MIN_SYNC_COMMITTEE_PARTICIPANTS,
        });
    }

    let committee = match resolve_signing_committee(store, config.chain, header.slot)? {
        CommitteeOutcome::Ready(committee) => committee,
        CommitteeOutcome::Missing {
            first_missing_period,
            last_missing_period,
        } => {
            return Err(UpdateError::CommitteeMissing {
                first_missing_period,
                last_missing_period,
            })
        }
    };

    let participants: Vec<&crate::types::beacon::BlsPublicKey> = sync_aggregate
        .participant_indices()
        .into_iter()
        .filter_map(|i| committee.pubkeys.get(i))
        .collect();

    let fork_version = config.fork_schedule.fork_version_at_slot(header.slot);
    let domain = compute_domain(fork_version, config.genesis_validators_root);
    let signing_root = compute_signing_root(header, domain);

    bls.verify_aggregate(&participants, &signing_root, &sync_aggregate.sync_committee_signature)?;
    Ok(())
}

/// Process a single light-client update against the store, applying the
/// five acceptance rules of `spec.md` §4.5 in order.
pub fn process_update<S: StoragePlugin, B: BlsVerifier>(
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
    update: &LightClientUpdate,
) -> Result<(), UpdateError> {
    let num_participants = update.sync_aggregate.num_participants();
    if num_participants < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(UpdateError::InsufficientParticipation {
            got: num_participants,
            required: MIN_SYNC_COMMITTEE_PARTICIPANTS,
        });
    }

    let is_electra = config
        .fork_schedule
        .is_electra_or_later(epoch_at_slot(update.attested_header.slot));

    let finalized_root = hash_tree_root_beacon_header(&update.finalized_header);
    verify_single_leaf(
        &finalized_root,
        gindex::finalized_root_gindex(is_electra),
        &update.finality_branch,
        &update.attested_header.state_root,
    )
    .map_err(|_| UpdateError::InvalidFinalityBranch)?;

    if let Some(next_committee) = &update.next_sync_committee {
        let committee_root = hash_tree_root_sync_committee(next_committee);
        verify_single_leaf(
            &committee_root,
            gindex::sync_committee_gindex(is_electra),
            &update.next_sync_committee_branch,
            &update.attested_header.state_root,
        )
        .map_err(|_| UpdateError::InvalidNextSyncCommitteeBranch)?;
    }

    let signing_committee = match resolve_signing_committee(store, config.chain, update.attested_header.slot)? {
        CommitteeOutcome::Ready(committee) => committee,
        CommitteeOutcome::Missing {
            first_missing_period,
            last_missing_period,
        } => {
            return Err(UpdateError::CommitteeMissing {
                first_missing_period,
                last_missing_period,
            })
        }
    };

    let participants: Vec<&crate::types::beacon::BlsPublicKey> = update
        .sync_aggregate
        .participant_indices()
        .into_iter()
        .filter_map(|i| signing_committee.pubkeys.get(i))
        .collect();
    let fork_version = config.fork_schedule.fork_version_at_slot(update.attested_header.slot);
    let domain = compute_domain(fork_version, config.genesis_validators_root);
    let signing_root = compute_signing_root(&update.attested_header, domain);
    bls.verify_aggregate(
        &participants,
        &signing_root,
        &update.sync_aggregate.sync_committee_signature,
    )?;

    if let Some(next_committee) = &update.next_sync_committee {
        let previous_pubkeys_hash = hash_committee_pubkeys(&signing_committee).ok();
        let next_period = period_at_slot(update.finalized_header.slot) + 1;
        store.put_validators(config.chain, next_period, next_committee.clone(), previous_pubkeys_hash)?;
    }

    Ok(())
}

/// Outcome of processing a batch of updates in ascending period order
/// (`spec.md` §4.5): how many were accepted, and the combined missing
/// period range across every update that couldn't proceed for lack of
/// committee data.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub accepted: usize,
    pub missing: Option<(u64, u64)>,
}

/// Process a batch of updates, sorted ascending by attested slot, per
/// `spec.md` §4.5. A hard failure (bad branch, bad signature, insufficient
/// participation) aborts the whole batch immediately; a missing committee
/// is soft — later updates in the batch are still attempted, and every
/// missing range encountered is folded into the returned pair.
pub fn process_updates<S: StoragePlugin, B: BlsVerifier>(
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bls: &B,
    updates: &[LightClientUpdate],
) -> Result<BatchOutcome, UpdateError> {
    let mut ordered: Vec<&LightClientUpdate> = updates.iter().collect();
    ordered.sort_by_key(|u| u.attested_header.slot);

    let mut outcome = BatchOutcome::default();
    for update in ordered {
        match process_update(store, config, bls, update) {
            Ok(()) => outcome.accepted += 1,
            Err(UpdateError::CommitteeMissing {
                first_missing_period,
                last_missing_period,
            }) => {
                outcome.missing = Some(match outcome.missing {
                    Some((first, last)) => (first.min(first_missing_period), last.max(last_missing_period)),
                    None => (first_missing_period, last_missing_period),
                });
            }
            Err(other) => return Err(other),
        }
    }
    Ok(outcome)
}

/// Accept a bootstrap object against a pending `CHECKPOINT(h)` chain
/// state (`spec.md` §4.5's bootstrap path / §6).
pub fn process_bootstrap<S: StoragePlugin>(
    store: &SyncCommitteeStore<S>,
    config: &VerifierConfig,
    bootstrap: &LightClientBootstrap,
) -> Result<(), UpdateError> {
    use crate::store::ChainState;

    match store.chain_state(config.chain)? {
        ChainState::Checkpoint(expected_root) => {
            if expected_root != bootstrap.header_root {
                return Err(UpdateError::BootstrapHeaderMismatch);
            }
        }
        ChainState::Empty | ChainState::Periods(_) => return Err(UpdateError::NotCheckpoint),
    }

    if hash_tree_root_beacon_header(&bootstrap.header) != bootstrap.header_root {
        return Err(UpdateError::BootstrapHeaderMismatch);
    }

    let is_electra = config
        .fork_schedule
        .is_electra_or_later(epoch_at_slot(bootstrap.header.slot));
    let committee_root = hash_tree_root_sync_committee(&bootstrap.current_sync_committee);
    verify_single_leaf(
        &committee_root,
        gindex::sync_committee_gindex(is_electra),
        &bootstrap.current_sync_committee_branch,
        &bootstrap.header.state_root,
    )
    .map_err(|_| UpdateError::InvalidNextSyncCommitteeBranch)?;

    let period = period_at_slot(bootstrap.header.slot);
    store.put_validators(config.chain, period, bootstrap.current_sync_committee.clone(), None)?;
    Ok(())
}
