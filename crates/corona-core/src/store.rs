//! C4: the sync-committee store. A keyed persistent mapping from
//! (chain, period) to committee record, backed by a pluggable
//! `StoragePlugin`, plus the chain-state blob (`EMPTY` / `CHECKPOINT` /
//! `PERIODS`) that tracks which periods are on hand.

use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::ssz::sha256;
use crate::storage::{StorageError, StoragePlugin};
use crate::types::beacon::{BlsPublicKey, CommitteeRecord, SyncCommittee};
use crate::types::request::ChainId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Storage(#[from] StorageError),
    #[error("stored chain-state blob is malformed")]
    CorruptChainState,
    #[error("stored committee record for period {period} is malformed")]
    CorruptCommitteeRecord { period: u64 },
}

/// The persisted chain-state tag, round-tripped through a 1-byte
/// discriminant plus variant-specific payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainState {
    Empty,
    Checkpoint([u8; 32]),
    Periods(Vec<u64>),
}

impl ChainState {
    const TAG_EMPTY: u8 = 0;
    const TAG_CHECKPOINT: u8 = 1;
    const TAG_PERIODS: u8 = 2;

    fn encode(&self) -> Vec<u8> {
        match self {
            ChainState::Empty => vec![Self::TAG_EMPTY],
            ChainState::Checkpoint(root) => {
                let mut out = vec![Self::TAG_CHECKPOINT];
                out.extend_from_slice(root);
                out
            }
            ChainState::Periods(periods) => {
                let mut out = vec![Self::TAG_PERIODS];
                for p in periods {
                    out.extend_from_slice(&p.to_le_bytes());
                }
                out
            }
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        match bytes.first() {
            Some(&Self::TAG_EMPTY) => Ok(ChainState::Empty),
            Some(&Self::TAG_CHECKPOINT) if bytes.len() == 33 => {
                let mut root = [0u8; 32];
                root.copy_from_slice(&bytes[1..33]);
                Ok(ChainState::Checkpoint(root))
            }
            Some(&Self::TAG_PERIODS) if (bytes.len() - 1) % 8 == 0 => {
                let periods = bytes[1..]
                    .chunks_exact(8)
                    .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                Ok(ChainState::Periods(periods))
            }
            _ => Err(StoreError::CorruptChainState),
        }
    }
}

/// Lookup outcome for a requested period's committee.
#[derive(Debug, Clone)]
pub enum CommitteeLookup {
    Found(CommitteeRecord),
    Missing,
}

fn state_key(chain: ChainId) -> String {
    format!("states_{}", chain.0)
}

fn committee_key(chain: ChainId, period: u64) -> String {
    format!("sync_{}_{period}", chain.0)
}

/// Encode a committee record (512 pubkeys + aggregate + optional previous
/// hash) for storage: each pubkey compressed to 48 bytes, 1 tag byte for
/// `previous_pubkeys_hash` presence, then 32 bytes if present.
fn encode_committee(record: &CommitteeRecord) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::with_capacity(512 * 48 + 48 + 33);
    for pk in &record.committee.pubkeys {
        let bytes = pk
            .to_compressed_bytes()
            .map_err(|_| StoreError::CorruptCommitteeRecord { period: 0 })?;
        out.extend_from_slice(&bytes);
    }
    let agg = record
        .committee
        .aggregate_pubkey
        .to_compressed_bytes()
        .map_err(|_| StoreError::CorruptCommitteeRecord { period: 0 })?;
    out.extend_from_slice(&agg);
    match record.previous_pubkeys_hash {
        Some(hash) => {
            out.push(1);
            out.extend_from_slice(&hash);
        }
        None => out.push(0),
    }
    Ok(out)
}

fn decode_committee(bytes: &[u8], period: u64) -> Result<CommitteeRecord, StoreError> {
    const N: usize = crate::types::beacon::SYNC_COMMITTEE_SIZE;
    let expected_min = N * 48 + 48 + 1;
    if bytes.len() < expected_min {
        return Err(StoreError::CorruptCommitteeRecord { period });
    }
    let mut pubkeys = Vec::with_capacity(N);
    for chunk in bytes[..N * 48].chunks_exact(48) {
        pubkeys.push(
            BlsPublicKey::from_compressed(chunk)
                .map_err(|_| StoreError::CorruptCommitteeRecord { period })?,
        );
    }
    let agg_start = N * 48;
    let aggregate_pubkey = BlsPublicKey::from_compressed(&bytes[agg_start..agg_start + 48])
        .map_err(|_| StoreError::CorruptCommitteeRecord { period })?;

    let tag_idx = agg_start + 48;
    let previous_pubkeys_hash = match bytes.get(tag_idx) {
        Some(0) => None,
        Some(1) => {
            if bytes.len() < tag_idx + 33 {
                return Err(StoreError::CorruptCommitteeRecord { period });
            }
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&bytes[tag_idx + 1..tag_idx + 33]);
            Some(hash)
        }
        _ => return Err(StoreError::CorruptCommitteeRecord { period }),
    };

    Ok(CommitteeRecord {
        committee: SyncCommittee {
            pubkeys,
            aggregate_pubkey,
        },
        previous_pubkeys_hash,
    })
}

/// SHA-256 of a committee's concatenated compressed pubkeys — what
/// `previous_pubkeys_hash` commits to.
pub fn hash_committee_pubkeys(committee: &SyncCommittee) -> Result<[u8; 32], &'static str> {
    let mut buf = Vec::with_capacity(committee.pubkeys.len() * 48);
    for pk in &committee.pubkeys {
        buf.extend_from_slice(&pk.to_compressed_bytes()?);
    }
    Ok(sha256(&buf))
}

/// The sync-committee store (C4), generic over any `StoragePlugin`.
pub struct SyncCommitteeStore<S: StoragePlugin> {
    storage: S,
}

impl<S: StoragePlugin> SyncCommitteeStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn chain_state(&self, chain: ChainId) -> Result<ChainState, StoreError> {
        match self.storage.get(&state_key(chain))? {
            Some(bytes) => ChainState::decode(&bytes),
            None => Ok(ChainState::Empty),
        }
    }

    fn set_chain_state(&self, chain: ChainId, state: &ChainState) -> Result<(), StoreError> {
        self.storage.set(&state_key(chain), state.encode())?;
        Ok(())
    }

    pub fn get_validators(
        &self,
        chain: ChainId,
        period: u64,
    ) -> Result<CommitteeLookup, StoreError> {
        match self.storage.get(&committee_key(chain, period))? {
            Some(bytes) => Ok(CommitteeLookup::Found(decode_committee(&bytes, period)?)),
            None => Ok(CommitteeLookup::Missing),
        }
    }

    /// Store a committee for `period`, enforcing the eviction policy when
    /// the period set would otherwise exceed the storage plugin's
    /// `max_sync_states`: preserve the highest (freshest) and lowest
    /// (oldest anchor) period, dropping the second-lowest under pressure.
    ///
    /// Writing to an already-present period is idempotent by value:
    /// identical pubkeys are a no-op, differing pubkeys are rejected
    /// rather than silently overwritten (concurrent-writer semantics of
    /// `spec.md` §5).
    pub fn put_validators(
        &self,
        chain: ChainId,
        period: u64,
        committee: SyncCommittee,
        previous_pubkeys_hash: Option<[u8; 32]>,
    ) -> Result<(), StoreError> {
        if let CommitteeLookup::Found(existing) = self.get_validators(chain, period)? {
            if existing.committee == committee {
                debug!(period, "put_validators: identical committee already stored, no-op");
                return Ok(());
            }
            warn!(period, "put_validators: rejecting differing committee for already-stored period");
            return Ok(());
        }

        let mut periods = match self.chain_state(chain)? {
            ChainState::Empty | ChainState::Checkpoint(_) => Vec::new(),
            ChainState::Periods(p) => p,
        };

        let max = self.storage.max_sync_states();
        if max > 0 {
            periods.sort_unstable();
            while periods.len() >= max {
                // Keep the lowest (oldest anchor) and highest (freshest);
                // drop the second-lowest to make room. With only two
                // periods on hand (or a capacity of one), there is no
                // "second-lowest" to spare, so drop the lower of the two.
                let dropped = if periods.len() >= 3 {
                    periods.remove(1)
                } else {
                    periods.remove(0)
                };
                self.storage.del(&committee_key(chain, dropped))?;
                debug!(dropped_period = dropped, "evicted period to honor storage capacity");
            }
        }

        let record = CommitteeRecord {
            committee,
            previous_pubkeys_hash,
        };
        self.storage
            .set(&committee_key(chain, period), encode_committee(&record)?)?;

        if !periods.contains(&period) {
            periods.push(period);
        }
        self.set_chain_state(chain, &ChainState::Periods(periods))?;
        Ok(())
    }

    pub fn set_checkpoint(&self, chain: ChainId, header_root: [u8; 32]) -> Result<(), StoreError> {
        self.set_chain_state(chain, &ChainState::Checkpoint(header_root))
    }
}
