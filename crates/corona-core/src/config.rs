//! Verifier configuration: the chain being verified against, its fork
//! schedule, and the storage capacity bound. Generalizes the hard-coded
//! mainnet constants the teacher's WASM shell inlined directly into its
//! `verify` entry point into an explicit object the core is constructed
//! with, since non-mainnet chains need their own fork versions and
//! genesis validators root.

use crate::types::beacon::epoch_at_slot;
use crate::types::request::ChainId;

/// One entry in a fork schedule: the fork version active from
/// `activation_epoch` onward, until the next entry's epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkEntry {
    pub activation_epoch: u64,
    pub version: [u8; 4],
}

/// An ordered table mapping epoch to BLS signing-domain fork version.
/// Entries must be sorted ascending by `activation_epoch`; the active
/// entry for a given epoch is the last one whose `activation_epoch` does
/// not exceed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkSchedule {
    entries: Vec<ForkEntry>,
}

impl ForkSchedule {
    /// Build a schedule from entries, sorting them by activation epoch.
    /// Panics if `entries` is empty — a schedule needs at least a genesis
    /// fork version to resolve any epoch at all.
    pub fn new(mut entries: Vec<ForkEntry>) -> Self {
        assert!(!entries.is_empty(), "fork schedule must have at least one entry");
        entries.sort_by_key(|e| e.activation_epoch);
        Self { entries }
    }

    /// Ethereum mainnet's Bellatrix → Capella → Deneb → Electra boundaries.
    pub fn mainnet() -> Self {
        Self::new(vec![
            ForkEntry {
                activation_epoch: 144_896,
                version: [0x02, 0x00, 0x00, 0x00],
            },
            ForkEntry {
                activation_epoch: 194_048,
                version: [0x03, 0x00, 0x00, 0x00],
            },
            ForkEntry {
                activation_epoch: 269_568,
                version: [0x04, 0x00, 0x00, 0x00],
            },
            ForkEntry {
                activation_epoch: 364_032,
                version: [0x05, 0x00, 0x00, 0x00],
            },
        ])
    }

    /// The fork version active at `epoch`.
    pub fn fork_version(&self, epoch: u64) -> [u8; 4] {
        self.entries
            .iter()
            .rev()
            .find(|e| e.activation_epoch <= epoch)
            .map(|e| e.version)
            .unwrap_or(self.entries[0].version)
    }

    /// The fork version active for the epoch containing `slot`.
    pub fn fork_version_at_slot(&self, slot: u64) -> [u8; 4] {
        self.fork_version(epoch_at_slot(slot))
    }

    /// Whether `epoch` falls in or after the Electra fork (generalized
    /// index 86 for the next-sync-committee branch applies from here on;
    /// earlier forks use 54 — see `consensus::light_client`). Compares the
    /// active entry's fork *version* against Electra's, not its position
    /// in the schedule — a schedule's entry count varies per chain (a
    /// testnet may have fewer pre-Electra forks than mainnet), so indexing
    /// by position picks the wrong gindex on any non-mainnet schedule.
    pub fn is_electra_or_later(&self, epoch: u64) -> bool {
        self.fork_version(epoch) >= ELECTRA_FORK_VERSION
    }
}

/// The fork version Electra activates at. Fork versions increase
/// monotonically with fork order (mainnet: 0x02 Bellatrix, 0x03 Capella,
/// 0x04 Deneb, 0x05 Electra); any `ForkSchedule` must follow the same
/// convention for `is_electra_or_later` to resolve correctly.
const ELECTRA_FORK_VERSION: [u8; 4] = [0x05, 0x00, 0x00, 0x00];

/// Top-level configuration threaded into the store and driver. Constructed
/// once by the embedder per chain. The sync-state capacity bound lives on
/// the `StoragePlugin` itself (`StoragePlugin::max_sync_states`), not here
/// — it's a property of the storage backend the embedder chose, not of the
/// chain being verified.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    pub chain: ChainId,
    pub fork_schedule: ForkSchedule,
    pub genesis_validators_root: [u8; 32],
}

impl VerifierConfig {
    pub fn mainnet(genesis_validators_root: [u8; 32]) -> Self {
        Self {
            chain: ChainId::ETHEREUM,
            fork_schedule: ForkSchedule::mainnet(),
            genesis_validators_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_version_resolves_each_era() {
        let schedule = ForkSchedule::mainnet();
        assert_eq!(schedule.fork_version(0), [0x02, 0, 0, 0]);
        assert_eq!(schedule.fork_version(144_896), [0x02, 0, 0, 0]);
        assert_eq!(schedule.fork_version(194_048), [0x03, 0, 0, 0]);
        assert_eq!(schedule.fork_version(269_568), [0x04, 0, 0, 0]);
        assert_eq!(schedule.fork_version(500_000), [0x05, 0, 0, 0]);
    }

    #[test]
    fn electra_detection_matches_boundary() {
        let schedule = ForkSchedule::mainnet();
        assert!(!schedule.is_electra_or_later(269_568));
        assert!(schedule.is_electra_or_later(364_032));
    }

    #[test]
    #[should_panic]
    fn empty_schedule_panics() {
        ForkSchedule::new(vec![]);
    }
}
