//! Beacon-chain types: headers, sync committees, and light-client update
//! containers. These are the SSZ-encoded structures the consensus layer
//! hands to a light client.

use bitvec::order::Lsb0;
use bitvec::vec::BitVec;
use serde::{Deserialize, Serialize};

/// Number of validators in the Ethereum beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed G1 point).
pub const BLS_PUBKEY_COMPRESSED_LEN: usize = 48;

/// Number of bytes in a BLS12-381 public key (uncompressed affine G1 point).
pub const BLS_PUBKEY_AFFINE_LEN: usize = 96;

/// Number of bytes in a BLS12-381 signature (compressed G2 point).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Slots per sync committee period (256 epochs * 32 slots/epoch = 8192).
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = 8192;

/// Slots per epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Domain type for sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Minimum number of sync committee participants required (2/3 of 512).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = 342;

/// Domain separation tag used for BLS12-381 signature verification, per the
/// Ethereum consensus spec (POP = proof-of-possession ciphersuite).
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Compute the sync committee period a slot belongs to.
pub fn period_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_SYNC_COMMITTEE_PERIOD
}

/// Compute the epoch a slot belongs to.
pub fn epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// A BLS12-381 public key. The wire format may be either compressed (48
/// bytes) or the uncompressed affine expansion (96 bytes) — see `spec.md`
/// §9 on "ambiguous source behavior". We keep both representations as
/// variants instead of always expanding eagerly, since expansion touches
/// curve arithmetic and most keys in a stored committee are never used in
/// a particular verification (only the participating subset is).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlsPublicKey {
    Compressed([u8; BLS_PUBKEY_COMPRESSED_LEN]),
    Affine([u8; BLS_PUBKEY_AFFINE_LEN]),
}

impl BlsPublicKey {
    pub fn from_compressed(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_COMPRESSED_LEN {
            return Err("invalid compressed BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_COMPRESSED_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self::Compressed(arr))
    }

    pub fn from_affine(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_AFFINE_LEN {
            return Err("invalid affine BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_AFFINE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self::Affine(arr))
    }

    /// Lazily expand to the 96-byte uncompressed affine form, deserializing
    /// through `blst` when the stored encoding is compressed. Callers that
    /// need to verify many signatures against the same committee should
    /// call this once per key and cache the result (the store does, via
    /// `rehydrate`).
    pub fn to_affine_bytes(&self) -> Result<[u8; BLS_PUBKEY_AFFINE_LEN], &'static str> {
        match self {
            BlsPublicKey::Affine(bytes) => Ok(*bytes),
            BlsPublicKey::Compressed(bytes) => {
                let pk = blst::min_pk::PublicKey::from_bytes(bytes)
                    .map_err(|_| "failed to deserialize compressed BLS public key")?;
                Ok(pk.serialize())
            }
        }
    }

    /// Compressed 48-byte encoding, compressing a cached affine key if
    /// that's what's stored.
    pub fn to_compressed_bytes(&self) -> Result<[u8; BLS_PUBKEY_COMPRESSED_LEN], &'static str> {
        match self {
            BlsPublicKey::Compressed(bytes) => Ok(*bytes),
            BlsPublicKey::Affine(bytes) => {
                let pk = blst::min_pk::PublicKey::from_bytes(bytes)
                    .map_err(|_| "failed to deserialize affine BLS public key")?;
                Ok(pk.compress())
            }
        }
    }

    /// Deserialize into a `blst` public key for signature verification,
    /// accepting either wire encoding (blst's deserializer reads the
    /// compression flag bits and handles both transparently).
    pub fn to_blst(&self) -> Result<blst::min_pk::PublicKey, &'static str> {
        blst::min_pk::PublicKey::from_bytes(self.as_stored_bytes())
            .map_err(|_| "failed to deserialize BLS public key")
    }

    /// Bytes as stored on the wire (either 48 or 96 long).
    pub fn as_stored_bytes(&self) -> &[u8] {
        match self {
            BlsPublicKey::Compressed(b) => b,
            BlsPublicKey::Affine(b) => b,
        }
    }
}

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.as_stored_bytes()))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        match bytes.len() {
            BLS_PUBKEY_COMPRESSED_LEN => {
                Self::from_compressed(&bytes).map_err(serde::de::Error::custom)
            }
            BLS_PUBKEY_AFFINE_LEN => Self::from_affine(&bytes).map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "BLS public key must be 48 or 96 bytes, got {other}"
            ))),
        }
    }
}

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// A beacon chain block header — a 5-field SSZ container whose tree root
/// is the block root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
}

/// The sync committee — 512 validators that sign off on the chain head.
/// Rotates every ~27 hours (256 epochs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    pub pubkeys: Vec<BlsPublicKey>,
    pub aggregate_pubkey: BlsPublicKey,
}

impl SyncCommittee {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err("sync committee must have exactly 512 members");
        }
        Ok(())
    }
}

/// A stored per-period committee record, as persisted by the sync-committee
/// store (C4). `previous_pubkeys_hash` lets the boundary fallback of
/// `spec.md` §4.6 validate a header signed in this period using the
/// *previous* period's committee when finality has lagged.
#[derive(Clone, Debug)]
pub struct CommitteeRecord {
    pub committee: SyncCommittee,
    pub previous_pubkeys_hash: Option<[u8; 32]>,
}

/// The aggregate BLS signature from the sync committee, with a bitvector
/// indicating which of the 512 members signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    #[serde(with = "bits_serde")]
    pub sync_committee_bits: BitVec<u8, Lsb0>,
    pub sync_committee_signature: BlsSignature,
}

mod bits_serde {
    use bitvec::order::Lsb0;
    use bitvec::vec::BitVec;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bits.as_raw_slice()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(super::SYNC_COMMITTEE_SIZE);
        Ok(bits)
    }
}

impl SyncAggregate {
    pub fn from_raw(bits: Vec<u8>, signature: BlsSignature) -> Result<Self, &'static str> {
        if bits.len() != SYNC_COMMITTEE_SIZE / 8 {
            return Err("sync committee bits must be exactly 64 bytes");
        }
        let mut bitvec = BitVec::<u8, Lsb0>::from_vec(bits);
        bitvec.truncate(SYNC_COMMITTEE_SIZE);
        Ok(Self {
            sync_committee_bits: bitvec,
            sync_committee_signature: signature,
        })
    }

    pub fn num_participants(&self) -> usize {
        self.sync_committee_bits.count_ones()
    }

    pub fn has_participant(&self, index: usize) -> bool {
        self.sync_committee_bits.get(index).map_or(false, |b| *b)
    }

    pub fn participant_indices(&self) -> Vec<usize> {
        self.sync_committee_bits.iter_ones().collect()
    }
}

/// A light client update from the beacon chain — what peers send to
/// advance the client's view of the chain head. Every field is
/// cryptographically verified before acceptance (C5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightClientUpdate {
    pub attested_header: BeaconBlockHeader,
    pub next_sync_committee: Option<SyncCommittee>,
    pub next_sync_committee_branch: Vec<[u8; 32]>,
    pub finalized_header: BeaconBlockHeader,
    pub finality_branch: Vec<[u8; 32]>,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: u64,
}

/// A light client bootstrap — the initial data needed to start syncing from
/// a trusted checkpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightClientBootstrap {
    pub header: BeaconBlockHeader,
    pub header_root: [u8; 32],
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: Vec<[u8; 32]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_aggregate_from_raw_rejects_wrong_length() {
        assert!(SyncAggregate::from_raw(vec![0u8; 10], BlsSignature([0u8; 96])).is_err());
    }

    #[test]
    fn sync_aggregate_participation_bits() {
        let mut bits = vec![0u8; 64];
        bits[0] = 0b1111_1111;
        bits[1] = 0b0000_0001;
        let agg = SyncAggregate::from_raw(bits, BlsSignature([0u8; 96])).unwrap();
        assert_eq!(agg.num_participants(), 9);
        assert!(agg.has_participant(0));
        assert!(agg.has_participant(8));
        assert!(!agg.has_participant(9));
        assert_eq!(agg.participant_indices(), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn period_and_epoch_arithmetic() {
        assert_eq!(period_at_slot(0), 0);
        assert_eq!(period_at_slot(8192), 1);
        assert_eq!(period_at_slot(8191), 0);
        assert_eq!(epoch_at_slot(32), 1);
    }

    #[test]
    fn bls_pubkey_wire_roundtrip() {
        let compressed = BlsPublicKey::from_compressed(&[0xAB; 48]).unwrap();
        let json = serde_json::to_string(&compressed).unwrap();
        let back: BlsPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(compressed, back);
    }
}
