//! A small hand-written SSZ merkleization layer.
//!
//! We don't pull in `ssz_rs` here (see `DESIGN.md`): every container this
//! crate needs to root is fixed and small, and the teacher's own
//! `hash_beacon_block_header` already hand-merkleizes a container the same
//! way real SSZ does for fixed-size containers (pad the leaf list to the
//! next power of two, fold pairwise with SHA-256). This module generalizes
//! that one function into a reusable primitive and adds the length-mixin
//! needed for the variable-size lists elsewhere in the spec (C1).

use sha2::{Digest, Sha256};

use crate::types::beacon::{BeaconBlockHeader, SyncCommittee};
use crate::types::beacon::BLS_PUBKEY_AFFINE_LEN;
use crate::types::execution::ExecutionPayloadHeader;

/// SHA256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// SHA256 of two concatenated 32-byte values — the binary Merkle hashing
/// primitive used throughout SSZ.
pub fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(a);
    data[32..].copy_from_slice(b);
    sha256(&data)
}

/// Merkleize a leaf list: pad to the next power of two with zero leaves,
/// then fold pairwise bottom-up. A single leaf merkleizes to itself; an
/// empty leaf list merkleizes to the zero hash.
pub fn merkleize(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut width = leaves.len().next_power_of_two();
    let mut layer: Vec<[u8; 32]> = Vec::with_capacity(width);
    layer.extend_from_slice(leaves);
    layer.resize(width, [0u8; 32]);

    while width > 1 {
        let mut next = Vec::with_capacity(width / 2);
        for pair in layer.chunks(2) {
            next.push(sha256_pair(&pair[0], &pair[1]));
        }
        layer = next;
        width /= 2;
    }
    layer[0]
}

/// Mix a length into a merkleized root, as SSZ requires for `List[T, N]`
/// (but not `Vector[T, N]`, which has a statically known length and skips
/// this step).
pub fn mix_in_length(root: [u8; 32], length: usize) -> [u8; 32] {
    let mut length_leaf = [0u8; 32];
    length_leaf[..8].copy_from_slice(&(length as u64).to_le_bytes());
    sha256_pair(&root, &length_leaf)
}

/// Encode a u64 as a 32-byte SSZ basic-type leaf (little-endian, zero-padded).
pub fn uint64_to_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}

/// Pack an arbitrary byte string into 32-byte zero-padded chunks, as SSZ's
/// basic-type packing rule requires for `Bytes48` (a BLS pubkey) and
/// similar fixed byte-vectors shorter than 32 bytes.
fn pack_bytes(bytes: &[u8]) -> Vec<[u8; 32]> {
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(32).max(1));
    for chunk in bytes.chunks(32) {
        let mut leaf = [0u8; 32];
        leaf[..chunk.len()].copy_from_slice(chunk);
        chunks.push(leaf);
    }
    if chunks.is_empty() {
        chunks.push([0u8; 32]);
    }
    chunks
}

/// `hash_tree_root` of a 48-byte BLS public key (a `Bytes48` basic vector).
fn hash_tree_root_pubkey_compressed(bytes: &[u8; 48]) -> [u8; 32] {
    merkleize(&pack_bytes(bytes))
}

/// `hash_tree_root` of a `BeaconBlockHeader`: a 5-field SSZ container.
/// `slot` and `proposer_index` are `uint64` leaves; the three roots are
/// already 32 bytes. Five leaves pad to eight.
pub fn hash_tree_root_beacon_header(header: &BeaconBlockHeader) -> [u8; 32] {
    let leaves = [
        uint64_to_leaf(header.slot),
        uint64_to_leaf(header.proposer_index),
        header.parent_root,
        header.state_root,
        header.body_root,
    ];
    merkleize(&leaves)
}

/// `hash_tree_root` of a `SyncCommittee`: `Vector[BLSPubkey, 512]` (no
/// length mixin — the length is static) followed by one more
/// `BLSPubkey` for the aggregate key.
pub fn hash_tree_root_sync_committee(committee: &SyncCommittee) -> [u8; 32] {
    let pubkey_roots: Vec<[u8; 32]> = committee
        .pubkeys
        .iter()
        .map(|pk| {
            // A committee's individual keys are always stored/verified in
            // compressed form on the wire; if the stored encoding happens
            // to be the affine expansion (after a lazy rehydrate), root it
            // by compressing back first so tree roots stay wire-stable.
            match pk.to_compressed_bytes() {
                Ok(bytes) => hash_tree_root_pubkey_compressed(&bytes),
                Err(_) => {
                    // Zeroed placeholder keys (used in tests/bootstrap
                    // stubs) aren't valid curve points; root their stored
                    // bytes directly rather than failing the whole tree.
                    let mut padded = [0u8; 48];
                    let stored = pk.as_stored_bytes();
                    let n = stored.len().min(48);
                    padded[..n].copy_from_slice(&stored[..n]);
                    hash_tree_root_pubkey_compressed(&padded)
                }
            }
        })
        .collect();
    let pubkeys_root = merkleize(&pubkey_roots);

    let aggregate_root = match committee.aggregate_pubkey.to_compressed_bytes() {
        Ok(bytes) => hash_tree_root_pubkey_compressed(&bytes),
        Err(_) => {
            let mut padded = [0u8; 48];
            let stored = committee.aggregate_pubkey.as_stored_bytes();
            let n = stored.len().min(BLS_PUBKEY_AFFINE_LEN.min(48));
            padded[..n].copy_from_slice(&stored[..n]);
            hash_tree_root_pubkey_compressed(&padded)
        }
    };

    merkleize(&[pubkeys_root, aggregate_root])
}

/// `hash_tree_root` of an `ExecutionPayloadHeader`: a 17-field container,
/// padded to 32 leaves. `logs_bloom` is a fixed `Vector[byte, 256]` — 8
/// packed chunks, merkleized with no length mixin since the length is
/// static. `extra_data` is a `ByteList[32]` — packed chunks, merkleized,
/// then length-mixed like any other SSZ list.
pub fn hash_tree_root_execution_payload_header(header: &ExecutionPayloadHeader) -> [u8; 32] {
    let mut fee_recipient_leaf = [0u8; 32];
    fee_recipient_leaf[..20].copy_from_slice(&header.fee_recipient);

    let logs_bloom_root = merkleize(&pack_bytes(&header.logs_bloom));
    let extra_data_root = mix_in_length(
        merkleize(&pack_bytes(&header.extra_data)),
        header.extra_data.len(),
    );

    let leaves = [
        header.parent_hash,
        fee_recipient_leaf,
        header.state_root,
        header.receipts_root,
        logs_bloom_root,
        header.prev_randao,
        uint64_to_leaf(header.block_number),
        uint64_to_leaf(header.gas_limit),
        uint64_to_leaf(header.gas_used),
        uint64_to_leaf(header.timestamp),
        extra_data_root,
        header.base_fee_per_gas,
        header.block_hash,
        header.transactions_root,
        header.withdrawals_root,
        uint64_to_leaf(header.blob_gas_used),
        uint64_to_leaf(header.excess_blob_gas),
    ];
    merkleize(&leaves)
}

/// `hash_tree_root` of a raw transaction's bytes, treated as SSZ's
/// `List[byte, N]`: pack into 32-byte chunks, merkleize, mix in the byte
/// length. This is the leaf a transaction occupies within the
/// `executionPayload.transactions` list (`spec.md` §4.8) — its backing
/// tree is addressed by generalized index, not materialized in full, so
/// no fixed list-capacity bound is needed here.
pub fn hash_tree_root_transaction_bytes(raw: &[u8]) -> [u8; 32] {
    mix_in_length(merkleize(&pack_bytes(raw)), raw.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merkleize_single_leaf_is_identity() {
        let leaf = sha256(b"leaf");
        assert_eq!(merkleize(&[leaf]), leaf);
    }

    #[test]
    fn merkleize_empty_is_zero() {
        assert_eq!(merkleize(&[]), [0u8; 32]);
    }

    #[test]
    fn merkleize_pads_to_power_of_two() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        let c = sha256(b"c");
        let three = merkleize(&[a, b, c]);
        let four = merkleize(&[a, b, c, [0u8; 32]]);
        assert_eq!(three, four);
    }

    #[test]
    fn beacon_header_root_is_deterministic() {
        let header = BeaconBlockHeader {
            slot: 100,
            proposer_index: 7,
            parent_root: [1u8; 32],
            state_root: [2u8; 32],
            body_root: [3u8; 32],
        };
        let r1 = hash_tree_root_beacon_header(&header);
        let r2 = hash_tree_root_beacon_header(&header);
        assert_eq!(r1, r2);

        let mut other = header.clone();
        other.slot = 101;
        assert_ne!(r1, hash_tree_root_beacon_header(&other));
    }

    #[test]
    fn mix_in_length_changes_with_length() {
        let root = sha256(b"root");
        assert_ne!(mix_in_length(root, 0), mix_in_length(root, 1));
    }

    #[test]
    fn transaction_bytes_root_is_deterministic_and_length_sensitive() {
        let tx = vec![0xAAu8; 120];
        let r1 = hash_tree_root_transaction_bytes(&tx);
        let r2 = hash_tree_root_transaction_bytes(&tx);
        assert_eq!(r1, r2);

        let mut shorter = tx.clone();
        shorter.pop();
        assert_ne!(r1, hash_tree_root_transaction_bytes(&shorter));
    }
}
