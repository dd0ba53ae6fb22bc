//! C3: Merkle-Patricia trie proof verification, generalized from a single
//! account-proof walker into a reusable primitive any trie (state,
//! storage, transactions, receipts) can be checked against, built on
//! `codec::rlp::decode_node` instead of hand-rolled list decoding.

use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

use crate::codec::rlp::{decode_node, RlpError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrieError {
    #[error("empty proof: no trie nodes provided")]
    EmptyProof,
    #[error("invalid RLP encoding in proof node {index}")]
    InvalidRlp { index: usize },
    #[error("proof node {index} does not hash to the value its parent references")]
    NodeHashMismatch { index: usize },
    #[error("invalid trie node shape at depth {depth}: expected a 17-element branch or 2-element extension/leaf, got {len} elements")]
    InvalidNodeShape { depth: usize, len: usize },
    #[error("proof ended at depth {depth} without reaching a leaf or a definitive absence")]
    IncompleteProof { depth: usize },
}

impl From<RlpError> for TrieError {
    fn from(_: RlpError) -> Self {
        TrieError::InvalidRlp { index: 0 }
    }
}

/// The result of walking a trie proof for a given key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieOutcome {
    /// The key exists; this is its RLP-encoded value.
    Value(Vec<u8>),
    /// The proof establishes the key is absent from the trie.
    Absent,
}

/// keccak256, the trie's node-hashing function (distinct from the beacon
/// layer's SHA-256 — see `codec::ssz::sha256`).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Convert a byte string into its nibble sequence (big nibble first).
fn bytes_to_nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    nibbles
}

/// Decode a hex-prefix "compact" encoded path, as used by leaf and
/// extension nodes. Returns `(nibbles, is_leaf)`.
///
/// The first nibble of the first byte carries two flag bits: bit 1
/// (value 2) marks a leaf vs extension node, bit 0 (value 1) marks an odd
/// number of remaining nibbles, in which case the low nibble of the first
/// byte is itself part of the path rather than padding.
fn decode_compact_path(encoded: &[u8]) -> Result<(Vec<u8>, bool), TrieError> {
    if encoded.is_empty() {
        return Ok((vec![], false));
    }
    let first = encoded[0];
    let flags = first >> 4;
    let is_leaf = flags & 0b10 != 0;
    let is_odd = flags & 0b01 != 0;

    let mut nibbles = Vec::new();
    if is_odd {
        nibbles.push(first & 0x0F);
    }
    for &byte in &encoded[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    Ok((nibbles, is_leaf))
}

/// Walk a Merkle-Patricia trie proof for `key` against `expected_root`.
///
/// Each proof node is checked against the hash its parent (or the root,
/// for the first node) claims before its contents are trusted; nodes
/// under 32 bytes are allowed to be referenced inline (RLP-embedded)
/// rather than by hash, per the trie's own encoding rule.
pub fn verify_trie_proof(
    expected_root: &[u8; 32],
    key: &[u8],
    proof_nodes: &[Vec<u8>],
) -> Result<TrieOutcome, TrieError> {
    if proof_nodes.is_empty() {
        return Err(TrieError::EmptyProof);
    }

    let nibbles = bytes_to_nibbles(key);
    let mut nibble_index = 0usize;

    let first_hash = keccak256(&proof_nodes[0]);
    if proof_nodes[0].len() >= 32 && first_hash != *expected_root {
        return Err(TrieError::NodeHashMismatch { index: 0 });
    }

    for (depth, node_rlp) in proof_nodes.iter().enumerate() {
        let items =
            decode_node(node_rlp).map_err(|_| TrieError::InvalidRlp { index: depth })?;

        match items.len() {
            17 => {
                if nibble_index >= nibbles.len() {
                    let value = &items[16];
                    return Ok(if value.is_empty() {
                        TrieOutcome::Absent
                    } else {
                        TrieOutcome::Value(value.clone())
                    });
                }

                let child_index = nibbles[nibble_index] as usize;
                nibble_index += 1;
                let child = &items[child_index];

                if depth + 1 < proof_nodes.len() {
                    if child.len() == 32 && proof_nodes[depth + 1].len() >= 32 {
                        let next_hash = keccak256(&proof_nodes[depth + 1]);
                        if next_hash.as_slice() != child.as_slice() {
                            return Err(TrieError::NodeHashMismatch { index: depth + 1 });
                        }
                    }
                } else if child.is_empty() {
                    return Ok(TrieOutcome::Absent);
                } else {
                    return Ok(TrieOutcome::Value(child.clone()));
                }
            }
            2 => {
                let (prefix, is_leaf) = decode_compact_path(&items[0])?;
                let remaining = &nibbles[nibble_index..];

                if is_leaf {
                    return if remaining == prefix.as_slice() {
                        let value = &items[1];
                        if value.is_empty() {
                            Ok(TrieOutcome::Absent)
                        } else {
                            Ok(TrieOutcome::Value(value.clone()))
                        }
                    } else {
                        Ok(TrieOutcome::Absent)
                    };
                }

                if !remaining.starts_with(prefix.as_slice()) {
                    return Ok(TrieOutcome::Absent);
                }
                nibble_index += prefix.len();

                if depth + 1 < proof_nodes.len() {
                    let child_ref = &items[1];
                    if child_ref.len() == 32 && proof_nodes[depth + 1].len() >= 32 {
                        let next_hash = keccak256(&proof_nodes[depth + 1]);
                        if next_hash.as_slice() != child_ref.as_slice() {
                            return Err(TrieError::NodeHashMismatch { index: depth + 1 });
                        }
                    }
                }
            }
            len => {
                return Err(TrieError::InvalidNodeShape { depth, len });
            }
        }
    }

    Err(TrieError::IncompleteProof {
        depth: proof_nodes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Encodable;

    fn rlp_encode_list(items: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = Vec::new();
        for item in items {
            item.as_slice().encode(&mut payload);
        }
        let mut out = Vec::new();
        alloy_rlp::Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn single_leaf_trie_round_trip() {
        // A trie with one leaf node directly under the root: the leaf's
        // compact path consumes the full key, and the root is its hash.
        let key = [0xABu8; 32];
        let nibbles = bytes_to_nibbles(&key);
        // Odd/even prefix handling: full 64-nibble leaf path, even length,
        // flags byte = 0x20 (leaf, even).
        let mut compact = vec![0x20u8];
        for pair in nibbles.chunks(2) {
            compact.push((pair[0] << 4) | pair[1]);
        }
        let value = b"hello-value".to_vec();
        let leaf_node = rlp_encode_list(&[compact, value.clone()]);
        let root = keccak256(&leaf_node);

        let outcome = verify_trie_proof(&root, &key, &[leaf_node]).unwrap();
        assert_eq!(outcome, TrieOutcome::Value(value));
    }

    #[test]
    fn leaf_key_mismatch_is_absent() {
        let key = [0xABu8; 32];
        let wrong_key = [0xCDu8; 32];
        let nibbles = bytes_to_nibbles(&wrong_key);
        let mut compact = vec![0x20u8];
        for pair in nibbles.chunks(2) {
            compact.push((pair[0] << 4) | pair[1]);
        }
        let leaf_node = rlp_encode_list(&[compact, b"v".to_vec()]);
        let root = keccak256(&leaf_node);

        let outcome = verify_trie_proof(&root, &key, &[leaf_node]).unwrap();
        assert_eq!(outcome, TrieOutcome::Absent);
    }

    #[test]
    fn empty_proof_rejected() {
        assert_eq!(
            verify_trie_proof(&[0u8; 32], &[0u8; 32], &[]),
            Err(TrieError::EmptyProof)
        );
    }

    #[test]
    fn root_hash_mismatch_rejected() {
        let key = [0xABu8; 32];
        let nibbles = bytes_to_nibbles(&key);
        let mut compact = vec![0x20u8];
        for pair in nibbles.chunks(2) {
            compact.push((pair[0] << 4) | pair[1]);
        }
        let leaf_node = rlp_encode_list(&[compact, b"v".to_vec()]);
        let wrong_root = [0x11u8; 32];

        assert_eq!(
            verify_trie_proof(&wrong_root, &key, &[leaf_node]),
            Err(TrieError::NodeHashMismatch { index: 0 })
        );
    }

    #[test]
    fn invalid_node_shape_rejected() {
        // A 3-element list is neither a branch nor extension/leaf node.
        let node = rlp_encode_list(&[vec![1], vec![2], vec![3]]);
        let root = keccak256(&node);
        assert_eq!(
            verify_trie_proof(&root, &[0xAB], &[node]),
            Err(TrieError::InvalidNodeShape { depth: 0, len: 3 })
        );
    }
}
