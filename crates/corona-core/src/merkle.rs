//! C2: the SSZ Merkle proof verifier. Consumes siblings, leaves, and
//! generalized indices, and checks a claimed root.
//!
//! A generalized index `g` addresses a node in a binary tree: `1` is the
//! root, `2`/`3` are its children, and in general the bits of `g` (read
//! from the most-significant set bit down) trace the root-to-node path —
//! see the GLOSSARY in `spec.md`.

use thiserror::Error;

use crate::codec::ssz::sha256_pair;

pub type GIndex = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("branch length {got} does not match expected depth {expected} for gindex")]
    WrongBranchLength { expected: usize, got: usize },
    #[error("merkle proof does not reconstruct the claimed root")]
    RootMismatch,
    #[error("multi-leaf proof ran out of branch material before reconstructing the root")]
    BranchExhausted,
    #[error("multi-leaf proof has unused branch material left over")]
    BranchNotExhausted,
    #[error("gindex 1 (the tree root) only accepts an empty branch and a leaf equal to the root")]
    InvalidRootGIndex,
}

/// Depth of a generalized index: the position of its highest set bit.
/// `depth(1) == 0`, `depth(2) == depth(3) == 1`, etc.
pub fn depth(gindex: GIndex) -> u32 {
    63 - gindex.leading_zeros()
}

/// The sibling of `gindex` at the same depth (XOR the lowest bit).
fn sibling(gindex: GIndex) -> GIndex {
    gindex ^ 1
}

/// The parent of `gindex` (shift right one bit).
fn parent(gindex: GIndex) -> GIndex {
    gindex >> 1
}

/// Verify a single-leaf Merkle branch against a claimed root.
///
/// Walks from the leaf upward, at each level hashing with the sibling in
/// the order determined by whether the current node is a left or right
/// child (encoded in the corresponding bit of `gindex`, read LSB-first,
/// skipping the implicit leading 1).
pub fn verify_single_leaf(
    leaf: &[u8; 32],
    gindex: GIndex,
    branch: &[[u8; 32]],
    root: &[u8; 32],
) -> Result<(), MerkleError> {
    if gindex == 1 {
        if !branch.is_empty() {
            return Err(MerkleError::InvalidRootGIndex);
        }
        return if leaf == root {
            Ok(())
        } else {
            Err(MerkleError::InvalidRootGIndex)
        };
    }

    let expected_depth = depth(gindex) as usize;
    if branch.len() != expected_depth {
        return Err(MerkleError::WrongBranchLength {
            expected: expected_depth,
            got: branch.len(),
        });
    }

    let mut current = *leaf;
    for (i, sibling_hash) in branch.iter().enumerate() {
        // Bit i of gindex (0-indexed from LSB) tells us whether `current`
        // is a right child (bit set -> hash(sibling, current)) or a left
        // child (bit unset -> hash(current, sibling)) at this level.
        if (gindex >> i) & 1 == 1 {
            current = sha256_pair(sibling_hash, &current);
        } else {
            current = sha256_pair(&current, sibling_hash);
        }
    }

    if current == *root {
        Ok(())
    } else {
        Err(MerkleError::RootMismatch)
    }
}

/// A single leaf in a multi-leaf proof: its value and the generalized
/// index it occupies in the tree the claimed root describes.
#[derive(Clone, Copy, Debug)]
pub struct IndexedLeaf {
    pub gindex: GIndex,
    pub leaf: [u8; 32],
}

/// Verify a multi-leaf Merkle proof: several (leaf, gindex) pairs plus a
/// packed list of sibling nodes not otherwise derivable from the leaf set
/// itself, reconstructed bottom-up until a single root remains.
///
/// The reconstruction works level by level: group the current frontier of
/// known nodes by depth (deepest first), and whenever two known nodes are
/// siblings of each other, combine them directly; otherwise pull the next
/// branch element to stand in for the missing sibling. This continues
/// until one node remains at depth 0 (gindex 1), which must equal `root`.
pub fn verify_multi_leaf(
    leaves: &[IndexedLeaf],
    branch: &[[u8; 32]],
    root: &[u8; 32],
) -> Result<(), MerkleError> {
    if leaves.len() == 1 && leaves[0].gindex == 1 {
        return verify_single_leaf(&leaves[0].leaf, 1, branch, root);
    }

    use std::collections::BTreeMap;

    // Map gindex -> known node value, keyed so we can always find/remove a
    // node's sibling by flipping its low bit.
    let mut known: BTreeMap<GIndex, [u8; 32]> =
        leaves.iter().map(|l| (l.gindex, l.leaf)).collect();

    let mut branch_iter = branch.iter();

    // Process deepest nodes first: once both children of a parent are
    // known (either both supplied leaves, a leaf plus a prior merge
    // result, or a leaf plus a branch element) we can merge upward.
    while known.len() > 1 || !known.contains_key(&1) {
        let &deepest_gindex = known
            .keys()
            .max_by_key(|g| depth(**g))
            .expect("known is non-empty while looping");

        let sib = sibling(deepest_gindex);
        let left_gindex = deepest_gindex & !1;
        let right_gindex = left_gindex | 1;

        let left = match known.get(&left_gindex) {
            Some(v) => *v,
            None => *branch_iter.next().ok_or(MerkleError::BranchExhausted)?,
        };
        let right = match known.get(&right_gindex) {
            Some(v) => *v,
            None => *branch_iter.next().ok_or(MerkleError::BranchExhausted)?,
        };

        known.remove(&left_gindex);
        known.remove(&right_gindex);
        let _ = sib;

        let parent_value = sha256_pair(&left, &right);
        let parent_gindex = parent(left_gindex);
        known.insert(parent_gindex, parent_value);
    }

    if branch_iter.next().is_some() {
        return Err(MerkleError::BranchNotExhausted);
    }

    match known.get(&1) {
        Some(value) if value == root => Ok(()),
        Some(_) => Err(MerkleError::RootMismatch),
        None => Err(MerkleError::BranchExhausted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ssz::sha256;

    #[test]
    fn single_leaf_trivial_depth_one() {
        let leaf = sha256(b"leaf");
        let sib = sha256(b"sibling");
        // gindex 2 = left child at depth 1: root = hash(leaf, sib)
        let root = sha256_pair(&leaf, &sib);
        assert!(verify_single_leaf(&leaf, 2, &[sib], &root).is_ok());
        // gindex 3 = right child: root = hash(sib, leaf)
        let root_right = sha256_pair(&sib, &leaf);
        assert!(verify_single_leaf(&leaf, 3, &[sib], &root_right).is_ok());
        // Flipped sibling byte rejects.
        let mut bad_sib = sib;
        bad_sib[0] ^= 0xFF;
        assert!(verify_single_leaf(&leaf, 2, &[bad_sib], &root).is_err());
    }

    #[test]
    fn single_leaf_wrong_branch_length_rejected() {
        let leaf = sha256(b"leaf");
        let root = sha256(b"root");
        assert_eq!(
            verify_single_leaf(&leaf, 4, &[], &root),
            Err(MerkleError::WrongBranchLength {
                expected: 2,
                got: 0
            })
        );
    }

    #[test]
    fn root_gindex_accepts_only_empty_branch_and_equal_leaf() {
        let root = sha256(b"root");
        assert!(verify_single_leaf(&root, 1, &[], &root).is_ok());
        assert!(verify_single_leaf(&sha256(b"not-root"), 1, &[], &root).is_err());
        assert!(verify_single_leaf(&root, 1, &[[0u8; 32]], &root).is_err());
    }

    #[test]
    fn multi_leaf_two_siblings_no_branch_needed() {
        let left = sha256(b"left");
        let right = sha256(b"right");
        let root = sha256_pair(&left, &right);
        let leaves = [
            IndexedLeaf { gindex: 2, leaf: left },
            IndexedLeaf { gindex: 3, leaf: right },
        ];
        assert!(verify_multi_leaf(&leaves, &[], &root).is_ok());
    }

    #[test]
    fn multi_leaf_with_branch_fill() {
        // Depth-2 tree: gindices 4,5,6,7 are the leaves.
        let l4 = sha256(b"4");
        let l5 = sha256(b"5");
        let l6 = sha256(b"6");
        let l7 = sha256(b"7");
        let h23 = sha256_pair(&l4, &l5);
        let h45 = sha256_pair(&l6, &l7);
        let root = sha256_pair(&h23, &h45);

        // We know leaves 4 and 7 only; 5 and 6 come from the branch.
        let leaves = [
            IndexedLeaf { gindex: 4, leaf: l4 },
            IndexedLeaf { gindex: 7, leaf: l7 },
        ];
        assert!(verify_multi_leaf(&leaves, &[l5, l6], &root).is_ok());

        // Flipping a branch element rejects.
        let mut bad_l5 = l5;
        bad_l5[0] ^= 1;
        assert!(verify_multi_leaf(&leaves, &[bad_l5, l6], &root).is_err());
    }

    #[test]
    fn multi_leaf_extra_branch_material_rejected() {
        let left = sha256(b"left");
        let right = sha256(b"right");
        let root = sha256_pair(&left, &right);
        let leaves = [
            IndexedLeaf { gindex: 2, leaf: left },
            IndexedLeaf { gindex: 3, leaf: right },
        ];
        assert_eq!(
            verify_multi_leaf(&leaves, &[[0u8; 32]], &root),
            Err(MerkleError::BranchNotExhausted)
        );
    }

    #[test]
    fn depth_helper() {
        assert_eq!(depth(1), 0);
        assert_eq!(depth(2), 1);
        assert_eq!(depth(3), 1);
        assert_eq!(depth(812), 9);
    }
}
