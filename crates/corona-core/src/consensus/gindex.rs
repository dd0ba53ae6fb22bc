//! Generalized indices for the beacon-chain Merkle trees this crate binds
//! proofs against (`spec.md` §4.8, §4.5, §6). The execution-payload field
//! indices compose two levels of the beacon state tree: the
//! `executionPayload` field's own gindex within `BeaconBlockBody` (25,
//! a depth-4 position, so `25 * 32 = 800` once combined with the
//! payload's own depth-5, 17-field (padded to 32) container) plus the
//! field's local offset within `ExecutionPayload` — see `DESIGN.md` for
//! the derivation, cross-checked against the three gindices `spec.md`
//! gives explicitly (812, 802, 803).

/// The whole `executionPayload` container as a single field of
/// `BeaconBlockBody` (field 9 of a depth-4, 16-slot container): `25`.
pub const EXECUTION_PAYLOAD_GINDEX: u64 = 25;

/// Base offset for any field of `executionPayload`, combined under `body_root`.
const EXECUTION_PAYLOAD_FIELD_BASE: u64 = EXECUTION_PAYLOAD_GINDEX * 32;

/// `executionPayload.stateRoot`, field index 2 of 17.
pub const STATE_ROOT_GINDEX: u64 = EXECUTION_PAYLOAD_FIELD_BASE + 2;

/// `executionPayload.receiptsRoot`, field index 3 of 17.
pub const RECEIPTS_ROOT_GINDEX: u64 = EXECUTION_PAYLOAD_FIELD_BASE + 3;

/// `executionPayload.blockNumber`, field index 6 of 17.
pub const BLOCK_NUMBER_GINDEX: u64 = EXECUTION_PAYLOAD_FIELD_BASE + 6;

/// `executionPayload.baseFeePerGas`, field index 11 of 17.
pub const BASE_FEE_PER_GAS_GINDEX: u64 = EXECUTION_PAYLOAD_FIELD_BASE + 11;

/// `executionPayload.blockHash`, field index 12 of 17 — `spec.md` §4.8's gindex 812.
pub const BLOCK_HASH_GINDEX: u64 = EXECUTION_PAYLOAD_FIELD_BASE + 12;

/// `executionPayload.transactions` (the `List[Transaction, N]` root, before
/// any individual element is selected), field index 13 of 17.
pub const TRANSACTIONS_ROOT_GINDEX: u64 = EXECUTION_PAYLOAD_FIELD_BASE + 13;

/// Depth of the `transactions` list's own backing tree
/// (`MAX_TRANSACTIONS_PER_PAYLOAD = 2^20`, mainnet preset). A transaction at
/// position `i` sits at local generalized index `2^20 + i` within that
/// subtree, addressed independently of how many transactions the block
/// actually contains.
pub const TRANSACTIONS_LIST_DEPTH: u32 = 20;

pub fn transaction_leaf_gindex(tx_index: u64) -> u64 {
    (1u64 << TRANSACTIONS_LIST_DEPTH) + tx_index
}

/// Concatenate two generalized indices: `a` locates a subtree's root, `b`
/// is a path relative to that subtree's own root (gindex 1); the result
/// addresses `b`'s node in the whole tree `a` is itself embedded in. This
/// is the standard SSZ generalized-index composition rule and is what
/// lets `transaction_combined_gindex` reach into the `transactions` list
/// subtree from `body_root` in one multi-leaf proof.
pub fn concat_gindex(a: u64, b: u64) -> u64 {
    let depth_b = 63 - b.leading_zeros();
    (a << depth_b) | (b & ((1u64 << depth_b) - 1))
}

/// The generalized index of `transactions[tx_index]` as seen from
/// `body_root`: `executionPayload.transactions`'s own field gindex,
/// composed with the transaction's local position inside that list's
/// backing tree (`spec.md` §4.8's multi-leaf transaction branch).
///
/// This composes the field's list-root gindex directly with the local
/// leaf gindex rather than going through the list's length-mixin node —
/// the length is independently established by RLP-decoding the raw
/// transaction bytes supplied alongside the proof, so no separate
/// length-proof leaf is required here (see `DESIGN.md`).
pub fn transaction_combined_gindex(tx_index: u64) -> u64 {
    concat_gindex(TRANSACTIONS_ROOT_GINDEX, transaction_leaf_gindex(tx_index))
}

/// The sync-committee generalized index used both for a light-client
/// update's next-committee branch (`spec.md` §4.5 rule 3) and for a
/// bootstrap's current-committee branch (`spec.md` §6): the spec names the
/// same pair of values, 54 pre-Electra and 86 from Electra on, for both
/// uses verbatim, so one function serves both call sites.
pub fn sync_committee_gindex(is_electra_or_later: bool) -> u64 {
    if is_electra_or_later {
        86
    } else {
        54
    }
}

/// Generalized index for the finalized-checkpoint root within
/// `attested_header.state_root` (`spec.md` §4.5 rule 2: "fork-dependent
/// generalized index for `finalized_header`"). Not pinned to a literal
/// value by `spec.md` the way the sync-committee indices are; resolved in
/// `DESIGN.md` using the same depth-extension reasoning Electra applied to
/// the sync-committee gindices.
pub fn finalized_root_gindex(is_electra_or_later: bool) -> u64 {
    if is_electra_or_later {
        169
    } else {
        105
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_given_gindices_match() {
        assert_eq!(BLOCK_HASH_GINDEX, 812);
        assert_eq!(STATE_ROOT_GINDEX, 802);
        assert_eq!(RECEIPTS_ROOT_GINDEX, 803);
    }

    #[test]
    fn sync_committee_gindex_selects_by_fork() {
        assert_eq!(sync_committee_gindex(false), 54);
        assert_eq!(sync_committee_gindex(true), 86);
    }

    #[test]
    fn transaction_leaf_gindex_offsets_by_index() {
        let base = 1u64 << TRANSACTIONS_LIST_DEPTH;
        assert_eq!(transaction_leaf_gindex(0), base);
        assert_eq!(transaction_leaf_gindex(5), base + 5);
    }

    #[test]
    fn concat_gindex_matches_known_identity() {
        // Concatenating gindex 2 (left child) with gindex 3 (right child
        // of the subtree rooted there) reaches the grandchild at gindex
        // 2*2 + 1 = 5.
        assert_eq!(concat_gindex(2, 3), 5);
        // Concatenating with the trivial root path (gindex 1) is a no-op.
        assert_eq!(concat_gindex(812, 1), 812);
    }

    #[test]
    fn transaction_combined_gindex_descends_from_transactions_root() {
        let combined = transaction_combined_gindex(0);
        assert_eq!(depth(combined), depth(TRANSACTIONS_ROOT_GINDEX) + TRANSACTIONS_LIST_DEPTH);
    }

    fn depth(g: u64) -> u32 {
        63 - g.leading_zeros()
    }
}
