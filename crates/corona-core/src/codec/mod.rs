pub mod envelope;
pub mod execution;
pub mod rlp;
pub mod ssz;

pub use envelope::{decode_envelope, encode_envelope, EnvelopeError};
pub use execution::{
    decode_account, decode_logs, decode_receipt, decode_storage_value, decode_transaction,
    transaction_hash, DecodedTx, ExecutionDecodeError,
};
pub use rlp::{decode_list_items, decode_node, rlp_decode, rlp_item_count, RlpError, RlpValue};
pub use ssz::{
    hash_tree_root_beacon_header, hash_tree_root_execution_payload_header,
    hash_tree_root_sync_committee, hash_tree_root_transaction_bytes, merkleize, mix_in_length,
    sha256, sha256_pair,
};
