//! C8: one verifier function per proof kind, each following the same
//! shape — structural Merkle/trie check first, then the shared
//! `common::verify_proof_header` BLS/committee check, then a `Method`
//! dispatch that either returns the matching `RpcData` or rejects the
//! proof/method pairing. `driver` (C7) is the only caller that needs to
//! see all eight at once, selecting by `types::proof::Proof` variant.

pub mod account;
pub mod block;
pub mod blockhash;
pub mod call;
pub mod common;
pub mod logs;
pub mod receipt;
pub mod sync;
pub mod transaction;

pub use account::verify_account_proof;
pub use block::verify_block_proof;
pub use blockhash::verify_blockhash_proof;
pub use call::verify_call_proof;
pub use common::{headers_agree, verify_proof_header};
pub use logs::verify_logs_proof;
pub use receipt::verify_receipt_proof;
pub use sync::verify_sync_proof;
pub use transaction::verify_transaction_proof;
