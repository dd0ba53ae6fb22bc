//! The proof union (`spec.md` §3) and the common header every proof kind
//! carries: a beacon block header, sync-committee participation bitvector,
//! and aggregate BLS signature.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use super::beacon::{BeaconBlockHeader, SyncAggregate};
use super::execution::{
    AccountProof, ExecutionPayloadHeader, Log, ReceiptProof, StorageProof, TxData,
};
use super::LightClientUpdate;

/// Fields common to every proof kind: the beacon header the sync committee
/// signed over, and the aggregate signature itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofHeader {
    pub beacon_header: BeaconBlockHeader,
    pub sync_aggregate: SyncAggregate,
    /// Merkle branch binding `executionPayload` (or a sub-field of it) into
    /// `beacon_header.body_root`. Individual proof kinds interpret the
    /// branch against whichever generalized index they need.
    pub execution_branch: Vec<[u8; 32]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockHashProof {
    pub header: ProofHeader,
    pub block_hash: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountProofData {
    pub header: ProofHeader,
    /// The execution `stateRoot` the account trie proof is checked
    /// against; also the leaf `state_root_branch` binds into `body_root`.
    pub state_root: [u8; 32],
    pub state_root_branch: Vec<[u8; 32]>,
    pub account_proof: AccountProof,
    pub storage_proofs: Vec<StorageProof>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionProofData {
    pub header: ProofHeader,
    pub transaction_index: u64,
    pub raw_transaction: Bytes,
    /// The three sibling leaves the multi-leaf branch binds alongside the
    /// transaction itself (`spec.md` §4.8).
    pub block_hash: [u8; 32],
    pub block_number: u64,
    pub base_fee_per_gas: [u8; 32],
    /// Multi-leaf SSZ branch binding `{blockHash, blockNumber,
    /// baseFeePerGas, transactions[transaction_index]}` into `body_root`.
    pub multi_branch: Vec<[u8; 32]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceiptProofData {
    pub header: ProofHeader,
    pub receipts_root: [u8; 32],
    pub receipts_root_branch: Vec<[u8; 32]>,
    pub receipt_proof: ReceiptProof,
}

/// One block's worth of a logs filter: its own beacon header/signature
/// (a filter spanning several blocks needs one of these per block, since
/// a single beacon header only ever covers one execution block), the
/// receipts trie root and its binding into that header, and the receipt
/// proofs for every transaction in the block the filter could match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogsBlockProof {
    pub header: ProofHeader,
    pub receipts_root: [u8; 32],
    pub receipts_root_branch: Vec<[u8; 32]>,
    pub receipt_proofs: Vec<ReceiptProof>,
    pub block_number: u64,
    pub block_hash: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogsProofData {
    pub blocks: Vec<LogsBlockProof>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallProofData {
    pub header: ProofHeader,
    pub state_root_branch: Vec<[u8; 32]>,
    /// Account and storage proofs the EVM host is allowed to read from
    /// while replaying the call; any state access not backed by one of
    /// these aborts verification (`spec.md` §4.8).
    pub accounts: Vec<AccountProofData>,
    pub call_to: Address,
    pub call_data: Bytes,
    pub call_output: Bytes,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockProofData {
    pub header: ProofHeader,
    pub execution_payload_header: ExecutionPayloadHeader,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncProofData {
    pub updates: Vec<LightClientUpdate>,
}

/// Discriminated union of the eight proof kinds, selected by a leading
/// `u8` on the wire (`0..=7`, in this declaration order).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Proof {
    BlockHash(BlockHashProof),
    Account(AccountProofData),
    Transaction(TransactionProofData),
    Receipt(ReceiptProofData),
    Logs(LogsProofData),
    Call(CallProofData),
    Block(BlockProofData),
    Sync(SyncProofData),
}

impl Proof {
    /// The wire selector byte for this variant.
    pub fn selector(&self) -> u8 {
        match self {
            Proof::BlockHash(_) => 0,
            Proof::Account(_) => 1,
            Proof::Transaction(_) => 2,
            Proof::Receipt(_) => 3,
            Proof::Logs(_) => 4,
            Proof::Call(_) => 5,
            Proof::Block(_) => 6,
            Proof::Sync(_) => 7,
        }
    }

    /// The single `ProofHeader` common to every variant that carries
    /// exactly one — `Logs` carries one per block (a filter can span
    /// several execution blocks, each with its own beacon header) and
    /// `Sync` carries none (it wraps a batch of light-client updates
    /// instead), so both return `None` here.
    pub fn header(&self) -> Option<&ProofHeader> {
        match self {
            Proof::BlockHash(p) => Some(&p.header),
            Proof::Account(p) => Some(&p.header),
            Proof::Transaction(p) => Some(&p.header),
            Proof::Receipt(p) => Some(&p.header),
            Proof::Logs(_) => None,
            Proof::Call(p) => Some(&p.header),
            Proof::Block(p) => Some(&p.header),
            Proof::Sync(_) => None,
        }
    }
}

/// The RPC result the prover claims to have produced — the `data`
/// sub-object of the request envelope (`spec.md` §3). Cross-checked by
/// each per-proof verifier against what the proof actually establishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RpcData {
    BlockHash([u8; 32]),
    Balance(U256),
    StorageValue(B256),
    TransactionCount(u64),
    Transaction(Box<TxData>),
    Receipt(Box<super::execution::TransactionReceipt>),
    Logs(Vec<Log>),
    CallResult(Bytes),
    BlockNumber(u64),
    BlockHeader(Box<ExecutionPayloadHeader>),
    SyncPeriod(u64),
}
