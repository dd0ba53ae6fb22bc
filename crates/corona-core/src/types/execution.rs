//! Execution-layer types: accounts, storage, receipts, logs, and the
//! Merkle-Patricia trie proof payloads that bind them to a trie root.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// An Ethereum account as stored in the state trie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: B256,
    pub code_hash: B256,
}

impl AccountState {
    /// keccak256("") — the code hash of an externally owned account.
    pub const EMPTY_CODE_HASH: B256 = B256::new([
        0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
        0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
        0xa4, 0x70,
    ]);

    /// The root of an empty Merkle-Patricia trie.
    pub const EMPTY_STORAGE_ROOT: B256 = B256::new([
        0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
        0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
        0xb4, 0x21,
    ]);

    pub fn is_contract(&self) -> bool {
        self.code_hash != Self::EMPTY_CODE_HASH
    }

    pub fn has_storage(&self) -> bool {
        self.storage_root != Self::EMPTY_STORAGE_ROOT
    }
}

/// A Merkle-Patricia trie proof for an account, as returned by
/// `eth_getProof` but verified locally against a trusted state root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountProof {
    pub address: Address,
    pub proof: Vec<Bytes>,
}

/// A Merkle-Patricia trie proof for a single storage slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageProof {
    pub key: B256,
    pub proof: Vec<Bytes>,
}

/// Full `eth_getProof` response: one account proof plus zero or more
/// storage proofs for requested slots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EthGetProofResponse {
    pub account_proof: AccountProof,
    pub storage_proofs: Vec<StorageProof>,
}

/// Execution payload header — the link between beacon and execution
/// layers. `state_root`/`receipts_root`/`block_hash` are what C8's
/// per-proof verifiers bind Merkle-Patricia proofs against. All 17 Deneb/
/// Electra fields are kept in spec order: `codec::ssz`'s merkleization
/// and `consensus::gindex`'s field gindices both assume this exact field
/// count and ordering, so the two stay in agreement about where each
/// field sits in the 32-leaf container tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: [u8; 32],
    pub fee_recipient: [u8; 20],
    pub state_root: [u8; 32],
    pub receipts_root: [u8; 32],
    #[serde(with = "bloom_serde")]
    pub logs_bloom: [u8; 256],
    pub prev_randao: [u8; 32],
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Vec<u8>,
    pub base_fee_per_gas: [u8; 32],
    pub block_hash: [u8; 32],
    pub transactions_root: [u8; 32],
    pub withdrawals_root: [u8; 32],
    pub blob_gas_used: u64,
    pub excess_blob_gas: u64,
}

mod bloom_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bloom: &[u8; 256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bloom))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 256], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 256 {
            return Err(serde::de::Error::custom(format!(
                "logs_bloom must be 256 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 256];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

/// A proof for a transaction receipt in the receipts trie.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceiptProof {
    pub tx_index: u64,
    pub proof: Vec<Bytes>,
}

/// A verified transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub status: u8,
    pub cumulative_gas_used: u64,
    pub logs_bloom: Box<[u8; 256]>,
    pub logs: Vec<Log>,
}

/// A log entry emitted by a smart contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl Log {
    /// Whether this log matches an `eth_getLogs`-style filter: an address
    /// allowlist (empty = any address) and per-position topic allowlists
    /// (empty position = any value, per the standard JSON-RPC semantics).
    pub fn matches_filter(&self, addresses: &[Address], topics: &[Vec<B256>]) -> bool {
        if !addresses.is_empty() && !addresses.contains(&self.address) {
            return false;
        }
        for (i, allowed) in topics.iter().enumerate() {
            if allowed.is_empty() {
                continue;
            }
            match self.topics.get(i) {
                Some(actual) if allowed.contains(actual) => {}
                _ => return false,
            }
        }
        true
    }
}

/// A decoded Ethereum transaction, typed by EIP-2718 envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxData {
    Legacy(LegacyTx),
    Eip2930(Eip2930Tx),
    Eip1559(Eip1559Tx),
    Eip4844(Eip4844Tx),
    OpDeposit(OpDepositTx),
}

impl TxData {
    pub fn hash(&self) -> B256 {
        match self {
            TxData::Legacy(t) => t.hash,
            TxData::Eip2930(t) => t.hash,
            TxData::Eip1559(t) => t.hash,
            TxData::Eip4844(t) => t.hash,
            TxData::OpDeposit(t) => t.hash,
        }
    }

    pub fn from(&self) -> Address {
        match self {
            TxData::Legacy(t) => t.from,
            TxData::Eip2930(t) => t.from,
            TxData::Eip1559(t) => t.from,
            TxData::Eip4844(t) => t.from,
            TxData::OpDeposit(t) => t.from,
        }
    }

    pub fn to(&self) -> Option<Address> {
        match self {
            TxData::Legacy(t) => t.to,
            TxData::Eip2930(t) => t.to,
            TxData::Eip1559(t) => t.to,
            TxData::Eip4844(t) => t.to,
            TxData::OpDeposit(t) => t.to,
        }
    }

    pub fn value(&self) -> U256 {
        match self {
            TxData::Legacy(t) => t.value,
            TxData::Eip2930(t) => t.value,
            TxData::Eip1559(t) => t.value,
            TxData::Eip4844(t) => t.value,
            TxData::OpDeposit(t) => t.value,
        }
    }

    pub fn input(&self) -> &Bytes {
        match self {
            TxData::Legacy(t) => &t.input,
            TxData::Eip2930(t) => &t.input,
            TxData::Eip1559(t) => &t.input,
            TxData::Eip4844(t) => &t.input,
            TxData::OpDeposit(t) => &t.input,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTx {
    pub hash: B256,
    pub from: Address,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip2930Tx {
    pub hash: B256,
    pub from: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub access_list: Vec<(Address, Vec<B256>)>,
    pub y_parity: bool,
    pub r: U256,
    pub s: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip1559Tx {
    pub hash: B256,
    pub from: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub access_list: Vec<(Address, Vec<B256>)>,
    pub y_parity: bool,
    pub r: U256,
    pub s: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip4844Tx {
    pub hash: B256,
    pub from: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub access_list: Vec<(Address, Vec<B256>)>,
    pub max_fee_per_blob_gas: U256,
    pub blob_versioned_hashes: Vec<B256>,
    pub y_parity: bool,
    pub r: U256,
    pub s: U256,
}

/// OP-stack deposit transaction (no signature — the sequencer injects
/// these directly; present only on OP-stack chains, per `spec.md` §4.8).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDepositTx {
    pub hash: B256,
    pub source_hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub mint: U256,
    pub value: U256,
    pub gas_limit: u64,
    pub is_system_tx: bool,
    pub input: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_matches_filter_empty_allowlists_match_anything() {
        let log = Log {
            address: Address::repeat_byte(0x11),
            topics: vec![B256::repeat_byte(0xaa)],
            data: Bytes::new(),
        };
        assert!(log.matches_filter(&[], &[]));
    }

    #[test]
    fn log_matches_filter_address_mismatch_rejected() {
        let log = Log {
            address: Address::repeat_byte(0x11),
            topics: vec![],
            data: Bytes::new(),
        };
        assert!(!log.matches_filter(&[Address::repeat_byte(0x22)], &[]));
        assert!(log.matches_filter(&[Address::repeat_byte(0x11)], &[]));
    }

    #[test]
    fn log_matches_filter_topic_position_mismatch_rejected() {
        let log = Log {
            address: Address::ZERO,
            topics: vec![B256::repeat_byte(0xaa), B256::repeat_byte(0xbb)],
            data: Bytes::new(),
        };
        assert!(log.matches_filter(&[], &[vec![B256::repeat_byte(0xaa)]]));
        assert!(!log.matches_filter(&[], &[vec![B256::repeat_byte(0xcc)]]));
        // Position 1 unconstrained, position 0 must match.
        assert!(log.matches_filter(
            &[],
            &[vec![B256::repeat_byte(0xaa)], vec![]]
        ));
    }
}
