//! Decoding of execution-layer RLP payloads — accounts, storage values,
//! receipts, logs, and typed transactions — built on the `codec::rlp`
//! primitives (C1) rather than a second hand-rolled list walker. Mirrors
//! the teacher's `execution/proof.rs` and `execution/receipt.rs` decode
//! shapes, generalized across the typed-transaction envelopes `spec.md`
//! §4.8 requires.

use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::codec::rlp::{decode_bytes, decode_list_items, decode_node, decode_uint64, RlpError};
use crate::trie::keccak256;
use crate::types::execution::{AccountState, Log, TransactionReceipt, TxData};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionDecodeError {
    #[error(transparent)]
    Rlp(#[from] RlpError),
    #[error("{what} should have {expected} RLP fields, got {got}")]
    FieldCount {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{what} field has the wrong byte length: expected {expected}, got {got}")]
    FieldLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unrecognized transaction envelope type byte {0:#04x}")]
    UnknownTxType(u8),
    #[error("empty transaction bytes")]
    EmptyTransaction,
}

type Result<T> = std::result::Result<T, ExecutionDecodeError>;

fn field_u256(bytes: &[u8]) -> U256 {
    U256::from_be_slice(bytes)
}

fn field_address(bytes: &[u8], what: &'static str) -> Result<Address> {
    if bytes.len() != 20 {
        return Err(ExecutionDecodeError::FieldLength {
            what,
            expected: 20,
            got: bytes.len(),
        });
    }
    Ok(Address::from_slice(bytes))
}

fn field_b256(bytes: &[u8], what: &'static str) -> Result<B256> {
    if bytes.len() != 32 {
        return Err(ExecutionDecodeError::FieldLength {
            what,
            expected: 32,
            got: bytes.len(),
        });
    }
    Ok(B256::from_slice(bytes))
}

/// Decode an RLP-encoded `(nonce, balance, storageRoot, codeHash)` state
/// trie leaf into an `AccountState`.
pub fn decode_account(rlp_bytes: &[u8]) -> Result<AccountState> {
    let items = decode_node(rlp_bytes)?;
    if items.len() != 4 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "account",
            expected: 4,
            got: items.len(),
        });
    }
    let storage_root = if items[2].is_empty() {
        AccountState::EMPTY_STORAGE_ROOT
    } else {
        field_b256(&items[2], "account.storageRoot")?
    };
    let code_hash = if items[3].is_empty() {
        AccountState::EMPTY_CODE_HASH
    } else {
        field_b256(&items[3], "account.codeHash")?
    };
    Ok(AccountState {
        nonce: decode_uint64(&items[0]),
        balance: field_u256(&items[1]),
        storage_root,
        code_hash,
    })
}

/// Decode an RLP-encoded storage trie leaf value (a bare RLP string) into
/// its 32-byte, left-padded slot value.
pub fn decode_storage_value(rlp_bytes: &[u8]) -> Result<B256> {
    let raw = decode_bytes(rlp_bytes)?;
    Ok(B256::left_padding_from(raw))
}

/// Decode a receipts-trie leaf. Post-EIP-2718 a typed receipt is prefixed
/// with a single type byte (0x00-0x7f) ahead of the 4-field RLP list; a
/// legacy receipt has no prefix and starts directly with the RLP list.
pub fn decode_receipt(data: &[u8]) -> Result<TransactionReceipt> {
    let body = if !data.is_empty() && data[0] <= 0x7f {
        &data[1..]
    } else {
        data
    };
    let items = decode_node(body)?;
    if items.len() != 4 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "receipt",
            expected: 4,
            got: items.len(),
        });
    }
    let status = items[0].first().copied().unwrap_or(0);
    let cumulative_gas_used = decode_uint64(&items[1]);
    let mut logs_bloom = Box::new([0u8; 256]);
    if items[2].len() == 256 {
        logs_bloom.copy_from_slice(&items[2]);
    } else if !items[2].is_empty() {
        return Err(ExecutionDecodeError::FieldLength {
            what: "receipt.logsBloom",
            expected: 256,
            got: items[2].len(),
        });
    }
    let logs = decode_logs(&items[3])?;
    Ok(TransactionReceipt {
        status,
        cumulative_gas_used,
        logs_bloom,
        logs,
    })
}

/// Decode the RLP-encoded list of logs carried inside a receipt.
pub fn decode_logs(logs_rlp: &[u8]) -> Result<Vec<Log>> {
    let log_items = decode_list_items(logs_rlp)?;
    log_items.iter().map(|item| decode_log(item)).collect()
}

fn decode_log(log_rlp: &[u8]) -> Result<Log> {
    let fields = decode_node(log_rlp)?;
    if fields.len() != 3 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "log",
            expected: 3,
            got: fields.len(),
        });
    }
    let address = field_address(&fields[0], "log.address")?;
    let topic_items = decode_list_items(&fields[1])?;
    let topics = topic_items
        .iter()
        .map(|t| field_b256(t, "log.topic"))
        .collect::<Result<Vec<_>>>()?;
    Ok(Log {
        address,
        topics,
        data: Bytes::copy_from_slice(&fields[2]),
    })
}

/// Typed-transaction fields decoded straight from the raw RLP, minus
/// `from` and `hash` — the raw bytes carry neither: `from` is only
/// recoverable from the ECDSA signature (out of scope, see `DESIGN.md`)
/// and `hash` is simply `keccak256` of these same bytes, computed by
/// `transaction_hash` instead of being threaded through here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedTx {
    Legacy {
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        input: Bytes,
    },
    Eip2930 {
        chain_id: u64,
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        input: Bytes,
        access_list: Vec<(Address, Vec<B256>)>,
    },
    Eip1559 {
        chain_id: u64,
        nonce: u64,
        max_priority_fee_per_gas: U256,
        max_fee_per_gas: U256,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        input: Bytes,
        access_list: Vec<(Address, Vec<B256>)>,
    },
    Eip4844 {
        chain_id: u64,
        nonce: u64,
        max_priority_fee_per_gas: U256,
        max_fee_per_gas: U256,
        gas_limit: u64,
        to: Address,
        value: U256,
        input: Bytes,
        access_list: Vec<(Address, Vec<B256>)>,
        max_fee_per_blob_gas: U256,
        blob_versioned_hashes: Vec<B256>,
    },
    /// OP-stack deposit transactions carry `from` directly in the RLP
    /// (there is no signature to recover it from), so it is decoded here.
    OpDeposit {
        source_hash: B256,
        from: Address,
        to: Option<Address>,
        mint: U256,
        value: U256,
        gas_limit: u64,
        is_system_tx: bool,
        input: Bytes,
    },
}

fn decode_to(bytes: &[u8]) -> Result<Option<Address>> {
    if bytes.is_empty() {
        Ok(None)
    } else {
        Ok(Some(field_address(bytes, "tx.to")?))
    }
}

/// EIP-2718 envelope dispatch: legacy transactions start with an RLP list
/// (first byte >= 0xc0); typed transactions are `type_byte || rlp(fields)`
/// with `type_byte` in `0x00..=0x7f`.
pub fn decode_transaction(raw: &[u8]) -> Result<DecodedTx> {
    let Some(&first) = raw.first() else {
        return Err(ExecutionDecodeError::EmptyTransaction);
    };
    if first >= 0xc0 {
        return decode_legacy(raw);
    }
    match first {
        0x01 => decode_eip2930(&raw[1..]),
        0x02 => decode_eip1559(&raw[1..]),
        0x03 => decode_eip4844(&raw[1..]),
        0x7e => decode_op_deposit(&raw[1..]),
        other => Err(ExecutionDecodeError::UnknownTxType(other)),
    }
}

fn decode_legacy(raw: &[u8]) -> Result<DecodedTx> {
    let items = decode_node(raw)?;
    if items.len() != 9 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "legacy tx",
            expected: 9,
            got: items.len(),
        });
    }
    Ok(DecodedTx::Legacy {
        nonce: decode_uint64(&items[0]),
        gas_price: field_u256(&items[1]),
        gas_limit: decode_uint64(&items[2]),
        to: decode_to(&items[3])?,
        value: field_u256(&items[4]),
        input: Bytes::copy_from_slice(&items[5]),
    })
}

fn decode_access_list(bytes: &[u8]) -> Result<Vec<(Address, Vec<B256>)>> {
    let entries = decode_list_items(bytes)?;
    entries
        .iter()
        .map(|entry_rlp| {
            let fields = decode_node(entry_rlp)?;
            if fields.len() != 2 {
                return Err(ExecutionDecodeError::FieldCount {
                    what: "access-list entry",
                    expected: 2,
                    got: fields.len(),
                });
            }
            let address = field_address(&fields[0], "access-list.address")?;
            let keys = decode_list_items(&fields[1])?
                .iter()
                .map(|k| field_b256(k, "access-list.storageKey"))
                .collect::<Result<Vec<_>>>()?;
            Ok((address, keys))
        })
        .collect()
}

fn decode_eip2930(body: &[u8]) -> Result<DecodedTx> {
    let items = decode_node(body)?;
    if items.len() != 11 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "EIP-2930 tx",
            expected: 11,
            got: items.len(),
        });
    }
    Ok(DecodedTx::Eip2930 {
        chain_id: decode_uint64(&items[0]),
        nonce: decode_uint64(&items[1]),
        gas_price: field_u256(&items[2]),
        gas_limit: decode_uint64(&items[3]),
        to: decode_to(&items[4])?,
        value: field_u256(&items[5]),
        input: Bytes::copy_from_slice(&items[6]),
        access_list: decode_access_list(&items[7])?,
    })
}

fn decode_eip1559(body: &[u8]) -> Result<DecodedTx> {
    let items = decode_node(body)?;
    if items.len() != 12 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "EIP-1559 tx",
            expected: 12,
            got: items.len(),
        });
    }
    Ok(DecodedTx::Eip1559 {
        chain_id: decode_uint64(&items[0]),
        nonce: decode_uint64(&items[1]),
        max_priority_fee_per_gas: field_u256(&items[2]),
        max_fee_per_gas: field_u256(&items[3]),
        gas_limit: decode_uint64(&items[4]),
        to: decode_to(&items[5])?,
        value: field_u256(&items[6]),
        input: Bytes::copy_from_slice(&items[7]),
        access_list: decode_access_list(&items[8])?,
    })
}

fn decode_eip4844(body: &[u8]) -> Result<DecodedTx> {
    let items = decode_node(body)?;
    if items.len() != 14 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "EIP-4844 tx",
            expected: 14,
            got: items.len(),
        });
    }
    let access_list = decode_access_list(&items[8])?;
    let to = field_address(&items[5], "tx.to")?;
    let blob_versioned_hashes = decode_list_items(&items[10])?
        .iter()
        .map(|h| field_b256(h, "tx.blobVersionedHash"))
        .collect::<Result<Vec<_>>>()?;
    Ok(DecodedTx::Eip4844 {
        chain_id: decode_uint64(&items[0]),
        nonce: decode_uint64(&items[1]),
        max_priority_fee_per_gas: field_u256(&items[2]),
        max_fee_per_gas: field_u256(&items[3]),
        gas_limit: decode_uint64(&items[4]),
        to,
        value: field_u256(&items[6]),
        input: Bytes::copy_from_slice(&items[7]),
        access_list,
        max_fee_per_blob_gas: field_u256(&items[9]),
        blob_versioned_hashes,
    })
}

fn decode_op_deposit(body: &[u8]) -> Result<DecodedTx> {
    let items = decode_node(body)?;
    if items.len() != 8 {
        return Err(ExecutionDecodeError::FieldCount {
            what: "deposit tx",
            expected: 8,
            got: items.len(),
        });
    }
    Ok(DecodedTx::OpDeposit {
        source_hash: field_b256(&items[0], "tx.sourceHash")?,
        from: field_address(&items[1], "tx.from")?,
        to: decode_to(&items[2])?,
        mint: field_u256(&items[3]),
        value: field_u256(&items[4]),
        gas_limit: decode_uint64(&items[5]),
        is_system_tx: items[6].first().copied().unwrap_or(0) != 0,
        input: Bytes::copy_from_slice(&items[7]),
    })
}

impl DecodedTx {
    /// Whether the decoded wire fields agree with a claimed `TxData`. Does
    /// not, and cannot, check `from` for signed envelopes — see the
    /// module's `DecodedTx` doc comment.
    pub fn matches_claim(&self, claim: &TxData) -> bool {
        match (self, claim) {
            (
                DecodedTx::Legacy {
                    nonce,
                    gas_price,
                    gas_limit,
                    to,
                    value,
                    input,
                },
                TxData::Legacy(t),
            ) => {
                *nonce == t.nonce
                    && *gas_price == t.gas_price
                    && *gas_limit == t.gas_limit
                    && *to == t.to
                    && *value == t.value
                    && input == &t.input
            }
            (
                DecodedTx::Eip2930 {
                    chain_id,
                    nonce,
                    gas_price,
                    gas_limit,
                    to,
                    value,
                    input,
                    access_list,
                },
                TxData::Eip2930(t),
            ) => {
                *chain_id == t.chain_id
                    && *nonce == t.nonce
                    && *gas_price == t.gas_price
                    && *gas_limit == t.gas_limit
                    && *to == t.to
                    && *value == t.value
                    && input == &t.input
                    && access_list == &t.access_list
            }
            (
                DecodedTx::Eip1559 {
                    chain_id,
                    nonce,
                    max_priority_fee_per_gas,
                    max_fee_per_gas,
                    gas_limit,
                    to,
                    value,
                    input,
                    access_list,
                },
                TxData::Eip1559(t),
            ) => {
                *chain_id == t.chain_id
                    && *nonce == t.nonce
                    && *max_priority_fee_per_gas == t.max_priority_fee_per_gas
                    && *max_fee_per_gas == t.max_fee_per_gas
                    && *gas_limit == t.gas_limit
                    && *to == t.to
                    && *value == t.value
                    && input == &t.input
                    && access_list == &t.access_list
            }
            (
                DecodedTx::Eip4844 {
                    chain_id,
                    nonce,
                    max_priority_fee_per_gas,
                    max_fee_per_gas,
                    gas_limit,
                    to,
                    value,
                    input,
                    access_list,
                    max_fee_per_blob_gas,
                    blob_versioned_hashes,
                },
                TxData::Eip4844(t),
            ) => {
                *chain_id == t.chain_id
                    && *nonce == t.nonce
                    && *max_priority_fee_per_gas == t.max_priority_fee_per_gas
                    && *max_fee_per_gas == t.max_fee_per_gas
                    && *gas_limit == t.gas_limit
                    && *to == t.to
                    && *value == t.value
                    && input == &t.input
                    && access_list == &t.access_list
                    && *max_fee_per_blob_gas == t.max_fee_per_blob_gas
                    && blob_versioned_hashes == &t.blob_versioned_hashes
            }
            (
                DecodedTx::OpDeposit {
                    source_hash,
                    from,
                    to,
                    mint,
                    value,
                    gas_limit,
                    is_system_tx,
                    input,
                },
                TxData::OpDeposit(t),
            ) => {
                *source_hash == t.source_hash
                    && *from == t.from
                    && *to == t.to
                    && *mint == t.mint
                    && *value == t.value
                    && *gas_limit == t.gas_limit
                    && *is_system_tx == t.is_system_tx
                    && input == &t.input
            }
            _ => false,
        }
    }
}

/// The canonical transaction hash (EIP-2718 §"Transactions"): `keccak256`
/// of the raw bytes exactly as they appear on the wire, type prefix
/// included for typed envelopes.
pub fn transaction_hash(raw: &[u8]) -> B256 {
    B256::from(keccak256(raw))
}
