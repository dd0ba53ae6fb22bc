//! The request envelope framing (`spec.md` §3, resolved per `SPEC_FULL.md`
//! §3): a chain-family byte followed by three optional sub-objects, each
//! preceded by a 1-byte presence flag and a little-endian `u32` length
//! prefix.
//!
//! The outer framing is hand-rolled exactly as the spec describes it,
//! since it's the one piece of the wire format the spec pins down byte by
//! byte. The inner `proof`/`sync_data` payloads are not themselves
//! cryptographically load-bearing (nothing hashes or proves over the
//! envelope's own encoding — only the beacon-layer containers it carries
//! are hash-tree-rooted), so they're serialized with `bincode` rather than
//! a hand-rolled byte-exact SSZ union decoder for every irregular proof
//! variant; see `DESIGN.md`.

use thiserror::Error;

use crate::types::request::{ChainId, RequestEnvelope};
use crate::types::LightClientUpdate;
use crate::types::Proof;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("request envelope is empty")]
    Empty,
    #[error("unsupported chain family byte {byte}")]
    UnsupportedChain { byte: u8 },
    #[error("truncated envelope: expected {expected} more bytes, have {available}")]
    Truncated { expected: usize, available: usize },
    #[error("invalid presence flag byte {byte}, expected 0 or 1")]
    InvalidPresenceFlag { byte: u8 },
    #[error("failed to decode inner payload: {reason}")]
    InnerDecodeFailed { reason: String },
}

fn read_u32(data: &[u8], offset: usize) -> Result<(u32, usize), EnvelopeError> {
    if data.len() < offset + 4 {
        return Err(EnvelopeError::Truncated {
            expected: 4,
            available: data.len().saturating_sub(offset),
        });
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    Ok((u32::from_le_bytes(buf), offset + 4))
}

/// Read one `{presence flag, u32 length, payload}` slot, returning the raw
/// payload bytes (or `None` if absent) and the offset past it.
fn read_slot(data: &[u8], offset: usize) -> Result<(Option<&[u8]>, usize), EnvelopeError> {
    let flag = *data
        .get(offset)
        .ok_or(EnvelopeError::Truncated {
            expected: 1,
            available: 0,
        })?;
    let offset = offset + 1;
    match flag {
        0 => Ok((None, offset)),
        1 => {
            let (len, offset) = read_u32(data, offset)?;
            let len = len as usize;
            if data.len() < offset + len {
                return Err(EnvelopeError::Truncated {
                    expected: len,
                    available: data.len() - offset,
                });
            }
            Ok((Some(&data[offset..offset + len]), offset + len))
        }
        other => Err(EnvelopeError::InvalidPresenceFlag { byte: other }),
    }
}

fn write_slot(out: &mut Vec<u8>, payload: Option<&[u8]>) {
    match payload {
        None => out.push(0),
        Some(bytes) => {
            out.push(1);
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
    }
}

/// Decode a request envelope from its wire bytes.
pub fn decode_envelope(data: &[u8]) -> Result<RequestEnvelope, EnvelopeError> {
    let chain_byte = *data.first().ok_or(EnvelopeError::Empty)?;
    if chain_byte != ChainId::ETHEREUM.0 {
        return Err(EnvelopeError::UnsupportedChain { byte: chain_byte });
    }
    let chain = ChainId(chain_byte);

    let (data_slot, offset) = read_slot(data, 1)?;
    let (proof_slot, offset) = read_slot(data, offset)?;
    let (sync_slot, _offset) = read_slot(data, offset)?;

    let proof = match proof_slot {
        None => None,
        Some(bytes) => Some(decode_proof(bytes)?),
    };

    let sync_data = match sync_slot {
        None => Vec::new(),
        Some(bytes) => bincode::deserialize::<Vec<LightClientUpdate>>(bytes).map_err(|e| {
            EnvelopeError::InnerDecodeFailed {
                reason: e.to_string(),
            }
        })?,
    };

    Ok(RequestEnvelope {
        chain,
        data: data_slot.map(|b| b.to_vec()),
        proof,
        sync_data,
    })
}

/// Encode a request envelope to its wire bytes.
pub fn encode_envelope(envelope: &RequestEnvelope) -> Result<Vec<u8>, EnvelopeError> {
    let mut out = vec![envelope.chain.0];
    write_slot(&mut out, envelope.data.as_deref());

    let proof_bytes = envelope
        .proof
        .as_ref()
        .map(encode_proof)
        .transpose()?;
    write_slot(&mut out, proof_bytes.as_deref());

    let sync_bytes = if envelope.sync_data.is_empty() {
        None
    } else {
        Some(bincode::serialize(&envelope.sync_data).map_err(|e| {
            EnvelopeError::InnerDecodeFailed {
                reason: e.to_string(),
            }
        })?)
    };
    write_slot(&mut out, sync_bytes.as_deref());

    Ok(out)
}

/// Decode a proof union value: one selector byte (`spec.md` §3's ordering,
/// `0..=7`) followed by the `bincode`-encoded variant payload.
fn decode_proof(data: &[u8]) -> Result<Proof, EnvelopeError> {
    let selector = *data.first().ok_or(EnvelopeError::Empty)?;
    let rest = &data[1..];
    let decode_err = |e: bincode::Error| EnvelopeError::InnerDecodeFailed {
        reason: e.to_string(),
    };
    Ok(match selector {
        0 => Proof::BlockHash(bincode::deserialize(rest).map_err(decode_err)?),
        1 => Proof::Account(bincode::deserialize(rest).map_err(decode_err)?),
        2 => Proof::Transaction(bincode::deserialize(rest).map_err(decode_err)?),
        3 => Proof::Receipt(bincode::deserialize(rest).map_err(decode_err)?),
        4 => Proof::Logs(bincode::deserialize(rest).map_err(decode_err)?),
        5 => Proof::Call(bincode::deserialize(rest).map_err(decode_err)?),
        6 => Proof::Block(bincode::deserialize(rest).map_err(decode_err)?),
        7 => Proof::Sync(bincode::deserialize(rest).map_err(decode_err)?),
        other => {
            return Err(EnvelopeError::InnerDecodeFailed {
                reason: format!("proof selector {other} out of range (expected 0..=7)"),
            })
        }
    })
}

fn encode_proof(proof: &Proof) -> Result<Vec<u8>, EnvelopeError> {
    let encode_err = |e: bincode::Error| EnvelopeError::InnerDecodeFailed {
        reason: e.to_string(),
    };
    let mut out = vec![proof.selector()];
    let body = match proof {
        Proof::BlockHash(p) => bincode::serialize(p),
        Proof::Account(p) => bincode::serialize(p),
        Proof::Transaction(p) => bincode::serialize(p),
        Proof::Receipt(p) => bincode::serialize(p),
        Proof::Logs(p) => bincode::serialize(p),
        Proof::Call(p) => bincode::serialize(p),
        Proof::Block(p) => bincode::serialize(p),
        Proof::Sync(p) => bincode::serialize(p),
    }
    .map_err(encode_err)?;
    out.extend_from_slice(&body);
    Ok(out)
}
