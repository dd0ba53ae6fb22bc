//! The request envelope (`spec.md` §3) and the data-request interface used
//! by the driver (C7) to declare what external data it still needs.

use serde::{Deserialize, Serialize};

use super::beacon::LightClientUpdate;
use super::proof::Proof;

/// Chain family byte — the first byte of every encoded request envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u8);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
}

/// The JSON-RPC method a proof is meant to substantiate. Only methods the
/// verifier knows how to map to a proof kind are representable here;
/// anything else is `UnsupportedMethod` at decode time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    EthGetBlockByNumber { number: u64, full_tx: bool },
    EthGetBlockByHash { hash: [u8; 32], full_tx: bool },
    EthGetBalance { address: [u8; 20] },
    EthGetStorageAt { address: [u8; 20], slot: [u8; 32] },
    EthGetTransactionCount { address: [u8; 20] },
    EthGetTransactionByHash { hash: [u8; 32] },
    EthGetTransactionReceipt { hash: [u8; 32] },
    EthGetLogs { filter: LogFilter },
    EthCall { to: [u8; 20], data: Vec<u8> },
    LightClientSync,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub addresses: Vec<[u8; 20]>,
    pub topics: Vec<Vec<[u8; 32]>>,
    pub from_block: u64,
    pub to_block: u64,
}

/// The decoded request envelope: a chain family byte followed by three
/// optional sub-objects.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub chain: ChainId,
    pub data: Option<Vec<u8>>,
    pub proof: Option<Proof>,
    pub sync_data: Vec<LightClientUpdate>,
}

/// HTTP-ish method for a declared external data request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// The kind of external source a data request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataRequestKind {
    EthRpc,
    BeaconApi,
    RestApi,
}

/// The wire encoding a data-request response is expected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Json,
    Ssz,
}

/// A declared external data requirement (`spec.md` §6). The driver never
/// performs I/O itself — it appends these to a queue and the embedder
/// drains them, supplying a response via `deliver_response`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataRequest {
    pub chain: ChainId,
    pub kind: DataRequestKind,
    pub method: HttpMethod,
    pub url: String,
    pub payload: Option<Vec<u8>>,
    pub encoding: Encoding,
    /// SHA-256 of `url`, used as a stable identifier a caller echoes back
    /// in `deliver_response`.
    pub id: [u8; 32],
}

impl DataRequest {
    pub fn new(
        chain: ChainId,
        kind: DataRequestKind,
        method: HttpMethod,
        url: String,
        payload: Option<Vec<u8>>,
        encoding: Encoding,
    ) -> Self {
        let id = crate::codec::ssz::sha256(url.as_bytes());
        Self {
            chain,
            kind,
            method,
            url,
            payload,
            encoding,
            id,
        }
    }
}

/// The response to a previously declared `DataRequest`.
#[derive(Clone, Debug)]
pub enum DataResponse {
    Bytes(Vec<u8>),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_request_id_is_sha256_of_url() {
        let req = DataRequest::new(
            ChainId::ETHEREUM,
            DataRequestKind::BeaconApi,
            HttpMethod::Get,
            "https://example.invalid/light_client/updates".to_string(),
            None,
            Encoding::Json,
        );
        assert_eq!(
            req.id,
            crate::codec::ssz::sha256(b"https://example.invalid/light_client/updates")
        );
    }
}
