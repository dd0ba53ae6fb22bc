//! The top-level error enum (`spec.md` §7), wrapping each component's own
//! error via `#[from]` so a caller matches once instead of threading every
//! component's error type through the driver and verifiers individually.
//! Generalizes the teacher's per-module `VerificationError`/`ProofError`/
//! `CheckpointError` split into the single enum `spec.md` requires, while
//! keeping those component errors around as the `#[from]` sources.

use thiserror::Error;

use crate::codec::envelope::EnvelopeError;
use crate::codec::rlp::RlpError;
use crate::consensus::light_client::UpdateError;
use crate::consensus::signing::SigningError;
use crate::merkle::MerkleError;
use crate::storage::StorageError;
use crate::store::StoreError;
use crate::trie::TrieError;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed input: {reason}")]
    BadFormat { reason: String },

    #[error("proof inconsistency: {reason}")]
    BadProof { reason: String },

    #[error("signature verification failed: {reason}")]
    BadSignature { reason: String },

    #[error(
        "sync committee missing for period(s) {first_missing_period}..={last_missing_period}"
    )]
    CommitteeMissing {
        first_missing_period: u64,
        last_missing_period: u64,
    },

    #[error("unsupported chain family")]
    UnsupportedChain,

    #[error("unsupported RPC method")]
    UnsupportedMethod,

    #[error("method cannot be substantiated by a proof: {reason}")]
    MethodNotProofable { reason: String },

    #[error("proof and requested data refer to different entities: {reason}")]
    DataMismatch { reason: String },

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<EnvelopeError> for VerifyError {
    fn from(e: EnvelopeError) -> Self {
        VerifyError::BadFormat {
            reason: e.to_string(),
        }
    }
}

impl From<RlpError> for VerifyError {
    fn from(e: RlpError) -> Self {
        VerifyError::BadFormat {
            reason: e.to_string(),
        }
    }
}

impl From<MerkleError> for VerifyError {
    fn from(e: MerkleError) -> Self {
        VerifyError::BadProof {
            reason: e.to_string(),
        }
    }
}

impl From<TrieError> for VerifyError {
    fn from(e: TrieError) -> Self {
        VerifyError::BadProof {
            reason: e.to_string(),
        }
    }
}

impl From<SigningError> for VerifyError {
    fn from(e: SigningError) -> Self {
        VerifyError::BadSignature {
            reason: e.to_string(),
        }
    }
}

impl From<StoreError> for VerifyError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Storage(inner) => VerifyError::StorageError(inner),
            other => VerifyError::BadFormat {
                reason: other.to_string(),
            },
        }
    }
}

impl From<UpdateError> for VerifyError {
    fn from(e: UpdateError) -> Self {
        match e {
            UpdateError::CommitteeMissing {
                first_missing_period,
                last_missing_period,
            } => VerifyError::CommitteeMissing {
                first_missing_period,
                last_missing_period,
            },
            UpdateError::Signing(inner) => inner.into(),
            UpdateError::Merkle(inner) => inner.into(),
            UpdateError::Store(inner) => inner.into(),
            other => VerifyError::BadProof {
                reason: other.to_string(),
            },
        }
    }
}
