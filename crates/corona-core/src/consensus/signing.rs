//! C6: signing-domain/root computation and aggregate BLS verification.
//! Generalizes the teacher's `compute_signing_root`/`compute_domain`/
//! `verify_aggregate_bls_signature` (hard-coded to a single fork version)
//! behind a `ForkSchedule` lookup and a `BlsVerifier` trait so verifiers
//! can run against a deterministic fake in tests that don't need real
//! curve arithmetic.

use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
use blst::BLST_ERROR;
use thiserror::Error;

use crate::codec::ssz::sha256_pair;
use crate::types::beacon::{BeaconBlockHeader, BlsPublicKey, BlsSignature, BLS_DST, DOMAIN_SYNC_COMMITTEE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("no participating validators to aggregate")]
    NoParticipants,
    #[error("invalid BLS public key at committee index {index}")]
    InvalidPublicKey { index: usize },
    #[error("invalid BLS aggregate signature bytes")]
    InvalidSignature,
    #[error("failed to aggregate public keys")]
    AggregationFailed,
    #[error("BLS signature does not verify against the signing root")]
    VerificationFailed,
}

/// `hash_tree_root` of a `BeaconBlockHeader`, duplicated here under the
/// name used throughout this module (re-exported from `codec::ssz` to
/// avoid a second implementation).
pub use crate::codec::ssz::hash_tree_root_beacon_header as block_root;

/// Compute the fork-data root: `hash_tree_root({fork_version, genesis_validators_root})`.
pub fn compute_fork_data_root(fork_version: [u8; 4], genesis_validators_root: [u8; 32]) -> [u8; 32] {
    let mut version_leaf = [0u8; 32];
    version_leaf[..4].copy_from_slice(&fork_version);
    sha256_pair(&version_leaf, &genesis_validators_root)
}

/// Compute the signing domain: `DOMAIN_SYNC_COMMITTEE || fork_data_root[0..28]`.
pub fn compute_domain(fork_version: [u8; 4], genesis_validators_root: [u8; 32]) -> [u8; 32] {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&DOMAIN_SYNC_COMMITTEE);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Compute the signing root a sync committee actually signs:
/// `hash_tree_root({block_root(header), domain})`.
pub fn compute_signing_root(header: &BeaconBlockHeader, domain: [u8; 32]) -> [u8; 32] {
    let header_root = block_root(header);
    sha256_pair(&header_root, &domain)
}

/// Indirection over aggregate BLS verification (`spec.md` §6), so the
/// per-proof verifiers (C8) and the light-client update handler (C5) can
/// be exercised against a deterministic fake without linking real curve
/// arithmetic in fast unit tests.
pub trait BlsVerifier {
    fn verify_aggregate(
        &self,
        pubkeys: &[&BlsPublicKey],
        signing_root: &[u8; 32],
        signature: &BlsSignature,
    ) -> Result<(), SigningError>;
}

/// The production verifier, backed directly by `blst`.
#[derive(Default, Clone, Copy)]
pub struct BlstVerifier;

impl BlsVerifier for BlstVerifier {
    fn verify_aggregate(
        &self,
        pubkeys: &[&BlsPublicKey],
        signing_root: &[u8; 32],
        signature: &BlsSignature,
    ) -> Result<(), SigningError> {
        if pubkeys.is_empty() {
            return Err(SigningError::NoParticipants);
        }

        let sig = Signature::from_bytes(&signature.0).map_err(|_| SigningError::InvalidSignature)?;

        let keys: Vec<PublicKey> = pubkeys
            .iter()
            .enumerate()
            .map(|(i, pk)| pk.to_blst().map_err(|_| SigningError::InvalidPublicKey { index: i }))
            .collect::<Result<_, _>>()?;
        let key_refs: Vec<&PublicKey> = keys.iter().collect();

        let agg = AggregatePublicKey::aggregate(&key_refs, false)
            .map_err(|_| SigningError::AggregationFailed)?;
        let agg_pk = agg.to_public_key();

        let result = sig.verify(false, signing_root, BLS_DST, &[], &agg_pk, false);
        if result != BLST_ERROR::BLST_SUCCESS {
            return Err(SigningError::VerificationFailed);
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;

    /// Accepts every signature unconditionally. For exercising the control
    /// flow around C6 (participation thresholds, boundary fallback) without
    /// constructing real BLS material.
    #[derive(Default, Clone, Copy)]
    pub struct AlwaysValid;

    impl BlsVerifier for AlwaysValid {
        fn verify_aggregate(
            &self,
            pubkeys: &[&BlsPublicKey],
            _signing_root: &[u8; 32],
            _signature: &BlsSignature,
        ) -> Result<(), SigningError> {
            if pubkeys.is_empty() {
                return Err(SigningError::NoParticipants);
            }
            Ok(())
        }
    }

    /// Rejects every signature unconditionally.
    #[derive(Default, Clone, Copy)]
    pub struct AlwaysInvalid;

    impl BlsVerifier for AlwaysInvalid {
        fn verify_aggregate(
            &self,
            _pubkeys: &[&BlsPublicKey],
            _signing_root: &[u8; 32],
            _signature: &BlsSignature,
        ) -> Result<(), SigningError> {
            Err(SigningError::VerificationFailed)
        }
    }
}
