//! # Corona Core
//!
//! Stateless verification logic for an Ethereum execution-layer light
//! client.
//!
//! This crate contains **no networking code** and **no host-embedding
//! glue**. It only checks that an RPC result is consistent with a beacon
//! chain checkpoint the caller already trusts — everything else (fetching
//! proofs, running an EVM, persisting sync committees across restarts) is
//! left to the embedder through the `StoragePlugin`, `EvmHost`, and
//! `BlsVerifier` traits.
//!
//! ## Trust Model
//!
//! - **Consensus verification** (`consensus` module): verifies BLS12-381
//!   aggregate signatures from the sync committee and walks light-client
//!   updates forward one sync period at a time. Trusts that 2/3+ of the
//!   committee is honest, the same assumption Ethereum itself makes.
//!
//! - **Proof verification** (`merkle`, `trie`, `verifiers` modules):
//!   verifies SSZ Merkle proofs against a beacon block root and
//!   Merkle-Patricia trie proofs against an execution state root. Zero
//!   trust assumptions beyond the beacon root a verified header carries.
//!
//! - **Request driver** (`driver` module): a synchronous, pull-based state
//!   machine that ties the above together per RPC request without ever
//!   performing I/O itself.
//!
//! ## Usage
//!
//! ```ignore
//! use corona_core::driver::{VerifyContext, StepOutcome};
//! use corona_core::store::SyncCommitteeStore;
//! use corona_core::storage::InMemoryStorage;
//!
//! let store = SyncCommitteeStore::new(InMemoryStorage::new());
//! let mut ctx = VerifyContext::init(&store, &config, &bls, &request_bytes, method, chain, None)?;
//! match ctx.step() {
//!     StepOutcome::Success(data) => { /* trust *data */ }
//!     StepOutcome::Pending => { /* drain ctx.pending_requests(), fetch, deliver_response */ }
//!     StepOutcome::Error(e) => { /* reject */ }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod consensus;
pub mod driver;
pub mod error;
pub mod evm;
pub mod merkle;
pub mod storage;
pub mod store;
pub mod trie;
pub mod types;
pub mod verifiers;

pub use config::{ForkEntry, ForkSchedule, VerifierConfig};
pub use driver::{DriverState, ErrorBox, StepOutcome, SuccessBox, VerifyContext};
pub use error::VerifyError;
pub use evm::{EmittedLog, EvmHost, TxContext};
pub use merkle::{verify_multi_leaf, verify_single_leaf, GIndex, IndexedLeaf, MerkleError};
pub use storage::{InMemoryStorage, StorageError, StoragePlugin};
pub use store::{ChainState, CommitteeLookup, StoreError, SyncCommitteeStore};
pub use trie::{keccak256, verify_trie_proof, TrieError, TrieOutcome};
