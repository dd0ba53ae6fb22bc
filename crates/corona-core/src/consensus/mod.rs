pub mod gindex;
pub mod light_client;
pub mod signing;

pub use light_client::{
    process_bootstrap, process_update, process_updates, resolve_signing_committee,
    verify_header_signature, BatchOutcome, CommitteeOutcome, UpdateError,
};
pub use signing::{
    block_root, compute_domain, compute_fork_data_root, compute_signing_root, BlsVerifier,
    BlstVerifier, SigningError,
};
