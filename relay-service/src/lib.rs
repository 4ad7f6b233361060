//! The identity-claims service.
//!
//! [`ClaimService`] maintains the relay's own sparse Merkle tree plus one
//! sub-tree per identity (stored under the identity's byte prefix), inserts
//! versioned claims, assembles composite existence/non-existence proofs
//! across both levels, and reports every new relay root to a [`RootAnchor`],
//! which forwards changed roots to an external sink from a background pump.

#![deny(unsafe_code)]

mod anchor;
mod error;
mod service;

pub use anchor::{RootAnchor, RootSink, SinkError};
pub use error::ServiceError;
pub use service::{
    check_ksign_in_iddb, get_next_version, ClaimAuthorizeKSignMsg, ClaimService, ClaimValueMsg,
    COMMIT_ROOT_MAX_AGE_SECS, RELAY_TREE_PREFIX,
};
