//! Typed claims over the relay's sparse Merkle tree.
//!
//! A claim is a fixed-width [`Data`](relay_merkle::Data) record whose last
//! slot carries a `(type, version)` header. Claims of every version of the
//! same logical statement occupy distinct leaves; revocation is the insertion
//! of the next version, which turns the non-existence proof of `version + 1`
//! stale. [`ProofOfClaim`] stacks per-tree existence/non-existence proof
//! pairs and a signed, timestamped root.

#![deny(unsafe_code)]

mod claim;
mod claim_assign_name;
mod claim_authorize_ksign_babyjub;
mod claim_authorize_ksign_secp256k1;
mod claim_basic;
mod claim_link_object_identity;
mod claim_set_root_key;
mod proof;

pub use claim::{
    get_claim_type_version, next_version_entry, set_claim_type_version, Claim, ClaimError,
    ClaimType, CLAIM_TYPE_VERSION_LEN,
};
pub use claim_assign_name::ClaimAssignName;
pub use claim_authorize_ksign_babyjub::ClaimAuthorizeKSignBabyJub;
pub use claim_authorize_ksign_secp256k1::ClaimAuthorizeKSignSecp256k1;
pub use claim_basic::ClaimBasic;
pub use claim_link_object_identity::{ClaimLinkObjectIdentity, ObjectType};
pub use claim_set_root_key::ClaimSetRootKey;
pub use proof::{
    verify_proof_claim, ProofClaimError, ProofOfClaim, ProofOfClaimPartial, SetRootAux,
    CLAIM_TREE_DEPTH,
};
