use relay_core::{ClaimError, ProofClaimError};
use relay_merkle::MerkleTreeError;
use relay_storage::StorageError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// The next version of the claim exists, so the claim is revoked and no
    /// freshness proof can be produced for it.
    #[error("the claim is revoked: the next version exists")]
    RevokedClaim,

    /// A signature didn't verify, a request timestamp fell outside the replay
    /// window, or the signing key isn't authorised in the identity's tree.
    #[error("authorization failed: {0}")]
    InvalidAuth(&'static str),

    /// A genesis claim read back from the tree differs from the expected one.
    #[error("stored genesis claim doesn't match the expected claim")]
    GenesisClaimMismatch,

    #[error(transparent)]
    Merkle(#[from] MerkleTreeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    ProofClaim(#[from] ProofClaimError),

    #[error("signing failed: {0}")]
    Crypto(#[from] relay_crypto::Error),
}
