use crate::{next_version_entry, ClaimSetRootKey};

use relay_crypto::{verify_eth_msg, PublicKey, SignatureEthMsg};
use relay_merkle::{verify_proof, Data, Entry, Proof};
use relay_types::{Hash, Id};

/// Depth of the relay tree and of every per-identity sub-tree.
pub const CLAIM_TREE_DEPTH: u32 = 140;

/// Auxiliary data carried by an inner proof level: everything needed to
/// rebuild the set-root claim that publishes this level's root one tree up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetRootAux {
    pub version: u32,
    pub era: u32,
    pub id: Id,
}

/// Proof of existence and of non-revocation of a claim in a single tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProofOfClaimPartial {
    /// Inclusion proof of the claim.
    #[serde(with = "proof_hex")]
    pub mtp0: Proof,
    /// Non-existence proof of the claim's next version.
    #[serde(with = "proof_hex")]
    pub mtp1: Proof,
    /// The tree root both proofs are anchored to.
    pub root: Hash,
    /// Present on every level but the outermost.
    pub aux: Option<SetRootAux>,
}

/// A complete claim proof: one [`ProofOfClaimPartial`] per tree level,
/// innermost first, plus the leaf payload and the relay's signature over the
/// outermost root and the emission date.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProofOfClaim {
    pub proofs: Vec<ProofOfClaimPartial>,
    pub leaf: Data,
    pub date: u64,
    pub signature: SignatureEthMsg,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofClaimError {
    #[error("the proof carries no levels")]
    Empty,

    #[error("the root signature does not verify")]
    InvalidSignature,

    #[error("level {0}: expected an existence proof")]
    NotExistence(usize),

    #[error("level {0}: the existence proof does not verify")]
    ExistenceProof(usize),

    #[error("level {0}: the next-version proof claims existence")]
    NotNonExistence(usize),

    #[error("level {0}: the non-existence proof does not verify")]
    NonExistenceProof(usize),

    #[error("level {0}: missing set-root aux data")]
    MissingAux(usize),
}

/// Check a [`ProofOfClaim`] against the relay's public key.
///
/// Every level must prove inclusion of its leaf and non-existence of the
/// leaf's next version; each inner level's root must be republished by a
/// set-root claim one level up, rebuilt from the level's aux data; and the
/// outermost root must carry a valid Ethereum-message signature over
/// `root ‖ u64_be(date)`.
pub fn verify_proof_claim(
    relay_pub_key: &PublicKey,
    proof: &ProofOfClaim,
) -> Result<(), ProofClaimError> {
    let outermost = proof.proofs.last().ok_or(ProofClaimError::Empty)?;

    let mut signed = outermost.root.to_vec();
    signed.extend_from_slice(&proof.date.to_be_bytes());
    if !verify_eth_msg(&relay_pub_key.address(), &proof.signature, &signed) {
        return Err(ProofClaimError::InvalidSignature);
    }

    let mut leaf = Entry::new(proof.leaf);
    for (level, partial) in proof.proofs.iter().enumerate() {
        if !partial.mtp0.existence() {
            return Err(ProofClaimError::NotExistence(level));
        }
        if !verify_proof(&partial.root, &partial.mtp0, &leaf.hindex(), &leaf.hvalue()) {
            return Err(ProofClaimError::ExistenceProof(level));
        }

        let next = next_version_entry(&leaf.data);
        if partial.mtp1.existence() {
            return Err(ProofClaimError::NotNonExistence(level));
        }
        if !verify_proof(&partial.root, &partial.mtp1, &next.hindex(), &next.hvalue()) {
            return Err(ProofClaimError::NonExistenceProof(level));
        }

        if level == proof.proofs.len() - 1 {
            break;
        }
        let aux = partial
            .aux
            .as_ref()
            .ok_or(ProofClaimError::MissingAux(level))?;
        let set_root_key = ClaimSetRootKey {
            version: aux.version,
            era: aux.era,
            id: aux.id,
            root_key: partial.root,
        };
        leaf = set_root_key.entry();
    }

    Ok(())
}

/// Proofs travel as `0x`-prefixed hex of their wire bytes.
mod proof_hex {
    use super::CLAIM_TREE_DEPTH;
    use relay_merkle::Proof;

    pub fn serialize<S>(proof: &Proof, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&format_args!("0x{}", hex::encode(proof.to_bytes())))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Proof, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Proof::from_bytes(CLAIM_TREE_DEPTH, &bytes).map_err(serde::de::Error::custom)
    }
}
