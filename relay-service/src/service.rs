use crate::{anchor::RootAnchor, error::ServiceError};

use relay_core::{
    get_claim_type_version, next_version_entry, set_claim_type_version, ClaimAssignName,
    ClaimAuthorizeKSignBabyJub, ClaimAuthorizeKSignSecp256k1, ClaimBasic, ClaimSetRootKey,
    ProofOfClaim, ProofOfClaimPartial, SetRootAux, CLAIM_TREE_DEPTH,
};
use relay_crypto::{unix_now, verify_eth_msg, EthSigner, PublicKey, SignatureEthMsg};
use relay_merkle::{Data, Entry, MerkleTree, MerkleTreeError, Proof};
use relay_storage::Storage;
use relay_types::{Hash, Id};

use std::sync::Arc;

/// Replay window for [`ClaimService::commit_new_id_root`] requests, in
/// seconds.
pub const COMMIT_ROOT_MAX_AGE_SECS: u64 = 30;

/// Reserved top-level storage prefix of the relay tree. Identity sub-trees
/// live under the relay view at their identity's byte prefix.
pub const RELAY_TREE_PREFIX: &[u8] = &[0x00];

/// A key-authorization claim submitted by an identity, signed with the very
/// key being exercised.
#[derive(Debug, Clone)]
pub struct ClaimAuthorizeKSignMsg {
    pub claim: ClaimAuthorizeKSignBabyJub,
    pub ksign_pk: PublicKey,
    pub signature: SignatureEthMsg,
}

/// An opaque claim value submitted by an identity under one of its
/// authorized keys.
#[derive(Debug, Clone)]
pub struct ClaimValueMsg {
    pub claim_value: Entry,
    pub ksign_pk: PublicKey,
    pub signature: SignatureEthMsg,
}

/// The relay's claims service.
///
/// Holds the relay tree, opens one sub-tree per identity on demand (the
/// sub-tree's storage prefix is the identity's bytes), and publishes every
/// sub-tree root into the relay tree as a versioned [`ClaimSetRootKey`].
/// Composite operations across the two levels are not atomic; a crash in
/// between leaves the relay one claim behind until the next publish, which
/// the versioning makes idempotent to re-issue.
pub struct ClaimService<S: Storage> {
    id: Id,
    mt: Arc<MerkleTree<S>>,
    anchor: Arc<RootAnchor>,
    signer: Arc<EthSigner>,
}

impl<S: Storage> ClaimService<S> {
    pub fn new(
        id: Id,
        mt: Arc<MerkleTree<S>>,
        anchor: Arc<RootAnchor>,
        signer: Arc<EthSigner>,
    ) -> Self {
        Self {
            id,
            mt,
            anchor,
            signer,
        }
    }

    /// The relay's own identity.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The relay tree.
    pub fn mt(&self) -> &MerkleTree<S> {
        &self.mt
    }

    /// Open the sub-tree of `id`, stored under the identity's byte prefix at
    /// the same depth as the relay tree.
    fn user_tree(&self, id: &Id) -> Result<MerkleTree<S>, ServiceError> {
        let storage = self.mt.storage().with_prefix(id.bytes());
        Ok(MerkleTree::open(storage, CLAIM_TREE_DEPTH)?)
    }

    fn notify_root(&self) {
        self.anchor.set_root(self.mt.root());
    }

    /// Insert the user sub-tree's current root into the relay tree as the
    /// next version of the identity's set-root claim.
    fn publish_user_root(
        &self,
        id: &Id,
        user_root: Hash,
    ) -> Result<ClaimSetRootKey, ServiceError> {
        let mut set_root_key = ClaimSetRootKey::new(*id, user_root);
        set_root_key.version = get_next_version(&self.mt, &set_root_key.entry().hindex())?;
        self.mt.add(&set_root_key.entry())?;
        tracing::debug!(id = %id, version = set_root_key.version, "published user root");
        self.notify_root();
        Ok(set_root_key)
    }

    /// Insert a basic claim directly into the relay tree.
    pub fn add_direct_claim(&self, claim: ClaimBasic) -> Result<(), ServiceError> {
        self.mt.add(&claim.entry())?;
        self.notify_root();
        Ok(())
    }

    /// Insert a name-assignment claim into the relay tree at its next free
    /// version.
    pub fn add_claim_assign_name(&self, mut claim: ClaimAssignName) -> Result<(), ServiceError> {
        claim.version = get_next_version(&self.mt, &claim.entry().hindex())?;
        self.mt.add(&claim.entry())?;
        tracing::info!(id = %claim.id, version = claim.version, "assigned name");
        self.notify_root();
        Ok(())
    }

    /// First key authorization of an identity: no previous key can vouch for
    /// it, so the claim is inserted without further checks.
    pub fn add_claim_authorize_ksign_first(
        &self,
        id: Id,
        claim: ClaimAuthorizeKSignBabyJub,
    ) -> Result<(), ServiceError> {
        let user_mt = self.user_tree(&id)?;
        user_mt.add(&claim.entry())?;
        self.publish_user_root(&id, user_mt.root())?;
        Ok(())
    }

    /// First secp256k1 key authorization of an identity.
    pub fn add_claim_authorize_ksign_secp256k1_first(
        &self,
        id: Id,
        claim: ClaimAuthorizeKSignSecp256k1,
    ) -> Result<(), ServiceError> {
        let user_mt = self.user_tree(&id)?;
        user_mt.add(&claim.entry())?;
        self.publish_user_root(&id, user_mt.root())?;
        Ok(())
    }

    /// Authorize a further signing key: the submitting key must already be
    /// authorized in the identity's sub-tree, and the message must be signed
    /// by it over the claim payload.
    pub fn add_claim_authorize_ksign(
        &self,
        id: Id,
        msg: ClaimAuthorizeKSignMsg,
    ) -> Result<(), ServiceError> {
        let user_mt = self.user_tree(&id)?;
        if !check_ksign_in_iddb(&user_mt, &msg.ksign_pk) {
            return Err(ServiceError::InvalidAuth("ksign is not authorized"));
        }
        if !verify_eth_msg(
            &msg.ksign_pk.address(),
            &msg.signature,
            &msg.claim.entry().bytes(),
        ) {
            return Err(ServiceError::InvalidAuth("signature can not be verified"));
        }

        user_mt.add(&msg.claim.entry())?;
        self.publish_user_root(&id, user_mt.root())?;
        Ok(())
    }

    /// Insert an opaque claim into the identity's sub-tree, with the same
    /// authorization checks as [`ClaimService::add_claim_authorize_ksign`].
    pub fn add_user_id_claim(&self, id: Id, msg: ClaimValueMsg) -> Result<(), ServiceError> {
        let user_mt = self.user_tree(&id)?;
        if !check_ksign_in_iddb(&user_mt, &msg.ksign_pk) {
            return Err(ServiceError::InvalidAuth("ksign is not authorized"));
        }
        if !verify_eth_msg(
            &msg.ksign_pk.address(),
            &msg.signature,
            &msg.claim_value.bytes(),
        ) {
            return Err(ServiceError::InvalidAuth("signature can not be verified"));
        }

        user_mt.add(&msg.claim_value)?;
        self.publish_user_root(&id, user_mt.root())?;
        Ok(())
    }

    /// Accept a sub-tree root computed on the identity's side and publish it
    /// into the relay tree.
    ///
    /// The request must be signed by an authorized key over
    /// `id ‖ root ‖ u64_be(timestamp)` and be at most
    /// [`COMMIT_ROOT_MAX_AGE_SECS`] old.
    pub fn commit_new_id_root(
        &self,
        id: Id,
        ksign_pk: &PublicKey,
        root: Hash,
        timestamp: u64,
        signature: &SignatureEthMsg,
    ) -> Result<ClaimSetRootKey, ServiceError> {
        let user_mt = self.user_tree(&id)?;
        if !check_ksign_in_iddb(&user_mt, ksign_pk) {
            return Err(ServiceError::InvalidAuth("ksign is not authorized"));
        }

        let now = unix_now();
        if now.abs_diff(timestamp) > COMMIT_ROOT_MAX_AGE_SECS {
            return Err(ServiceError::InvalidAuth("timestamp is too old"));
        }

        let mut msg = Vec::with_capacity(Id::LEN + Hash::LEN + 8);
        msg.extend_from_slice(id.bytes());
        msg.extend_from_slice(root.as_ref());
        msg.extend_from_slice(&timestamp.to_be_bytes());
        if !verify_eth_msg(&ksign_pk.address(), signature, &msg) {
            return Err(ServiceError::InvalidAuth("signature can not be verified"));
        }

        let mut set_root_key = ClaimSetRootKey::new(id, root);
        set_root_key.version = get_next_version(&self.mt, &set_root_key.entry().hindex())?;
        self.mt.add(&set_root_key.entry())?;
        self.notify_root();
        Ok(set_root_key)
    }

    /// The identity's current sub-tree root plus the relay-tree inclusion
    /// proof of its latest set-root claim.
    pub fn get_id_root(&self, id: &Id) -> Result<(Hash, Vec<u8>), ServiceError> {
        let user_mt = self.user_tree(id)?;
        let user_root = user_mt.root();

        let mut set_root_key = ClaimSetRootKey::new(*id, user_root);
        set_root_key.version = latest_version(&self.mt, &set_root_key.entry().hindex())?;

        let proof = self
            .mt
            .generate_proof(&set_root_key.entry().hindex(), None)?;
        Ok((user_root, proof.to_bytes()))
    }

    /// Proof of a claim sitting in the relay tree: inclusion, freshness
    /// (non-existence of the next version) and a signed, dated root.
    pub fn get_claim_proof_by_hi(&self, hi: &Hash) -> Result<ProofOfClaim, ServiceError> {
        let snapshot = self.mt.snapshot(&self.mt.root())?;

        let leaf_data = snapshot.get_data_by_index(hi)?;
        let mtp0 = snapshot.generate_proof(hi, None)?;
        let mtp1 = non_revocation_proof(&snapshot, &leaf_data)?;

        let root = snapshot.root();
        let (signature, date) = self.signer.sign_date(root.as_ref())?;

        Ok(ProofOfClaim {
            proofs: vec![ProofOfClaimPartial {
                mtp0,
                mtp1,
                root,
                aux: None,
            }],
            leaf: leaf_data,
            date,
            signature,
        })
    }

    /// Proof of a claim sitting in an identity's sub-tree: the user-level
    /// partial proof stacked under the relay-level proof of the identity's
    /// latest set-root claim.
    pub fn get_claim_proof_user_by_hi(
        &self,
        id: &Id,
        hi: &Hash,
    ) -> Result<ProofOfClaim, ServiceError> {
        let user_mt = self.user_tree(id)?;

        let leaf_data = user_mt.get_data_by_index(hi)?;
        let mtp0 = user_mt.generate_proof(hi, None)?;
        let mtp1 = non_revocation_proof(&user_mt, &leaf_data)?;
        let user_root = user_mt.root();

        let mut set_root_key = ClaimSetRootKey::new(*id, user_root);
        set_root_key.version = latest_version(&self.mt, &set_root_key.entry().hindex())?;

        let mut proof_claim = self.get_claim_proof_by_hi(&set_root_key.entry().hindex())?;

        let user_partial = ProofOfClaimPartial {
            mtp0,
            mtp1,
            root: user_root,
            aux: Some(SetRootAux {
                version: set_root_key.version,
                era: 0,
                id: *id,
            }),
        };
        proof_claim.proofs.insert(0, user_partial);
        proof_claim.leaf = leaf_data;
        Ok(proof_claim)
    }

    /// Seed the relay tree with its genesis claims.
    ///
    /// Re-running against an initialised tree is idempotent: an entry whose
    /// index is already taken must match the stored payload byte for byte.
    pub fn load_genesis(&self, entries: &[Entry]) -> Result<(), ServiceError> {
        for entry in entries {
            match self.mt.add(entry) {
                Ok(()) => {}
                Err(MerkleTreeError::EntryIndexAlreadyExists) => {
                    let stored = self.mt.get_data_by_index(&entry.hindex())?;
                    if stored != entry.data {
                        return Err(ServiceError::GenesisClaimMismatch);
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        tracing::info!(count = entries.len(), root = %self.mt.root(), "genesis claims loaded");
        self.notify_root();
        Ok(())
    }
}

/// First unused version of the logical claim whose version-0 index is `hi`.
///
/// Walks version after version through the tree until a read misses; the
/// probe entry is a scratch copy, so neither the tree nor the caller's data
/// is touched.
pub fn get_next_version<S: Storage>(
    tree: &MerkleTree<S>,
    hi: &Hash,
) -> Result<u32, ServiceError> {
    let mut version = 0;
    let mut hi = *hi;
    loop {
        let data = match tree.get_data_by_index(&hi) {
            Ok(data) => data,
            Err(MerkleTreeError::EntryIndexNotFound) => return Ok(version),
            Err(err) => return Err(err.into()),
        };
        let (claim_type, stored_version) = get_claim_type_version(&data);
        version = stored_version + 1;

        let mut probe = data;
        set_claim_type_version(&mut probe, claim_type, version);
        hi = Entry::new(probe).hindex();
    }
}

/// Version of the latest existing instance of the claim, i.e.
/// `get_next_version - 1`.
fn latest_version<S: Storage>(tree: &MerkleTree<S>, hi: &Hash) -> Result<u32, ServiceError> {
    get_next_version(tree, hi)?
        .checked_sub(1)
        .ok_or(ServiceError::Merkle(MerkleTreeError::EntryIndexNotFound))
}

/// Whether at least one authorize-claim for `pk` exists in the identity's
/// sub-tree. Claims are never removed, so existence of any version keeps the
/// key authorized.
pub fn check_ksign_in_iddb<S: Storage>(user_mt: &MerkleTree<S>, pk: &PublicKey) -> bool {
    let claim = ClaimAuthorizeKSignSecp256k1::new(*pk);
    matches!(
        get_next_version(user_mt, &claim.entry().hindex()),
        Ok(version) if version > 0
    )
}

/// Non-existence proof for the next version of the claim recorded in `data`.
/// An existence proof there means the claim has been revoked.
fn non_revocation_proof<S: Storage>(
    tree: &MerkleTree<S>,
    data: &Data,
) -> Result<Proof, ServiceError> {
    let next = next_version_entry(data);
    let proof = tree.generate_proof(&next.hindex(), None)?;
    if proof.existence() {
        return Err(ServiceError::RevokedClaim);
    }
    Ok(proof)
}
