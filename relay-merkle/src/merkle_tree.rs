use crate::{
    entry::{Data, Entry},
    hash::zero_hash,
    node::Node,
    path::path_bit,
    proof::{NodeAux, Proof},
};

use relay_storage::{KvEntry, Storage, StorageError};
use relay_types::Hash;

use std::sync::{Mutex, RwLock};

/// Upper bound on the tree depth. The claim trees use the maximum.
pub const MAX_DEPTH: u32 = 140;

/// Reserved key holding the current root of a tree, inside its prefixed view.
const CURRENT_ROOT_KEY: &[u8] = b"currentroot";

/// Reserved key holding the persisted tree depth.
const TREE_DEPTH_KEY: &[u8] = b"treedepth";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleTreeError {
    #[error("the entry index already exists in the tree")]
    EntryIndexAlreadyExists,

    #[error("the entry index was not found in the tree")]
    EntryIndexNotFound,

    #[error("reached the maximum level of the tree placing the entry")]
    ReachedMaxLevel,

    #[error("the tree view is read-only")]
    NotWritable,

    #[error("tree depth {0} is outside the supported range")]
    InvalidDepth(u32),

    #[error("tree persisted with depth {stored}, opened with depth {requested}")]
    DepthMismatch { stored: u32, requested: u32 },

    #[error("stored node is malformed")]
    InvalidNode,

    #[error("malformed proof encoding")]
    InvalidProofBytes,

    #[error("root is not present in this storage")]
    RootNotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A fixed-depth sparse Merkle tree bound to a storage view.
///
/// A single write mutex serialises mutation; reads (proof generation, data
/// lookups, snapshots) run concurrently against the root observed at call
/// start. Every mutation lands in one atomic storage batch with the root
/// written last, so a crash never leaves a half-applied tree.
#[derive(Debug)]
pub struct MerkleTree<S: Storage> {
    storage: S,
    depth: u32,
    root: RwLock<Hash>,
    write_lock: Mutex<()>,
    writable: bool,
}

impl<S: Storage> MerkleTree<S> {
    /// Open (or initialise) the tree persisted in `storage` at the given
    /// depth. The depth is fixed at first creation; re-opening with another
    /// depth fails.
    pub fn open(storage: S, depth: u32) -> Result<Self, MerkleTreeError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(MerkleTreeError::InvalidDepth(depth));
        }

        let mut batch: Vec<KvEntry> = Vec::new();
        match storage.get(TREE_DEPTH_KEY) {
            Ok(bytes) => {
                let stored = <[u8; 4]>::try_from(bytes.as_slice())
                    .map(u32::from_be_bytes)
                    .map_err(|_| {
                        StorageError::Corruption("persisted tree depth is malformed".into())
                    })?;
                if stored != depth {
                    return Err(MerkleTreeError::DepthMismatch {
                        stored,
                        requested: depth,
                    });
                }
            }
            Err(StorageError::NotFound) => {
                batch.push((TREE_DEPTH_KEY.to_vec(), depth.to_be_bytes().to_vec()));
            }
            Err(err) => return Err(err.into()),
        }

        let root = match storage.get(CURRENT_ROOT_KEY) {
            Ok(bytes) => Hash::try_from(bytes.as_slice()).map_err(|_| {
                StorageError::Corruption("persisted tree root is malformed".into())
            })?,
            Err(StorageError::NotFound) => {
                batch.push((CURRENT_ROOT_KEY.to_vec(), zero_hash().to_vec()));
                *zero_hash()
            }
            Err(err) => return Err(err.into()),
        };

        if !batch.is_empty() {
            storage.put_batch(batch)?;
        }

        Ok(Self {
            storage,
            depth,
            root: RwLock::new(root),
            write_lock: Mutex::new(()),
            writable: true,
        })
    }

    /// The current root. The empty tree's root is the zero hash.
    pub fn root(&self) -> Hash {
        match self.root.read() {
            Ok(root) => *root,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The storage view this tree lives in.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// A read-only view of this tree at a historical root. The view shares
    /// storage with the live tree; mutation through it is rejected.
    pub fn snapshot(&self, root: &Hash) -> Result<Self, MerkleTreeError> {
        if !root.is_zero() {
            match self.storage.get(root.as_ref()) {
                Ok(_) => {}
                Err(StorageError::NotFound) => return Err(MerkleTreeError::RootNotFound),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(Self {
            storage: self.storage.clone(),
            depth: self.depth,
            root: RwLock::new(*root),
            write_lock: Mutex::new(()),
            writable: false,
        })
    }

    /// Insert a leaf. Fails with [`MerkleTreeError::EntryIndexAlreadyExists`]
    /// when a leaf with the same index is present, and with
    /// [`MerkleTreeError::ReachedMaxLevel`] when the index collides with an
    /// existing leaf on every path bit the depth allows.
    pub fn add(&self, entry: &Entry) -> Result<(), MerkleTreeError> {
        if !self.writable {
            return Err(MerkleTreeError::NotWritable);
        }
        let _write = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let hi = entry.hindex();
        let root = self.root();

        let mut batch: Vec<KvEntry> = Vec::new();
        // Internal nodes on the walked path, outermost first, with the side
        // taken at each.
        let mut traversed: Vec<(Hash, Hash, bool)> = Vec::new();

        let mut key = root;
        let mut level = 0u32;
        let mut subroot;
        loop {
            match self.node(&key)? {
                Node::Empty => {
                    subroot = push_node(&mut batch, Node::Leaf(*entry));
                    break;
                }
                Node::Leaf(existing) => {
                    let existing_hi = existing.hindex();
                    if existing_hi == hi {
                        return Err(MerkleTreeError::EntryIndexAlreadyExists);
                    }
                    subroot =
                        self.bifurcate(&mut batch, &existing, entry, level, &hi, &existing_hi)?;
                    break;
                }
                Node::Middle { left, right } => {
                    if level >= self.depth {
                        return Err(MerkleTreeError::ReachedMaxLevel);
                    }
                    let right_turn = path_bit(&hi, level);
                    traversed.push((left, right, right_turn));
                    key = if right_turn { right } else { left };
                    level += 1;
                }
            }
        }

        // Rebuild the ancestors bottom-up with the replaced child.
        for (left, right, right_turn) in traversed.into_iter().rev() {
            let node = if right_turn {
                Node::Middle {
                    left,
                    right: subroot,
                }
            } else {
                Node::Middle {
                    left: subroot,
                    right,
                }
            };
            subroot = push_node(&mut batch, node);
        }

        // The root lands last in the same atomic batch.
        batch.push((CURRENT_ROOT_KEY.to_vec(), subroot.to_vec()));
        self.storage.put_batch(batch)?;

        match self.root.write() {
            Ok(mut root) => *root = subroot,
            Err(poisoned) => *poisoned.into_inner() = subroot,
        }
        Ok(())
    }

    /// Replace the leaf found at `level` with the chain of internal nodes
    /// that separates it from the new entry at their first differing path
    /// bit.
    fn bifurcate(
        &self,
        batch: &mut Vec<KvEntry>,
        existing: &Entry,
        entry: &Entry,
        level: u32,
        hi: &Hash,
        existing_hi: &Hash,
    ) -> Result<Hash, MerkleTreeError> {
        let mut fork = level;
        loop {
            if fork >= self.depth {
                return Err(MerkleTreeError::ReachedMaxLevel);
            }
            if path_bit(hi, fork) != path_bit(existing_hi, fork) {
                break;
            }
            fork += 1;
        }

        let new_key = push_node(batch, Node::Leaf(*entry));
        let existing_key = Node::Leaf(*existing).key();

        let (left, right) = if path_bit(hi, fork) {
            (existing_key, new_key)
        } else {
            (new_key, existing_key)
        };
        let mut subroot = push_node(batch, Node::Middle { left, right });

        // Chain nodes above the fork pair with an empty sibling.
        for chain_level in (level..fork).rev() {
            let node = if path_bit(hi, chain_level) {
                Node::Middle {
                    left: *zero_hash(),
                    right: subroot,
                }
            } else {
                Node::Middle {
                    left: subroot,
                    right: *zero_hash(),
                }
            };
            subroot = push_node(batch, node);
        }
        Ok(subroot)
    }

    /// Generate an inclusion or exclusion proof for `hi`, walking from
    /// `from_root` when given and from the current root otherwise.
    pub fn generate_proof(
        &self,
        hi: &Hash,
        from_root: Option<&Hash>,
    ) -> Result<Proof, MerkleTreeError> {
        let mut proof = Proof::new(self.depth);
        let mut key = from_root.copied().unwrap_or_else(|| self.root());

        for level in 0..=self.depth {
            match self.node(&key)? {
                Node::Empty => return Ok(proof),
                Node::Leaf(existing) => {
                    let existing_hi = existing.hindex();
                    if existing_hi == *hi {
                        proof.mark_existence();
                    } else {
                        proof.set_node_aux(NodeAux {
                            hindex: existing_hi,
                            hvalue: existing.hvalue(),
                        });
                    }
                    return Ok(proof);
                }
                Node::Middle { left, right } => {
                    if level >= self.depth {
                        break;
                    }
                    let (next, sibling) = if path_bit(hi, level) {
                        (right, left)
                    } else {
                        (left, right)
                    };
                    if !sibling.is_zero() {
                        proof.record_sibling(level, sibling);
                    }
                    key = next;
                }
            }
        }
        Err(MerkleTreeError::EntryIndexNotFound)
    }

    /// The leaf payload stored at `hi`, or
    /// [`MerkleTreeError::EntryIndexNotFound`].
    pub fn get_data_by_index(&self, hi: &Hash) -> Result<Data, MerkleTreeError> {
        let mut key = self.root();
        for level in 0..=self.depth {
            match self.node(&key)? {
                Node::Empty => return Err(MerkleTreeError::EntryIndexNotFound),
                Node::Leaf(existing) => {
                    if existing.hindex() == *hi {
                        return Ok(existing.data);
                    }
                    return Err(MerkleTreeError::EntryIndexNotFound);
                }
                Node::Middle { left, right } => {
                    if level >= self.depth {
                        break;
                    }
                    key = if path_bit(hi, level) { right } else { left };
                }
            }
        }
        Err(MerkleTreeError::EntryIndexNotFound)
    }

    /// Load the node stored under `key`. The zero hash is the empty node.
    fn node(&self, key: &Hash) -> Result<Node, MerkleTreeError> {
        if key.is_zero() {
            return Ok(Node::Empty);
        }
        let bytes = self.storage.get(key.as_ref())?;
        Node::from_bytes(&bytes)
    }
}

fn push_node(batch: &mut Vec<KvEntry>, node: Node) -> Hash {
    let key = node.key();
    batch.push((key.to_vec(), node.to_bytes()));
    key
}
