//! Fixed-depth sparse Merkle tree over prefixed key-value storage.
//!
//! Leaves are 128-byte [`Data`] records addressed by `HIndex`, the hash of
//! their index slots. The tree walks the `depth` least-significant bits of an
//! index (bit `i` set selects the right child), places every leaf at the
//! highest level that distinguishes it from its neighbours, and persists each
//! node under its own hash. The current root survives restarts under a
//! reserved storage key, and any historical root can be served read-only
//! through [`MerkleTree::snapshot`].

#![deny(unsafe_code)]

mod entry;
pub mod hash;
mod merkle_tree;
mod node;
mod path;
mod proof;

pub use entry::{Data, Entry};
pub use merkle_tree::{MerkleTree, MerkleTreeError, MAX_DEPTH};
pub use node::Node;
pub use proof::{verify_proof, NodeAux, Proof};
