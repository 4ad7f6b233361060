use crate::{
    entry::{Data, Entry},
    hash::{sum_many, zero_hash},
    merkle_tree::MerkleTreeError,
};

use relay_types::Hash;

const LEAF: u8 = 0x00;
const MIDDLE: u8 = 0x01;

/// A tree node. Non-empty nodes are persisted under their own hash; the empty
/// node is implicit and hashes to [`zero_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Empty,
    /// A terminal node carrying a full leaf payload.
    Leaf(Entry),
    /// An internal node referencing its children by hash.
    Middle { left: Hash, right: Hash },
}

impl Node {
    /// The key this node is stored under.
    ///
    /// Internal nodes hash to `H(left ‖ right)`; leaves hash to
    /// `H(HIndex ‖ HValue ‖ 0x01)`, whose distinct preimage length keeps the
    /// two domains separate.
    pub fn key(&self) -> Hash {
        match self {
            Node::Empty => *zero_hash(),
            Node::Leaf(entry) => leaf_key(&entry.hindex(), &entry.hvalue()),
            Node::Middle { left, right } => middle_key(left, right),
        }
    }

    /// Storage encoding: a one-byte kind tag followed by the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Node::Empty => Vec::new(),
            Node::Leaf(entry) => {
                let mut bytes = Vec::with_capacity(1 + Data::LEN);
                bytes.push(LEAF);
                bytes.extend_from_slice(&entry.bytes());
                bytes
            }
            Node::Middle { left, right } => {
                let mut bytes = Vec::with_capacity(1 + 2 * Hash::LEN);
                bytes.push(MIDDLE);
                bytes.extend_from_slice(left.as_ref());
                bytes.extend_from_slice(right.as_ref());
                bytes
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MerkleTreeError> {
        match bytes.split_first() {
            Some((&LEAF, payload)) => {
                let data: &[u8; Data::LEN] =
                    payload.try_into().map_err(|_| MerkleTreeError::InvalidNode)?;
                Ok(Node::Leaf(Entry::new(Data::from_bytes(data))))
            }
            Some((&MIDDLE, payload)) if payload.len() == 2 * Hash::LEN => {
                let left = Hash::try_from(&payload[..Hash::LEN])
                    .map_err(|_| MerkleTreeError::InvalidNode)?;
                let right = Hash::try_from(&payload[Hash::LEN..])
                    .map_err(|_| MerkleTreeError::InvalidNode)?;
                Ok(Node::Middle { left, right })
            }
            _ => Err(MerkleTreeError::InvalidNode),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }
}

/// Key of a leaf committing to `(hi, hv)`.
pub(crate) fn leaf_key(hi: &Hash, hv: &Hash) -> Hash {
    sum_many([hi.as_ref(), hv.as_ref(), [1u8].as_slice()])
}

/// Key of an internal node over two child keys.
pub(crate) fn middle_key(left: &Hash, right: &Hash) -> Hash {
    sum_many([left.as_ref(), right.as_ref()])
}
