use relay_types::Hash;

use sha3::{Digest, Keccak256};

/// Keccak-256 digest of a byte string.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    <[u8; Hash::LEN]>::from(hasher.finalize()).into()
}

pub(crate) fn keccak256_many<'a, I>(parts: I) -> Hash
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    <[u8; Hash::LEN]>::from(hasher.finalize()).into()
}
