//! System hash helpers. The relay hash `H` is SHA-256; it is fixed at build
//! time and is part of the wire contract.

use relay_types::Hash;

use digest::Digest;
use sha2::Sha256;

/// The hash of the canonical empty node. The root of a tree equals this value
/// exactly when the tree holds no leaves.
pub fn zero_hash() -> &'static Hash {
    const ZERO: Hash = Hash::zeroed();

    &ZERO
}

/// Digest a single byte string.
pub fn sum(data: &[u8]) -> Hash {
    let mut hash = Sha256::new();
    hash.update(data);
    <[u8; Hash::LEN]>::from(hash.finalize()).into()
}

/// Digest the concatenation of several byte strings.
pub fn sum_many<'a, I>(parts: I) -> Hash
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hash = Sha256::new();
    for part in parts {
        hash.update(part);
    }
    <[u8; Hash::LEN]>::from(hash.finalize()).into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sum_many_matches_concatenated_sum() {
        let concatenated = sum(b"leftright");
        let parts = sum_many([b"left".as_slice(), b"right".as_slice()]);
        assert_eq!(parts, concatenated);
    }

    #[test]
    fn zero_hash_is_all_zeroes() {
        assert!(zero_hash().is_zero());
    }
}
