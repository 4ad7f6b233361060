use crate::{keccak::keccak256, Error};

use k256::ecdsa::VerifyingKey;

use core::{fmt, ops::Deref, str};

/// Asymmetric public key, internally in secp256k1 point form.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Length of the compressed SEC1 form.
    pub const COMPRESSED_LEN: usize = 33;

    /// Length of the uncompressed SEC1 form.
    pub const UNCOMPRESSED_LEN: usize = 65;

    /// Parse a SEC1-encoded point, compressed or uncompressed.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, Error> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidPublicKey)
    }

    /// The compressed SEC1 form.
    pub fn to_compressed(&self) -> [u8; Self::COMPRESSED_LEN] {
        let point = self.0.to_encoded_point(true);
        let mut bytes = [0u8; Self::COMPRESSED_LEN];
        bytes.copy_from_slice(point.as_bytes());
        bytes
    }

    /// The uncompressed SEC1 form, with the leading `0x04` tag.
    pub fn to_uncompressed(&self) -> [u8; Self::UNCOMPRESSED_LEN] {
        let point = self.0.to_encoded_point(false);
        let mut bytes = [0u8; Self::UNCOMPRESSED_LEN];
        bytes.copy_from_slice(point.as_bytes());
        bytes
    }

    /// The Ethereum address of this key: the trailing 20 bytes of the
    /// Keccak-256 digest of the uncompressed point.
    pub fn address(&self) -> Address {
        let uncompressed = self.to_uncompressed();
        let digest = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; Address::LEN];
        bytes.copy_from_slice(&digest[relay_types::Hash::LEN - Address::LEN..]);
        Address(bytes)
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self(key)
    }
}

impl From<&PublicKey> for VerifyingKey {
    fn from(key: &PublicKey) -> Self {
        key.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_compressed()))
    }
}

impl str::FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| Error::InvalidPublicKey)?;
        Self::from_sec1_bytes(&bytes)
    }
}

/// A 20-byte Ethereum address.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Address([u8; Address::LEN]);

impl Address {
    /// Memory length of the type in bytes.
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }
}

impl Deref for Address {
    type Target = [u8; Address::LEN];

    fn deref(&self) -> &[u8; Address::LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidPublicKey)?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::SecretKey;

    use rand::{prelude::StdRng, SeedableRng};

    #[test]
    fn sec1_round_trips() {
        let mut rng = StdRng::seed_from_u64(0x507B11C);
        let public = SecretKey::random(&mut rng).public_key();

        let compressed = PublicKey::from_sec1_bytes(&public.to_compressed()).unwrap();
        let uncompressed = PublicKey::from_sec1_bytes(&public.to_uncompressed()).unwrap();
        assert_eq!(compressed, public);
        assert_eq!(uncompressed, public);
    }

    #[test]
    fn address_is_stable_across_encodings() {
        let mut rng = StdRng::seed_from_u64(0x507B11D);
        let public = SecretKey::random(&mut rng).public_key();

        let reparsed = PublicKey::from_sec1_bytes(&public.to_compressed()).unwrap();
        assert_eq!(reparsed.address(), public.address());
    }

    #[test]
    fn address_hex_round_trips() {
        let address = Address::new([0x11; Address::LEN]);
        let s = address.to_string();
        assert_eq!(s.parse::<Address>().unwrap(), address);
    }
}
