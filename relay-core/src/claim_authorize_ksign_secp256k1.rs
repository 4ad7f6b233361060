use crate::claim::{
    copy_from_elem, copy_to_elem, get_claim_type_version, set_claim_type_version, ClaimError,
    ClaimType, CLAIM_TYPE_VERSION_LEN,
};

use relay_crypto::PublicKey;
use relay_merkle::{Data, Entry};

/// Authorizes a secp256k1 key for signing on behalf of an identity. The
/// compressed key spills over two slots: its first 31 bytes fill `Data[2]`,
/// the trailing two land in the header slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimAuthorizeKSignSecp256k1 {
    pub version: u32,
    pub pub_key: PublicKey,
}

impl ClaimAuthorizeKSignSecp256k1 {
    pub const TYPE: ClaimType = ClaimType::AUTHORIZE_KSIGN_SECP256K1;

    pub fn new(pub_key: PublicKey) -> Self {
        Self {
            version: 0,
            pub_key,
        }
    }

    pub fn entry(&self) -> Entry {
        let mut data = Data::default();
        set_claim_type_version(&mut data, Self::TYPE, self.version);
        let compressed = self.pub_key.to_compressed();
        copy_to_elem(&mut data[3], CLAIM_TYPE_VERSION_LEN, &compressed[31..]);
        copy_to_elem(&mut data[2], 0, &compressed[..31]);
        Entry::new(data)
    }

    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, version) = get_claim_type_version(&entry.data);
        if claim_type != Self::TYPE {
            return Err(ClaimError::InvalidClaimType(claim_type));
        }

        let mut compressed = [0u8; PublicKey::COMPRESSED_LEN];
        copy_from_elem(&entry.data[3], CLAIM_TYPE_VERSION_LEN, &mut compressed[31..]);
        copy_from_elem(&entry.data[2], 0, &mut compressed[..31]);
        let pub_key =
            PublicKey::from_sec1_bytes(&compressed).map_err(|_| ClaimError::MalformedField)?;

        Ok(Self { version, pub_key })
    }
}
