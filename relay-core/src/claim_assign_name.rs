use crate::claim::{
    copy_from_elem, copy_to_elem, get_claim_type_version, set_claim_type_version, ClaimError,
    ClaimType,
};

use relay_crypto::keccak256;
use relay_merkle::{Data, Entry};
use relay_types::Id;

/// Assigns a name to an identity. The leaf is indexed by the name's digest,
/// so resolving a name is a single tree lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimAssignName {
    pub version: u32,
    /// Keccak-256 digest of the name, truncated to its trailing 31 bytes to
    /// fit the claim slot.
    pub name_hash: [u8; 31],
    pub id: Id,
}

impl ClaimAssignName {
    pub const TYPE: ClaimType = ClaimType::ASSIGN_NAME;

    pub fn new(name: &str, id: Id) -> Self {
        Self {
            version: 0,
            name_hash: hash_name(name),
            id,
        }
    }

    pub fn entry(&self) -> Entry {
        let mut data = Data::default();
        set_claim_type_version(&mut data, Self::TYPE, self.version);
        copy_to_elem(&mut data[2], 0, &self.name_hash);
        copy_to_elem(&mut data[1], 0, self.id.bytes());
        Entry::new(data)
    }

    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, version) = get_claim_type_version(&entry.data);
        if claim_type != Self::TYPE {
            return Err(ClaimError::InvalidClaimType(claim_type));
        }

        let mut name_hash = [0u8; 31];
        copy_from_elem(&entry.data[2], 0, &mut name_hash);

        let mut id_bytes = [0u8; Id::LEN];
        copy_from_elem(&entry.data[1], 0, &mut id_bytes);
        let id = Id::from_bytes(id_bytes).map_err(|_| ClaimError::MalformedField)?;

        Ok(Self {
            version,
            name_hash,
            id,
        })
    }
}

/// Digest a name into the 31 bytes the claim slot can hold.
fn hash_name(name: &str) -> [u8; 31] {
    let digest = keccak256(name.as_bytes());
    let mut out = [0u8; 31];
    out.copy_from_slice(&digest[1..]);
    out
}
