use crate::claim::{
    copy_from_elem, copy_to_elem, get_claim_type_version, set_claim_type_version, ClaimError,
    ClaimType, CLAIM_TYPE_VERSION_LEN,
};

use relay_merkle::{Data, Entry};
use relay_types::{Hash, Id};

/// Binds an identity to the root of its sub-tree at a version and era. The
/// relay publishes one of these into its own tree after every sub-tree
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimSetRootKey {
    pub version: u32,
    pub era: u32,
    pub id: Id,
    pub root_key: Hash,
}

impl ClaimSetRootKey {
    pub const TYPE: ClaimType = ClaimType::SET_ROOT_KEY;

    pub fn new(id: Id, root_key: Hash) -> Self {
        Self {
            version: 0,
            era: 0,
            id,
            root_key,
        }
    }

    pub fn entry(&self) -> Entry {
        let mut data = Data::default();
        set_claim_type_version(&mut data, Self::TYPE, self.version);
        copy_to_elem(&mut data[3], CLAIM_TYPE_VERSION_LEN, &self.era.to_be_bytes());
        copy_to_elem(&mut data[2], 0, self.id.bytes());
        data[1] = self.root_key.into();
        Entry::new(data)
    }

    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, version) = get_claim_type_version(&entry.data);
        if claim_type != Self::TYPE {
            return Err(ClaimError::InvalidClaimType(claim_type));
        }

        let mut era_bytes = [0u8; 4];
        copy_from_elem(&entry.data[3], CLAIM_TYPE_VERSION_LEN, &mut era_bytes);

        let mut id_bytes = [0u8; Id::LEN];
        copy_from_elem(&entry.data[2], 0, &mut id_bytes);
        let id = Id::from_bytes(id_bytes).map_err(|_| ClaimError::MalformedField)?;

        Ok(Self {
            version,
            era: u32::from_be_bytes(era_bytes),
            id,
            root_key: entry.data[1].into(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Claim;

    #[test]
    fn entry_layout_matches_the_reference_vector() {
        let id: Id = "113kyY52PSBr9oUqosmYkCavjjrQFuiuAw47FpZeUf".parse().unwrap();
        let mut root_key_bytes = [0x0bu8; 32];
        root_key_bytes[31] = 0x0c;

        let mut claim = ClaimSetRootKey::new(id, Hash::new(root_key_bytes));
        claim.version = 1;
        claim.era = 1;

        let entry = claim.entry();
        assert_eq!(
            hex::encode(entry.data.to_bytes()),
            "0000000000000000000000000000000000000000000000000000000000000000\
             0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0c\
             0000003cc1c968fa000000000000000000000000000000000000000000000328\
             0000000000000000000000000000000000000001000000010000000000000002"
        );

        // The derived hashes are deterministic and split index from value.
        assert_eq!(entry.hindex(), claim.entry().hindex());
        assert_eq!(entry.hvalue(), claim.entry().hvalue());
        assert_ne!(entry.hindex(), entry.hvalue());
    }

    #[test]
    fn entry_round_trip() {
        let id: Id = "113kyY52PSBr9oUqosmYkCavjjrQFuiuAw47FpZeUf".parse().unwrap();
        let mut claim = ClaimSetRootKey::new(id, Hash::new([0x42u8; 32]));
        claim.version = 3;
        claim.era = 2;

        let entry = claim.entry();
        assert_eq!(ClaimSetRootKey::from_entry(&entry).unwrap(), claim);
        assert_eq!(Claim::from_entry(&entry).unwrap(), Claim::SetRootKey(claim));
    }

    #[test]
    fn version_moves_the_index() {
        let id: Id = "113kyY52PSBr9oUqosmYkCavjjrQFuiuAw47FpZeUf".parse().unwrap();
        let claim = ClaimSetRootKey::new(id, Hash::new([0x42u8; 32]));
        let mut next = claim;
        next.version = 1;

        assert_ne!(claim.entry().hindex(), next.entry().hindex());
        assert_eq!(claim.entry().hvalue(), next.entry().hvalue());
    }
}
