use crate::claim::{
    copy_from_elem, copy_to_elem, get_claim_type_version, set_claim_type_version, ClaimError,
    ClaimType, CLAIM_TYPE_VERSION_LEN,
};

use relay_merkle::{Data, Entry};

/// A free-form claim: 400 bits of index and 496 bits of value, with no
/// further interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimBasic {
    pub version: u32,
    pub index_slot: [u8; 50],
    pub data_slot: [u8; 62],
}

impl ClaimBasic {
    pub const TYPE: ClaimType = ClaimType::BASIC;

    pub fn new(index_slot: [u8; 50], data_slot: [u8; 62]) -> Self {
        Self {
            version: 0,
            index_slot,
            data_slot,
        }
    }

    pub fn entry(&self) -> Entry {
        let mut data = Data::default();
        set_claim_type_version(&mut data, Self::TYPE, self.version);
        copy_to_elem(&mut data[3], CLAIM_TYPE_VERSION_LEN, &self.index_slot[31..]);
        copy_to_elem(&mut data[2], 0, &self.index_slot[..31]);
        copy_to_elem(&mut data[1], 0, &self.data_slot[31..]);
        copy_to_elem(&mut data[0], 0, &self.data_slot[..31]);
        Entry::new(data)
    }

    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, version) = get_claim_type_version(&entry.data);
        if claim_type != Self::TYPE {
            return Err(ClaimError::InvalidClaimType(claim_type));
        }

        let mut index_slot = [0u8; 50];
        copy_from_elem(
            &entry.data[3],
            CLAIM_TYPE_VERSION_LEN,
            &mut index_slot[31..],
        );
        copy_from_elem(&entry.data[2], 0, &mut index_slot[..31]);

        let mut data_slot = [0u8; 62];
        copy_from_elem(&entry.data[1], 0, &mut data_slot[31..]);
        copy_from_elem(&entry.data[0], 0, &mut data_slot[..31]);

        Ok(Self {
            version,
            index_slot,
            data_slot,
        })
    }
}
