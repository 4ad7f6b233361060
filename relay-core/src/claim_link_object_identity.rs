use crate::claim::{
    copy_from_elem, copy_to_elem, get_claim_type_version, set_claim_type_version, ClaimError,
    ClaimType, CLAIM_TYPE_VERSION_LEN,
};

use relay_merkle::{Data, Entry};
use relay_types::{ElemBytes, Hash, Id};

/// The kind of object a [`ClaimLinkObjectIdentity`] binds to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ObjectType {
    Passport = 0,
    Address = 1,
    Certificate = 2,
    Storage = 3,
}

impl TryFrom<u32> for ObjectType {
    type Error = ClaimError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ObjectType::Passport),
            1 => Ok(ObjectType::Address),
            2 => Ok(ObjectType::Certificate),
            3 => Ok(ObjectType::Storage),
            _ => Err(ClaimError::MalformedField),
        }
    }
}

/// Links an external object (referenced by a digest) to an identity, with
/// free-form auxiliary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimLinkObjectIdentity {
    pub version: u32,
    pub object_type: ObjectType,
    pub index_type: u16,
    pub id: Id,
    /// The digest of the linked object. Its leading byte is dropped to fit
    /// the claim slot next to its pad byte.
    pub object_hash: ElemBytes,
    pub aux_data: ElemBytes,
}

impl ClaimLinkObjectIdentity {
    pub const TYPE: ClaimType = ClaimType::LINK_OBJECT_IDENTITY;

    pub fn new(
        object_type: ObjectType,
        index_type: u16,
        id: Id,
        object_hash: Hash,
        aux_data: Hash,
    ) -> Self {
        let mut truncated = ElemBytes::new(*object_hash);
        truncated[0] = 0;
        Self {
            version: 0,
            object_type,
            index_type,
            id,
            object_hash: truncated,
            aux_data: aux_data.into(),
        }
    }

    pub fn entry(&self) -> Entry {
        let mut data = Data::default();
        set_claim_type_version(&mut data, Self::TYPE, self.version);
        let object_type = self.object_type as u32;
        copy_to_elem(
            &mut data[3],
            CLAIM_TYPE_VERSION_LEN,
            &object_type.to_be_bytes(),
        );
        copy_to_elem(
            &mut data[3],
            CLAIM_TYPE_VERSION_LEN + 4,
            &self.index_type.to_be_bytes(),
        );
        copy_to_elem(&mut data[2], 0, self.id.bytes());
        copy_to_elem(&mut data[1], 0, &self.object_hash[1..]);
        data[0] = self.aux_data;
        Entry::new(data)
    }

    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, version) = get_claim_type_version(&entry.data);
        if claim_type != Self::TYPE {
            return Err(ClaimError::InvalidClaimType(claim_type));
        }

        let mut object_type_bytes = [0u8; 4];
        copy_from_elem(
            &entry.data[3],
            CLAIM_TYPE_VERSION_LEN,
            &mut object_type_bytes,
        );
        let object_type = ObjectType::try_from(u32::from_be_bytes(object_type_bytes))?;

        let mut index_type_bytes = [0u8; 2];
        copy_from_elem(
            &entry.data[3],
            CLAIM_TYPE_VERSION_LEN + 4,
            &mut index_type_bytes,
        );

        let mut id_bytes = [0u8; Id::LEN];
        copy_from_elem(&entry.data[2], 0, &mut id_bytes);
        let id = Id::from_bytes(id_bytes).map_err(|_| ClaimError::MalformedField)?;

        Ok(Self {
            version,
            object_type,
            index_type: u16::from_be_bytes(index_type_bytes),
            id,
            object_hash: entry.data[1],
            aux_data: entry.data[0],
        })
    }
}
