use crate::claim::{
    copy_from_elem, copy_to_elem, get_claim_type_version, set_claim_type_version, ClaimError,
    ClaimType, CLAIM_TYPE_VERSION_LEN,
};

use relay_merkle::{Data, Entry};
use relay_types::ElemBytes;

/// Authorizes a BabyJubJub key for signing on behalf of an identity. The key
/// is stored in its compressed form: the point's sign bit plus its
/// Y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimAuthorizeKSignBabyJub {
    pub version: u32,
    pub sign: bool,
    pub ay: ElemBytes,
}

impl ClaimAuthorizeKSignBabyJub {
    pub const TYPE: ClaimType = ClaimType::AUTHORIZE_KSIGN_BABYJUB;

    pub fn new(sign: bool, ay: ElemBytes) -> Self {
        Self {
            version: 0,
            sign,
            ay,
        }
    }

    pub fn entry(&self) -> Entry {
        let mut data = Data::default();
        set_claim_type_version(&mut data, Self::TYPE, self.version);
        let sign = u32::from(self.sign);
        copy_to_elem(&mut data[3], CLAIM_TYPE_VERSION_LEN, &sign.to_be_bytes());
        data[2] = self.ay;
        Entry::new(data)
    }

    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, version) = get_claim_type_version(&entry.data);
        if claim_type != Self::TYPE {
            return Err(ClaimError::InvalidClaimType(claim_type));
        }

        let mut sign_bytes = [0u8; 4];
        copy_from_elem(&entry.data[3], CLAIM_TYPE_VERSION_LEN, &mut sign_bytes);
        let sign = match u32::from_be_bytes(sign_bytes) {
            0 => false,
            1 => true,
            _ => return Err(ClaimError::MalformedField),
        };

        Ok(Self {
            version,
            sign,
            ay: entry.data[2],
        })
    }
}
