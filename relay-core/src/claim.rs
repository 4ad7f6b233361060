use crate::{
    ClaimAssignName, ClaimAuthorizeKSignBabyJub, ClaimAuthorizeKSignSecp256k1, ClaimBasic,
    ClaimLinkObjectIdentity, ClaimSetRootKey,
};

use relay_merkle::{Data, Entry};
use relay_types::ElemBytes;

use core::fmt;

/// Length of the claim type field in the header slot.
pub const CLAIM_TYPE_LEN: usize = 8;

/// Length of the `(type, version)` header in the header slot.
pub const CLAIM_TYPE_VERSION_LEN: usize = CLAIM_TYPE_LEN + 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The entry's header carries a different claim type than the decoder
    /// expects, or one no decoder knows.
    #[error("invalid claim type {0}")]
    InvalidClaimType(ClaimType),

    /// A claim-specific field of the entry is malformed.
    #[error("malformed claim field")]
    MalformedField,
}

/// The u64 discriminant in a claim header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimType(pub u64);

impl ClaimType {
    pub const BASIC: ClaimType = ClaimType(0);
    pub const AUTHORIZE_KSIGN_BABYJUB: ClaimType = ClaimType(1);
    pub const SET_ROOT_KEY: ClaimType = ClaimType(2);
    pub const ASSIGN_NAME: ClaimType = ClaimType(3);
    pub const AUTHORIZE_KSIGN_SECP256K1: ClaimType = ClaimType(4);
    pub const LINK_OBJECT_IDENTITY: ClaimType = ClaimType(5);
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Copy `src` into `elem` right-aligned, ending `start` bytes before the end
/// of the slot.
pub(crate) fn copy_to_elem(elem: &mut ElemBytes, start: usize, src: &[u8]) {
    let end = ElemBytes::LEN - start;
    elem[end - src.len()..end].copy_from_slice(src);
}

/// Inverse of [`copy_to_elem`]: fill `dst` from the right-aligned field.
pub(crate) fn copy_from_elem(elem: &ElemBytes, start: usize, dst: &mut [u8]) {
    let end = ElemBytes::LEN - start;
    dst.copy_from_slice(&elem[end - dst.len()..end]);
}

/// Read the `(type, version)` header from the trailing bytes of `Data[3]`.
pub fn get_claim_type_version(data: &Data) -> (ClaimType, u32) {
    let mut type_bytes = [0u8; CLAIM_TYPE_LEN];
    copy_from_elem(&data[3], 0, &mut type_bytes);
    let mut version_bytes = [0u8; 4];
    copy_from_elem(&data[3], CLAIM_TYPE_LEN, &mut version_bytes);
    (
        ClaimType(u64::from_be_bytes(type_bytes)),
        u32::from_be_bytes(version_bytes),
    )
}

/// Write the `(type, version)` header, leaving every other byte untouched.
pub fn set_claim_type_version(data: &mut Data, claim_type: ClaimType, version: u32) {
    copy_to_elem(&mut data[3], 0, &claim_type.0.to_be_bytes());
    copy_to_elem(&mut data[3], CLAIM_TYPE_LEN, &version.to_be_bytes());
}

/// The entry of the next version of the claim recorded in `data`. The source
/// record is left untouched.
pub fn next_version_entry(data: &Data) -> Entry {
    let (claim_type, version) = get_claim_type_version(data);
    let mut next = *data;
    set_claim_type_version(&mut next, claim_type, version + 1);
    Entry::new(next)
}

/// Any of the claim kinds the relay understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Basic(ClaimBasic),
    AuthorizeKSignBabyJub(ClaimAuthorizeKSignBabyJub),
    SetRootKey(ClaimSetRootKey),
    AssignName(ClaimAssignName),
    AuthorizeKSignSecp256k1(ClaimAuthorizeKSignSecp256k1),
    LinkObjectIdentity(ClaimLinkObjectIdentity),
}

impl Claim {
    /// Decode an entry by dispatching on its header type.
    pub fn from_entry(entry: &Entry) -> Result<Self, ClaimError> {
        let (claim_type, _) = get_claim_type_version(&entry.data);
        match claim_type {
            ClaimType::BASIC => ClaimBasic::from_entry(entry).map(Claim::Basic),
            ClaimType::AUTHORIZE_KSIGN_BABYJUB => {
                ClaimAuthorizeKSignBabyJub::from_entry(entry).map(Claim::AuthorizeKSignBabyJub)
            }
            ClaimType::SET_ROOT_KEY => ClaimSetRootKey::from_entry(entry).map(Claim::SetRootKey),
            ClaimType::ASSIGN_NAME => ClaimAssignName::from_entry(entry).map(Claim::AssignName),
            ClaimType::AUTHORIZE_KSIGN_SECP256K1 => {
                ClaimAuthorizeKSignSecp256k1::from_entry(entry)
                    .map(Claim::AuthorizeKSignSecp256k1)
            }
            ClaimType::LINK_OBJECT_IDENTITY => {
                ClaimLinkObjectIdentity::from_entry(entry).map(Claim::LinkObjectIdentity)
            }
            other => Err(ClaimError::InvalidClaimType(other)),
        }
    }

    pub fn entry(&self) -> Entry {
        match self {
            Claim::Basic(claim) => claim.entry(),
            Claim::AuthorizeKSignBabyJub(claim) => claim.entry(),
            Claim::SetRootKey(claim) => claim.entry(),
            Claim::AssignName(claim) => claim.entry(),
            Claim::AuthorizeKSignSecp256k1(claim) => claim.entry(),
            Claim::LinkObjectIdentity(claim) => claim.entry(),
        }
    }

    pub fn claim_type(&self) -> ClaimType {
        match self {
            Claim::Basic(_) => ClaimType::BASIC,
            Claim::AuthorizeKSignBabyJub(_) => ClaimType::AUTHORIZE_KSIGN_BABYJUB,
            Claim::SetRootKey(_) => ClaimType::SET_ROOT_KEY,
            Claim::AssignName(_) => ClaimType::ASSIGN_NAME,
            Claim::AuthorizeKSignSecp256k1(_) => ClaimType::AUTHORIZE_KSIGN_SECP256K1,
            Claim::LinkObjectIdentity(_) => ClaimType::LINK_OBJECT_IDENTITY,
        }
    }
}
