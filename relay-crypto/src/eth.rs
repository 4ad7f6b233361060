use crate::{keccak::keccak256_many, Address, Error, PublicKey, SecretKey};

use relay_types::Hash;

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use core::{fmt, ops::Deref, str};

/// Marker prepended to every signed payload, as Ethereum wallets do.
const ETH_MSG_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// A 65-byte Ethereum-message signature: `r ‖ s ‖ v`, `v ∈ {27, 28}`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SignatureEthMsg([u8; SignatureEthMsg::LEN]);

impl SignatureEthMsg {
    /// Memory length of the type in bytes.
    pub const LEN: usize = 65;

    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    fn decode(&self) -> Result<(Signature, RecoveryId), Error> {
        let v = self.0[64].checked_sub(27).ok_or(Error::InvalidSignature)?;
        let recovery_id = RecoveryId::from_byte(v).ok_or(Error::InvalidSignature)?;
        let signature =
            Signature::from_slice(&self.0[..64]).map_err(|_| Error::InvalidSignature)?;
        Ok((signature, recovery_id))
    }
}

impl Deref for SignatureEthMsg {
    type Target = [u8; SignatureEthMsg::LEN];

    fn deref(&self) -> &[u8; SignatureEthMsg::LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for SignatureEthMsg {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for SignatureEthMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for SignatureEthMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureEthMsg({})", self)
    }
}

impl str::FromStr for SignatureEthMsg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidSignature)?;
        Ok(Self(bytes))
    }
}

impl serde::Serialize for SignatureEthMsg {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for SignatureEthMsg {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The digest signed for a payload:
/// `keccak256("\x19Ethereum Signed Message:\n" ‖ len(msg) ‖ msg)`.
pub fn eth_msg_hash(msg: &[u8]) -> Hash {
    let header = format!("{}{}", ETH_MSG_PREFIX, msg.len());
    keccak256_many([header.as_bytes(), msg])
}

/// Sign `msg` as an Ethereum message.
pub fn sign_eth_msg(secret: &SecretKey, msg: &[u8]) -> Result<SignatureEthMsg, Error> {
    let digest = eth_msg_hash(msg);
    let (signature, recovery_id) = secret
        .signing_key()
        .sign_prehash_recoverable(digest.as_ref())
        .map_err(|_| Error::FailedToSign)?;

    let signature: [u8; 64] = signature.to_bytes().into();
    let mut bytes = [0u8; SignatureEthMsg::LEN];
    bytes[..64].copy_from_slice(&signature);
    bytes[64] = 27 + recovery_id.to_byte();
    Ok(SignatureEthMsg(bytes))
}

/// Recover the public key that signed `msg` as an Ethereum message.
pub fn recover_eth_msg(sig: &SignatureEthMsg, msg: &[u8]) -> Result<PublicKey, Error> {
    let digest = eth_msg_hash(msg);
    let (signature, recovery_id) = sig.decode()?;
    VerifyingKey::recover_from_prehash(digest.as_ref(), &signature, recovery_id)
        .map(PublicKey::from)
        .map_err(|_| Error::InvalidSignature)
}

/// Whether `sig` over `msg` was produced by the key behind `address`.
pub fn verify_eth_msg(address: &Address, sig: &SignatureEthMsg, msg: &[u8]) -> bool {
    recover_eth_msg(sig, msg)
        .map(|public| public.address() == *address)
        .unwrap_or(false)
}
