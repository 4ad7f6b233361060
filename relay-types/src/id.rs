use core::{fmt, ops::Deref, str};

/// Errors produced when decoding an [`Id`] from its byte or textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// The decoded payload is not [`Id::LEN`] bytes long.
    InvalidLength,

    /// The trailing checksum doesn't match the identifier payload.
    InvalidChecksum,

    /// The textual form is not valid base58.
    InvalidBase58,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::InvalidLength => write!(f, "invalid identifier length"),
            IdError::InvalidChecksum => write!(f, "invalid identifier checksum"),
            IdError::InvalidBase58 => write!(f, "invalid base58 string"),
        }
    }
}

impl std::error::Error for IdError {}

/// A 31-byte identity identifier.
///
/// Layout: 2-byte type ‖ 27-byte genesis ‖ 2-byte checksum, where the
/// checksum is the big-endian 16-bit sum of the leading 29 bytes. The
/// canonical textual form is the base58 encoding of the full 31 bytes.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Id([u8; Id::LEN]);

impl Id {
    /// Memory length of the type in bytes.
    pub const LEN: usize = 31;

    /// Length of the leading type field.
    pub const TYPE_LEN: usize = 2;

    /// Length of the genesis field.
    pub const GENESIS_LEN: usize = 27;

    /// Construct an identifier from its type and genesis fields, computing
    /// the trailing checksum.
    pub fn new(typ: [u8; Self::TYPE_LEN], genesis: [u8; Self::GENESIS_LEN]) -> Self {
        let mut bytes = [0u8; Self::LEN];
        bytes[..Self::TYPE_LEN].copy_from_slice(&typ);
        bytes[Self::TYPE_LEN..Self::TYPE_LEN + Self::GENESIS_LEN].copy_from_slice(&genesis);
        let checksum = checksum(&bytes[..Self::LEN - 2]);
        bytes[Self::LEN - 2..].copy_from_slice(&checksum);
        Self(bytes)
    }

    /// Construct an identifier from its raw bytes, verifying the checksum.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Result<Self, IdError> {
        let expected = checksum(&bytes[..Self::LEN - 2]);
        if bytes[Self::LEN - 2..] != expected {
            return Err(IdError::InvalidChecksum);
        }
        Ok(Self(bytes))
    }

    /// The raw identifier bytes.
    pub fn bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// The trailing 2-byte checksum.
    pub fn checksum(&self) -> [u8; 2] {
        [self.0[Self::LEN - 2], self.0[Self::LEN - 1]]
    }
}

/// Big-endian 16-bit byte sum over the identifier payload.
fn checksum(payload: &[u8]) -> [u8; 2] {
    let sum: u16 = payload.iter().fold(0u16, |acc, b| acc.wrapping_add(*b as u16));
    sum.to_be_bytes()
}

impl Deref for Id {
    type Target = [u8; Id::LEN];

    fn deref(&self) -> &[u8; Id::LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Id> for [u8; Id::LEN] {
    fn from(id: Id) -> [u8; Id::LEN] {
        id.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl str::FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|_| IdError::InvalidBase58)?;
        let bytes =
            <[u8; Self::LEN]>::try_from(decoded.as_slice()).map_err(|_| IdError::InvalidLength)?;
        Self::from_bytes(bytes)
    }
}

impl serde::Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
