use crate::{Error, PublicKey};

use k256::ecdsa::SigningKey;

use core::{fmt, str};

/// Asymmetric secret key
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl SecretKey {
    /// Memory length of the serialized key in bytes.
    pub const LEN: usize = 32;

    /// Generate a new random secret key.
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        Self(SigningKey::random(rng))
    }

    pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Result<Self, Error> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidSecretKey)
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0.to_bytes().into()
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(*self.0.verifying_key())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.0
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The key material stays out of logs.
        write!(f, "SecretKey(...)")
    }
}

impl str::FromStr for SecretKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidSecretKey)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::{prelude::StdRng, SeedableRng};

    #[test]
    fn bytes_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5EC2E7);
        let secret = SecretKey::random(&mut rng);
        let restored = SecretKey::from_bytes(&secret.to_bytes()).unwrap();
        assert_eq!(restored, secret);
        assert_eq!(restored.public_key(), secret.public_key());
    }

    #[test]
    fn rejects_zero_key() {
        assert_eq!(
            SecretKey::from_bytes(&[0u8; SecretKey::LEN]).unwrap_err(),
            Error::InvalidSecretKey
        );
    }

    #[test]
    fn parses_hex_with_prefix() {
        let mut rng = StdRng::seed_from_u64(0x5EC2E8);
        let secret = SecretKey::random(&mut rng);
        let hex = format!("0x{}", hex::encode(secret.to_bytes()));
        assert_eq!(hex.parse::<SecretKey>().unwrap(), secret);
    }
}
