use crate::{eth::sign_eth_msg, Address, Error, PublicKey, SecretKey, SignatureEthMsg};

use std::time::{SystemTime, UNIX_EPOCH};

/// Signing service holding the relay's operational key.
///
/// Safe to share across request handlers; signing borrows the key immutably.
#[derive(Clone)]
pub struct EthSigner {
    secret: SecretKey,
}

impl EthSigner {
    pub fn new(secret: SecretKey) -> Self {
        Self { secret }
    }

    /// Sign `msg` as an Ethereum message.
    pub fn sign(&self, msg: &[u8]) -> Result<SignatureEthMsg, Error> {
        sign_eth_msg(&self.secret, msg)
    }

    /// Sign `msg ‖ u64_be(now)` and return the signature with the timestamp,
    /// in Unix seconds.
    pub fn sign_date(&self, msg: &[u8]) -> Result<(SignatureEthMsg, u64), Error> {
        let date = unix_now();
        let mut payload = Vec::with_capacity(msg.len() + 8);
        payload.extend_from_slice(msg);
        payload.extend_from_slice(&date.to_be_bytes());
        Ok((self.sign(&payload)?, date))
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    pub fn address(&self) -> Address {
        self.public_key().address()
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
