//! Cryptographic primitives of the relay: Keccak-256 digests, secp256k1
//! keys, Ethereum-signed-message signatures and the signing service used to
//! stamp proofs.

#![deny(unsafe_code)]

mod error;
mod eth;
mod keccak;
mod public;
mod secret;
mod signer;

pub use error::Error;
pub use eth::{
    eth_msg_hash, recover_eth_msg, sign_eth_msg, verify_eth_msg, SignatureEthMsg,
};
pub use keccak::keccak256;
pub use public::{Address, PublicKey};
pub use secret::SecretKey;
pub use signer::{unix_now, EthSigner};
