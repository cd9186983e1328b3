//! secp256k1 key handling for participant accounts

use crate::error::HarnessError;
use alloy::primitives::{keccak256, Address};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{constants::SECRET_KEY_SIZE, All, PublicKey, Secp256k1, SecretKey};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Strip an optional `0x` prefix from a hex string.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Parses a hex-encoded secret key, with or without `0x`.
    pub fn from_secret_hex(hex_str: &str) -> Result<Self, HarnessError> {
        let bytes = hex::decode(strip_hex_prefix(hex_str))
            .map_err(|e| HarnessError::CryptoError(format!("Invalid hex secret key: {}", e)))?;
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(HarnessError::CryptoError(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )));
        }
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| HarnessError::CryptoError(format!("Invalid secret key bytes: {}", e)))?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Ethereum address: last 20 bytes of keccak256 over the uncompressed public key
    /// without its 0x04 tag.
    pub fn address(&self) -> Address {
        let uncompressed = self.public_key.serialize_uncompressed();
        let digest = keccak256(&uncompressed[1..]);
        Address::from_slice(&digest[12..])
    }

    /// `0x`-prefixed secret key, the form accounts.json stores.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret_key.secret_bytes()))
    }
}

/// Confirms that `secret_hex` controls `expected`.
pub fn check_key_matches(secret_hex: &str, expected: Address) -> Result<(), HarnessError> {
    let derived = KeyPair::from_secret_hex(secret_hex)?.address();
    if derived != expected {
        return Err(HarnessError::CryptoError(format!(
            "private key belongs to {}, not {}",
            derived, expected
        )));
    }
    Ok(())
}
