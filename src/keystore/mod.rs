//! Keystore V3 wallets
//!
//! Password-protected storage of a secp256k1 private key:
//! - PBKDF2-HMAC-SHA256 key derivation
//! - AES-128-CTR encryption of the key
//! - keccak256 MAC over the ciphertext, checked before decryption
//! - `WalletHandle` lock/unlock lifecycle with zeroized key material

mod crypto;
mod format;
mod wallet;

pub use crypto::{decrypt_private_key, encrypt_private_key};
pub use format::*;
pub use wallet::*;

/// Keystore format version
pub const KEYSTORE_VERSION: u32 = 3;

/// Cipher identifier
pub const CIPHER_AES_128_CTR: &str = "aes-128-ctr";

/// KDF identifier
pub const KDF_PBKDF2: &str = "pbkdf2";

/// PBKDF2 pseudo-random function identifier
pub const PRF_HMAC_SHA256: &str = "hmac-sha256";

/// Keystore errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeystoreError {
    #[error("Keystore integrity check failed: {0}")]
    IntegrityError(String),

    #[error("Unsupported keystore format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Keystore encoding error: {0}")]
    Encoding(String),

    #[error("Keystore crypto error: {0}")]
    Crypto(String),
}

impl From<hex::FromHexError> for KeystoreError {
    fn from(e: hex::FromHexError) -> Self {
        KeystoreError::Encoding(format!("invalid hex: {}", e))
    }
}

impl From<serde_json::Error> for KeystoreError {
    fn from(e: serde_json::Error) -> Self {
        KeystoreError::Encoding(format!("invalid keystore JSON: {}", e))
    }
}

#[cfg(test)]
pub(crate) mod test_vectors {
    // Published Keystore V3 PBKDF2 test vector (passphrase "testpassword")
    pub const PBKDF2_VECTOR: &str = r#"{
        "crypto": {
            "cipher": "aes-128-ctr",
            "cipherparams": {"iv": "6087dab2f9fdbbfaddc31a909735c1e6"},
            "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
            "kdf": "pbkdf2",
            "kdfparams": {
                "c": 262144,
                "dklen": 32,
                "prf": "hmac-sha256",
                "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
            },
            "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"
        },
        "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
        "address": "008aeeda4d805471df9b2a5b0f38a0c3bcba786b",
        "version": 3
    }"#;

    pub const PBKDF2_VECTOR_PASSPHRASE: &str = "testpassword";
    pub const PBKDF2_VECTOR_PRIVATE_KEY: &str =
        "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d";
}
