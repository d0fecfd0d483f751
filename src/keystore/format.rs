//! Keystore V3 JSON layout

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::KeystoreError;

/// Encrypted wallet record. Hex fields carry no `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletKeystore {
    pub version: u32,
    pub id: Uuid,
    pub address: String,
    pub crypto: CryptoParams,
}

/// The `crypto` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoParams {
    pub cipher: String,
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

/// PBKDF2 parameters. Fields default so that keystores using another KDF
/// still parse and can be rejected as unsupported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub c: u32,
    #[serde(default)]
    pub dklen: u32,
    #[serde(default)]
    pub prf: String,
}

impl WalletKeystore {
    /// Parse a keystore document
    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the on-disk JSON form
    pub fn to_json(&self) -> Result<String, KeystoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Stored address as raw bytes
    pub fn address_bytes(&self) -> Result<[u8; 20], KeystoreError> {
        let bytes = hex::decode(self.address.trim_start_matches("0x"))?;
        bytes
            .try_into()
            .map_err(|_| KeystoreError::Encoding("address must be 20 bytes".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::test_vectors::PBKDF2_VECTOR;

    #[test]
    fn test_parse_vector() {
        let keystore = WalletKeystore::from_json(PBKDF2_VECTOR).unwrap();
        assert_eq!(keystore.version, 3);
        assert_eq!(keystore.crypto.kdfparams.c, 262_144);
        assert_eq!(keystore.crypto.kdfparams.prf, "hmac-sha256");
        assert_eq!(keystore.address_bytes().unwrap()[1], 0x8a);
    }

    #[test]
    fn test_json_round_trip_preserves_fields() {
        let keystore = WalletKeystore::from_json(PBKDF2_VECTOR).unwrap();
        let json = keystore.to_json().unwrap();
        assert!(json.contains("\"cipherparams\""));
        assert!(json.contains("\"kdfparams\""));
        assert_eq!(WalletKeystore::from_json(&json).unwrap(), keystore);
    }

    #[test]
    fn test_scrypt_params_still_parse() {
        let json = PBKDF2_VECTOR
            .replace("\"kdf\": \"pbkdf2\"", "\"kdf\": \"scrypt\"")
            .replace("\"c\": 262144,", "\"n\": 262144, \"r\": 8, \"p\": 1,")
            .replace("\"prf\": \"hmac-sha256\",", "");
        let keystore = WalletKeystore::from_json(&json).unwrap();
        assert_eq!(keystore.crypto.kdf, "scrypt");
        assert_eq!(keystore.crypto.kdfparams.c, 0);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(WalletKeystore::from_json("{}"), Err(KeystoreError::Encoding(_))));
    }
}
