//! Private keys and the lock/unlock wallet handle

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::crypto::{decrypt_private_key, encrypt_private_key};
use super::format::WalletKeystore;
use super::{KeystoreError, KEYSTORE_VERSION};
use crate::config::KdfSettings;
use crate::utils::crypto::{address_from_public_key, to_checksum_address};
use crate::{log_info, log_warn};

/// A secp256k1 private key, scrubbed from memory on drop.
///
/// Deliberately not `Clone`; `Debug` never prints the key.
pub struct PrivateKey(Zeroizing<[u8; 32]>);

impl PrivateKey {
    /// Generate a fresh key from the OS RNG
    pub fn generate() -> Self {
        loop {
            let mut bytes = Zeroizing::new([0u8; 32]);
            OsRng.fill_bytes(bytes.as_mut());
            // Out-of-range scalars are astronomically rare; draw again
            if SecretKey::from_slice(bytes.as_ref()).is_ok() {
                return PrivateKey(bytes);
            }
        }
    }

    /// Import a 32-byte big-endian scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeystoreError> {
        if bytes.len() != 32 {
            return Err(KeystoreError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        SecretKey::from_slice(bytes).map_err(|e| KeystoreError::InvalidKey(e.to_string()))?;
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(bytes);
        Ok(PrivateKey(key))
    }

    /// Import from hex, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self, KeystoreError> {
        let bytes = Zeroizing::new(hex::decode(s.trim_start_matches("0x"))?);
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Run `f` with a temporary `SecretKey`, erased once `f` returns
    pub(crate) fn with_secret_key<T>(
        &self,
        f: impl FnOnce(&SecretKey) -> T,
    ) -> Result<T, KeystoreError> {
        let mut secret = SecretKey::from_slice(self.0.as_ref())
            .map_err(|e| KeystoreError::InvalidKey(e.to_string()))?;
        let result = f(&secret);
        secret.non_secure_erase();
        Ok(result)
    }

    pub fn public_key(&self) -> Result<PublicKey, KeystoreError> {
        let secp = Secp256k1::signing_only();
        self.with_secret_key(|secret| PublicKey::from_secret_key(&secp, secret))
    }

    /// Ethereum address of this key
    pub fn address(&self) -> Result<[u8; 20], KeystoreError> {
        Ok(address_from_public_key(&self.public_key()?))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

/// A keystore plus, while unlocked, its decrypted private key.
///
/// `lock()` drops only the key; the keystore is kept so the wallet can be
/// unlocked again. Mutation takes `&mut self`, so sharing a handle across
/// threads needs external synchronization.
#[derive(Debug)]
pub struct WalletHandle {
    keystore: WalletKeystore,
    key: Option<PrivateKey>,
}

impl WalletHandle {
    /// Create a new wallet with standard KDF parameters. The handle is returned locked.
    pub fn create(passphrase: &str) -> Result<Self, KeystoreError> {
        Self::create_with(passphrase, &KdfSettings::standard())
    }

    /// Create a new wallet with explicit KDF parameters. The handle is returned locked;
    /// the generated key is dropped once encrypted.
    pub fn create_with(passphrase: &str, settings: &KdfSettings) -> Result<Self, KeystoreError> {
        let key = PrivateKey::generate();
        let keystore = seal(&key, passphrase, settings)?;
        Ok(Self { keystore, key: None })
    }

    /// Wrap an existing key in a new keystore. The handle is returned
    /// unlocked, holding the supplied key.
    pub fn create_from_private_key(
        key: PrivateKey,
        passphrase: &str,
        settings: &KdfSettings,
    ) -> Result<Self, KeystoreError> {
        let keystore = seal(&key, passphrase, settings)?;
        Ok(Self { keystore, key: Some(key) })
    }

    /// Open an existing keystore (locked)
    pub fn from_keystore(keystore: WalletKeystore) -> Self {
        Self { keystore, key: None }
    }

    /// Parse a keystore document and open it (locked)
    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        Ok(Self::from_keystore(WalletKeystore::from_json(json)?))
    }

    /// Decrypt the key. On failure the handle stays in its previous state.
    pub fn unlock(&mut self, passphrase: &str) -> Result<(), KeystoreError> {
        match decrypt_private_key(&self.keystore, passphrase) {
            Ok(key) => {
                self.key = Some(key);
                log_info!("keystore", "wallet unlocked", address = self.address());
                Ok(())
            }
            Err(e) => {
                log_warn!("keystore", "unlock failed", address = self.address(), error = e);
                Err(e)
            }
        }
    }

    /// Drop (and zeroize) the decrypted key
    pub fn lock(&mut self) {
        if self.key.take().is_some() {
            log_info!("keystore", "wallet locked", address = self.address());
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// 0x-prefixed lowercase address
    pub fn address(&self) -> String {
        format!("0x{}", self.keystore.address.trim_start_matches("0x"))
    }

    pub fn keystore(&self) -> &WalletKeystore {
        &self.keystore
    }

    /// Decrypt the key without storing it in the handle
    pub fn decrypt_transient(&self, passphrase: &str) -> Result<PrivateKey, KeystoreError> {
        decrypt_private_key(&self.keystore, passphrase)
    }

    pub(crate) fn private_key(&self) -> Option<&PrivateKey> {
        self.key.as_ref()
    }
}

/// Encrypt `key` into a fresh V3 keystore
fn seal(key: &PrivateKey, passphrase: &str, settings: &KdfSettings) -> Result<WalletKeystore, KeystoreError> {
    let address = key.address()?;
    let keystore = WalletKeystore {
        version: KEYSTORE_VERSION,
        id: Uuid::new_v4(),
        address: hex::encode(address),
        crypto: encrypt_private_key(key, passphrase, settings)?,
    };

    log_info!(
        "keystore",
        "wallet created",
        address = to_checksum_address(&address),
        iterations = settings.iterations,
    );
    Ok(keystore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::test_vectors::*;

    fn light() -> KdfSettings {
        KdfSettings::light()
    }

    #[test]
    fn test_private_key_validation() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
        assert!(PrivateKey::from_bytes(&[0xffu8; 32]).is_err());
        assert!(PrivateKey::from_hex(PBKDF2_VECTOR_PRIVATE_KEY).is_ok());
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let key = PrivateKey::from_hex(PBKDF2_VECTOR_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("7a28"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_known_key_address() {
        let key = PrivateKey::from_hex(PBKDF2_VECTOR_PRIVATE_KEY).unwrap();
        assert_eq!(hex::encode(key.address().unwrap()), "008aeeda4d805471df9b2a5b0f38a0c3bcba786b");
    }

    #[test]
    fn test_lock_unlock_cycle() {
        let mut wallet = WalletHandle::create_with("pass", &light()).unwrap();
        assert!(!wallet.is_unlocked());

        wallet.unlock("pass").unwrap();
        assert!(wallet.is_unlocked());

        let keystore_before = wallet.keystore().clone();
        wallet.lock();
        assert!(!wallet.is_unlocked());
        assert_eq!(wallet.keystore(), &keystore_before);

        wallet.unlock("pass").unwrap();
        assert!(wallet.is_unlocked());
    }

    #[test]
    fn test_wrong_passphrase_keeps_locked() {
        let mut wallet = WalletHandle::create_with("pass", &light()).unwrap();
        let err = wallet.unlock("nope").unwrap_err();
        assert!(matches!(err, KeystoreError::IntegrityError(_)));
        assert!(!wallet.is_unlocked());
    }

    #[test]
    fn test_import_preserves_address() {
        let key = PrivateKey::from_hex(PBKDF2_VECTOR_PRIVATE_KEY).unwrap();
        let mut wallet = WalletHandle::create_from_private_key(key, "pw", &light()).unwrap();
        assert_eq!(wallet.address(), "0x008aeeda4d805471df9b2a5b0f38a0c3bcba786b");

        wallet.lock();
        wallet.unlock("pw").unwrap();
        assert_eq!(
            hex::encode(wallet.private_key().unwrap().as_bytes()),
            PBKDF2_VECTOR_PRIVATE_KEY
        );
    }

    #[test]
    fn test_raw_key_handle_starts_unlocked() {
        let key = PrivateKey::from_hex(PBKDF2_VECTOR_PRIVATE_KEY).unwrap();
        let mut wallet = WalletHandle::create_from_private_key(key, "pw", &light()).unwrap();
        assert!(wallet.is_unlocked());
        assert_eq!(
            hex::encode(wallet.private_key().unwrap().as_bytes()),
            PBKDF2_VECTOR_PRIVATE_KEY
        );

        wallet.lock();
        assert!(!wallet.is_unlocked());
        assert!(wallet.decrypt_transient("pw").is_ok());
    }

    #[test]
    fn test_secret_key_scope() {
        let key = PrivateKey::from_hex(PBKDF2_VECTOR_PRIVATE_KEY).unwrap();
        let bytes = key.with_secret_key(|secret| secret.secret_bytes()).unwrap();
        assert_eq!(hex::encode(bytes), PBKDF2_VECTOR_PRIVATE_KEY);
        // The wrapped key is untouched by the temporary's erasure
        assert_eq!(hex::encode(key.as_bytes()), PBKDF2_VECTOR_PRIVATE_KEY);
    }

    #[test]
    fn test_keystore_json_reopen() {
        let wallet = WalletHandle::create_with("pw", &light()).unwrap();
        let json = wallet.keystore().to_json().unwrap();

        let mut reopened = WalletHandle::from_json(&json).unwrap();
        assert_eq!(reopened.address(), wallet.address());
        reopened.unlock("pw").unwrap();
    }

    #[test]
    fn test_created_keystore_shape() {
        let wallet = WalletHandle::create_with("pw", &light()).unwrap();
        let ks = wallet.keystore();
        assert_eq!(ks.version, 3);
        assert_eq!(ks.id.get_version_num(), 4);
        assert_eq!(ks.crypto.cipher, "aes-128-ctr");
        assert_eq!(ks.crypto.kdf, "pbkdf2");
        assert_eq!(ks.crypto.kdfparams.prf, "hmac-sha256");
        assert_eq!(ks.crypto.kdfparams.dklen, 32);
        assert_eq!(ks.crypto.kdfparams.salt.len(), 64);
        assert_eq!(ks.crypto.cipherparams.iv.len(), 32);
        assert_eq!(ks.crypto.ciphertext.len(), 64);
        assert_eq!(ks.crypto.mac.len(), 64);
        assert!(!ks.address.starts_with("0x"));
    }

    #[test]
    fn test_transient_decrypt_leaves_handle_locked() {
        let wallet = WalletHandle::create_with("pw", &light()).unwrap();
        let key = wallet.decrypt_transient("pw").unwrap();
        assert_eq!(format!("0x{}", hex::encode(key.address().unwrap())), wallet.address());
        assert!(!wallet.is_unlocked());
    }
}
