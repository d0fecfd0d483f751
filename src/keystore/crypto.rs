//! PBKDF2 / AES-128-CTR / keccak MAC primitives of the V3 format

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::format::{CipherParams, CryptoParams, KdfParams, WalletKeystore};
use super::wallet::PrivateKey;
use super::{KeystoreError, CIPHER_AES_128_CTR, KDF_PBKDF2, KEYSTORE_VERSION, PRF_HMAC_SHA256};
use crate::config::{KdfSettings, KEYSTORE_DKLEN};
use crate::log_debug;
use crate::utils::crypto::keccak256_concat;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Encrypt a private key under `passphrase`
pub fn encrypt_private_key(
    key: &PrivateKey,
    passphrase: &str,
    settings: &KdfSettings,
) -> Result<CryptoParams, KeystoreError> {
    if settings.iterations == 0 || settings.dklen != KEYSTORE_DKLEN {
        return Err(KeystoreError::UnsupportedFormat(format!(
            "KDF settings c={} dklen={}",
            settings.iterations, settings.dklen
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let derived = derive_key(passphrase, &salt, settings.iterations);
    let (enc_key, mac_key) = derived.split_at(16);

    let mut ciphertext = key.as_bytes().to_vec();
    apply_keystream(enc_key, &iv, &mut ciphertext)?;
    let mac = keccak256_concat(&[mac_key, &ciphertext]);

    Ok(CryptoParams {
        cipher: CIPHER_AES_128_CTR.to_string(),
        ciphertext: hex::encode(&ciphertext),
        cipherparams: CipherParams { iv: hex::encode(iv) },
        kdf: KDF_PBKDF2.to_string(),
        kdfparams: KdfParams {
            salt: hex::encode(salt),
            c: settings.iterations,
            dklen: settings.dklen,
            prf: PRF_HMAC_SHA256.to_string(),
        },
        mac: hex::encode(mac),
    })
}

/// Recover the private key of a keystore.
///
/// Format checks run before any derivation; the MAC is verified in
/// constant time before decryption.
pub fn decrypt_private_key(
    keystore: &WalletKeystore,
    passphrase: &str,
) -> Result<PrivateKey, KeystoreError> {
    check_format(keystore)?;
    let crypto = &keystore.crypto;

    let salt = hex::decode(&crypto.kdfparams.salt)?;
    let iv = hex::decode(&crypto.cipherparams.iv)?;
    let ciphertext = hex::decode(&crypto.ciphertext)?;
    let stored_mac = hex::decode(&crypto.mac)?;
    if iv.len() != IV_LEN {
        return Err(KeystoreError::UnsupportedFormat(format!("iv length {}", iv.len())));
    }

    log_debug!("keystore", "deriving key", iterations = crypto.kdfparams.c);
    let derived = derive_key(passphrase, &salt, crypto.kdfparams.c);
    let (enc_key, mac_key) = derived.split_at(16);

    let mac = keccak256_concat(&[mac_key, &ciphertext]);
    if !bool::from(mac[..].ct_eq(&stored_mac[..])) {
        return Err(KeystoreError::IntegrityError("MAC mismatch".to_string()));
    }

    let mut plaintext = Zeroizing::new(ciphertext);
    apply_keystream(enc_key, &iv, &mut plaintext)?;

    let key = PrivateKey::from_bytes(&plaintext)
        .map_err(|_| KeystoreError::IntegrityError("decrypted key is not valid".to_string()))?;
    if key.address()? != keystore.address_bytes()? {
        return Err(KeystoreError::IntegrityError(
            "decrypted key does not match stored address".to_string(),
        ));
    }
    Ok(key)
}

fn check_format(keystore: &WalletKeystore) -> Result<(), KeystoreError> {
    let crypto = &keystore.crypto;
    let params = &crypto.kdfparams;

    if keystore.version != KEYSTORE_VERSION {
        return Err(KeystoreError::UnsupportedFormat(format!("version {}", keystore.version)));
    }
    if crypto.cipher != CIPHER_AES_128_CTR {
        return Err(KeystoreError::UnsupportedFormat(format!("cipher {}", crypto.cipher)));
    }
    if crypto.kdf != KDF_PBKDF2 {
        return Err(KeystoreError::UnsupportedFormat(format!("kdf {}", crypto.kdf)));
    }
    if params.prf != PRF_HMAC_SHA256 {
        return Err(KeystoreError::UnsupportedFormat(format!("prf {}", params.prf)));
    }
    if params.dklen != KEYSTORE_DKLEN || params.c == 0 {
        return Err(KeystoreError::UnsupportedFormat(format!(
            "kdf params c={} dklen={}",
            params.c, params.dklen
        )));
    }
    Ok(())
}

/// PBKDF2-HMAC-SHA256 into a 32-byte buffer scrubbed on drop
fn derive_key(passphrase: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; 32]> {
    let mut derived = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, derived.as_mut());
    derived
}

/// AES-128-CTR; encryption and decryption are the same operation
fn apply_keystream(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), KeystoreError> {
    let mut cipher = Aes128Ctr::new_from_slices(key, iv)
        .map_err(|e| KeystoreError::Crypto(format!("cipher init failed: {}", e)))?;
    cipher.apply_keystream(buf);
    Ok(())
}
