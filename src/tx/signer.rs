//! Transaction Signer
//!
//! Binds a transaction, a nonce and an unlocked key into an immutable
//! `SignedTransaction`. Pure computation: no I/O, no retained state.

use std::cmp::Ordering;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

use super::rlp;
use super::transaction::Transaction;
use super::TxError;
use crate::abi::U256;
use crate::keystore::{PrivateKey, WalletHandle};
use crate::log_info;
use crate::utils::crypto::{address_from_public_key, keccak256};

/// A signed legacy transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: U256,
    nonce: u64,
    gas_price: U256,
    gas_limit: U256,
    data: Vec<u8>,
    chain_id: Option<u64>,
    v: u64,
    r: [u8; 32],
    s: [u8; 32],
    encoded_bytes: Vec<u8>,
}

impl SignedTransaction {
    /// `0x`-prefixed keccak256 of the signed encoding
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Sender address, `0x`-prefixed lowercase
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient exactly as supplied to the transaction
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn value(&self) -> &U256 {
        &self.value
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn gas_price(&self) -> &U256 {
        &self.gas_price
    }

    pub fn gas_limit(&self) -> &U256 {
        &self.gas_limit
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn v(&self) -> u64 {
        self.v
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// RLP `[nonce, gas_price, gas_limit, to, value, data, v, r, s]`
    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded_bytes
    }

    /// `0x`-prefixed hex of the encoded bytes
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.encoded_bytes))
    }

    /// Order by nonce. Only defined for transactions from the same sender.
    pub fn cmp_nonce(&self, other: &SignedTransaction) -> Option<Ordering> {
        if self.from.eq_ignore_ascii_case(&other.from) {
            Some(self.nonce.cmp(&other.nonce))
        } else {
            None
        }
    }

    /// Recover the signer address from the signature
    pub fn recover_signer(&self) -> Result<String, TxError> {
        let unsigned = Transaction {
            to: self.to.clone(),
            value: self.value,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: self.data.clone(),
            chain_id: self.chain_id,
        };
        let hash = unsigned.signing_hash(self.nonce)?;

        let base = match self.chain_id {
            Some(chain_id) => chain_v_offset(chain_id)?,
            None => 27,
        };
        let recid = self
            .v
            .checked_sub(base)
            .filter(|&id| id <= 1)
            .ok_or_else(|| TxError::Signing(format!("invalid v value {}", self.v)))?;

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);

        let secp = Secp256k1::verification_only();
        let signature =
            RecoverableSignature::from_compact(&compact, RecoveryId::from_i32(recid as i32)?)?;
        let public_key = secp.recover_ecdsa(&Message::from_digest_slice(&hash)?, &signature)?;
        Ok(format!("0x{}", hex::encode(address_from_public_key(&public_key))))
    }
}

/// Sign with an unlocked wallet
pub fn sign(
    tx: &Transaction,
    wallet: &WalletHandle,
    nonce: u64,
) -> Result<SignedTransaction, TxError> {
    let key = wallet.private_key().ok_or(TxError::WalletLocked)?;
    sign_with_key(tx, key, nonce)
}

/// Decrypt a transient key, sign, and drop the key. The handle's
/// locked/unlocked state is left untouched.
pub fn sign_with_passphrase(
    tx: &Transaction,
    wallet: &WalletHandle,
    passphrase: &str,
    nonce: u64,
) -> Result<SignedTransaction, TxError> {
    let key = wallet.decrypt_transient(passphrase)?;
    sign_with_key(tx, &key, nonce)
}

/// Sign with a raw private key
pub fn sign_with_key(
    tx: &Transaction,
    key: &PrivateKey,
    nonce: u64,
) -> Result<SignedTransaction, TxError> {
    let hash = tx.signing_hash(nonce)?;

    let secp = Secp256k1::signing_only();
    let message = Message::from_digest_slice(&hash)?;
    let signature = key.with_secret_key(|secret| secp.sign_ecdsa_recoverable(&message, secret))?;
    let (recid, compact) = signature.serialize_compact();
    let recid = recid.to_i32() as u64;

    let v = match tx.chain_id {
        Some(chain_id) => chain_v_offset(chain_id)? + recid,
        None => 27 + recid,
    };
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    let mut fields = tx.rlp_fields(nonce)?;
    fields.push(rlp::encode_u64(v));
    fields.push(rlp::encode_word(&r));
    fields.push(rlp::encode_word(&s));
    let encoded_bytes = rlp::encode_list(&fields);

    let hash = format!("0x{}", hex::encode(keccak256(&encoded_bytes)));
    let from = format!("0x{}", hex::encode(key.address()?));

    log_info!("tx", "transaction signed", from = from, tx_hash = hash, nonce = nonce);

    Ok(SignedTransaction {
        hash,
        from,
        to: tx.to.clone(),
        value: tx.value,
        nonce,
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit,
        data: tx.data.clone(),
        chain_id: tx.chain_id,
        v,
        r,
        s,
        encoded_bytes,
    })
}

/// `35 + 2 * chain_id`
fn chain_v_offset(chain_id: u64) -> Result<u64, TxError> {
    chain_id
        .checked_mul(2)
        .and_then(|x| x.checked_add(35))
        .ok_or_else(|| TxError::InvalidTransaction(format!("chain id {} too large", chain_id)))
}
