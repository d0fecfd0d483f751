//! Transaction Module
//!
//! Builds legacy transactions, signs them with an unlocked wallet
//! (EIP-155 when a chain id is set) and tracks receipts.

mod rlp;
mod signer;
mod tracker;
mod transaction;

pub use signer::*;
pub use tracker::*;
pub use transaction::*;

use crate::abi::AbiError;
use crate::keystore::KeystoreError;

/// Default gas price: 50 gwei
pub const DEFAULT_GAS_PRICE_WEI: u64 = 50_000_000_000;

/// Default gas limit
pub const DEFAULT_GAS_LIMIT: u64 = 90_000;

/// Highest gas limit accepted for a transaction
pub const MAX_GAS_LIMIT: u64 = 3_141_592;

/// Transaction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    #[error("Wallet is locked")]
    WalletLocked,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error(transparent)]
    Abi(#[from] AbiError),
}

impl From<secp256k1::Error> for TxError {
    fn from(e: secp256k1::Error) -> Self {
        TxError::Signing(e.to_string())
    }
}
