//! Contract Transaction Core
//!
//! Client-side building blocks for talking to EVM contracts.
//!
//! # Architecture
//!
//! This crate provides:
//! - **abi**: ABI types, function/event descriptors, head/tail codec, JSON ABI index
//! - **keystore**: Web3 Secret Storage (V3) keystores and the lock/unlock `WalletHandle`
//! - **tx**: legacy transactions, RLP, EIP-155 signing, receipt polling
//! - **rpc**: the `Transport` seam and `eth_call` / `eth_sendRawTransaction` helpers
//! - **config**: KDF and transaction defaults
//! - **error**: the crate-level `CoreError`
//!
//! # Security
//!
//! Private keys and derived keys live in `zeroize` buffers and are cleared
//! on lock and drop. Log fields carrying secrets are redacted before they
//! reach `tracing`.
//!
//! # Example
//!
//! ```rust,ignore
//! use contract_tx_core::{abi::ContractIndex, keystore::WalletHandle, tx};
//!
//! let index = ContractIndex::from_json(GREETER_ABI)?;
//! let set_greeting = index.function("setGreeting")?;
//!
//! let mut wallet = WalletHandle::from_json(&keystore_json)?;
//! wallet.unlock("passphrase")?;
//!
//! let unsigned = tx::Transaction::call(contract, set_greeting, &args)?.with_chain_id(1);
//! let signed = tx::sign(&unsigned, &wallet, nonce)?;
//! let hash = rpc::ContractCaller::send_raw(&transport, &signed)?;
//! ```

pub mod abi;
pub mod config;
pub mod error;
pub mod keystore;
pub mod rpc;
pub mod tx;
pub mod utils;

pub use abi::{AbiError, AbiType, AbiValue, ContractIndex, FunctionDescriptor, I256, U256};
pub use config::{CoreConfig, KdfSettings, TxDefaults};
pub use error::{CoreError, CoreResult, ErrorCode};
pub use keystore::{KeystoreError, PrivateKey, WalletHandle, WalletKeystore};
pub use rpc::{CallError, ContractCaller, Transport, TransportError};
pub use tx::{
    sign, sign_with_key, sign_with_passphrase, CancellationToken, PollError, ReceiptPoller,
    SignedTransaction, Transaction, TxError, TxReceipt,
};
pub use utils::crypto::{keccak256, to_checksum_address};
