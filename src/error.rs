//! Unified error type
//!
//! Module errors (`AbiError`, `KeystoreError`, `TxError`, `TransportError`,
//! `PollError`) convert into a serializable `CoreError` carrying a stable
//! code for callers that want one error type across the whole pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::abi::AbiError;
use crate::keystore::KeystoreError;
use crate::rpc::{CallError, TransportError};
use crate::tx::{PollError, TxError};

/// Crate-level error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidPrivateKey,
    InvalidTransaction,

    // ABI errors
    InvalidAbi,
    InvalidType,
    NoSuchContractMethod,
    AbiEncoding,
    AbiDecoding,

    // Keystore errors
    KeystoreIntegrity,
    UnsupportedKeystoreFormat,
    WalletLocked,

    // Crypto errors
    CryptoError,
    SigningFailed,

    // Transport errors
    NetworkError,
    RemoteError,
    Timeout,
    Cancelled,

    // Parse errors
    ParseError,
    JsonError,
    HexError,

    // Internal
    Internal,
}

/// Result type alias for crate operations
pub type CoreResult<T> = Result<T, CoreError>;

impl From<AbiError> for CoreError {
    fn from(e: AbiError) -> Self {
        let code = match &e {
            AbiError::NoSuchContractMethod(_) => ErrorCode::NoSuchContractMethod,
            AbiError::InvalidAbi(_) => ErrorCode::InvalidAbi,
            AbiError::InvalidType(_) => ErrorCode::InvalidType,
            AbiError::InvalidValue(_) => ErrorCode::InvalidInput,
            AbiError::Decoding(_) => ErrorCode::AbiDecoding,
            AbiError::Encoding(_) | AbiError::TypeMismatch { .. } | AbiError::Overflow => {
                ErrorCode::AbiEncoding
            }
        };
        CoreError::new(code, e.to_string())
    }
}

impl From<KeystoreError> for CoreError {
    fn from(e: KeystoreError) -> Self {
        let code = match &e {
            KeystoreError::IntegrityError(_) => ErrorCode::KeystoreIntegrity,
            KeystoreError::UnsupportedFormat(_) => ErrorCode::UnsupportedKeystoreFormat,
            KeystoreError::InvalidKey(_) => ErrorCode::InvalidPrivateKey,
            KeystoreError::Encoding(_) => ErrorCode::ParseError,
            KeystoreError::Crypto(_) => ErrorCode::CryptoError,
        };
        CoreError::new(code, e.to_string())
    }
}

impl From<TxError> for CoreError {
    fn from(e: TxError) -> Self {
        match e {
            TxError::Keystore(inner) => inner.into(),
            TxError::Abi(inner) => inner.into(),
            TxError::WalletLocked => CoreError::new(ErrorCode::WalletLocked, e.to_string()),
            TxError::InvalidTransaction(_) => {
                CoreError::new(ErrorCode::InvalidTransaction, e.to_string())
            }
            TxError::Signing(_) => CoreError::new(ErrorCode::SigningFailed, e.to_string()),
        }
    }
}

impl From<TransportError> for CoreError {
    fn from(e: TransportError) -> Self {
        let code = match &e {
            TransportError::Connectivity(_) => ErrorCode::NetworkError,
            TransportError::Remote { .. } => ErrorCode::RemoteError,
            TransportError::InvalidResponse(_) => ErrorCode::ParseError,
        };
        CoreError::new(code, e.to_string())
    }
}

impl From<CallError> for CoreError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(inner) => inner.into(),
            CallError::Abi(inner) => inner.into(),
        }
    }
}

impl From<PollError> for CoreError {
    fn from(e: PollError) -> Self {
        match e {
            PollError::Transport(inner) => inner.into(),
            PollError::Timeout { .. } => CoreError::new(ErrorCode::Timeout, e.to_string()),
            PollError::Cancelled => CoreError::new(ErrorCode::Cancelled, e.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<secp256k1::Error> for CoreError {
    fn from(e: secp256k1::Error) -> Self {
        CoreError::new(ErrorCode::CryptoError, format!("Secp256k1 error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = CoreError::from(KeystoreError::IntegrityError("MAC mismatch".to_string()))
            .with_details("wallet 0x7e5f...5bdf");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("keystore_integrity"));
        assert!(json.contains("MAC mismatch"));

        let back: CoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_abi_error_codes() {
        let missing: CoreError = AbiError::NoSuchContractMethod("foo".to_string()).into();
        assert_eq!(missing.code, ErrorCode::NoSuchContractMethod);

        let overflow: CoreError = AbiError::Overflow.into();
        assert_eq!(overflow.code, ErrorCode::AbiEncoding);
    }

    #[test]
    fn test_wrapped_tx_errors_keep_inner_code() {
        let err: CoreError = TxError::Keystore(KeystoreError::UnsupportedFormat("scrypt".into())).into();
        assert_eq!(err.code, ErrorCode::UnsupportedKeystoreFormat);

        let locked: CoreError = TxError::WalletLocked.into();
        assert_eq!(locked.code, ErrorCode::WalletLocked);
    }

    #[test]
    fn test_display_includes_details() {
        let err = CoreError::invalid_input("bad").with_details("extra");
        assert_eq!(err.to_string(), "[InvalidInput] bad (extra)");
    }
}
