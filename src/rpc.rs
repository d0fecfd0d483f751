//! JSON-RPC seam
//!
//! The crate ships no network client. Callers implement `Transport` over
//! whatever HTTP or IPC stack they use; `ContractCaller` builds the
//! `eth_call` / `eth_sendRawTransaction` requests and interprets replies.

use serde_json::{json, Value};

use crate::abi::{AbiDecoder, AbiError, AbiValue, FunctionDescriptor};
use crate::log_debug;
use crate::tx::SignedTransaction;
use crate::utils::crypto::decode_hex_lenient;

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The node could not be reached
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The node answered with a JSON-RPC error object
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// The node answered with something that is not the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors of a decoded contract call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Abi(#[from] AbiError),
}

/// A JSON-RPC endpoint. Returns the `result` member of a successful reply.
pub trait Transport {
    fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        (**self).request(method, params)
    }
}

/// Request builders over a `Transport`
pub struct ContractCaller;

impl ContractCaller {
    /// Read-only call at the latest block; decodes the function outputs
    pub fn call<T: Transport + ?Sized>(
        transport: &T,
        to: &str,
        function: &FunctionDescriptor,
        args: &[AbiValue],
    ) -> Result<Vec<AbiValue>, CallError> {
        let data = function.encode(args)?;
        let params = vec![
            json!({ "to": to, "data": format!("0x{}", hex::encode(data)) }),
            json!("latest"),
        ];

        log_debug!("rpc", "eth_call", to = to, function = function.signature());
        let result = transport.request("eth_call", params)?;
        let bytes = hex_result(&result)?;
        Ok(AbiDecoder::decode_result(function, &bytes)?)
    }

    /// Submit a signed transaction; returns the hash reported by the node
    pub fn send_raw<T: Transport + ?Sized>(
        transport: &T,
        signed: &SignedTransaction,
    ) -> Result<String, TransportError> {
        log_debug!("rpc", "eth_sendRawTransaction", tx_hash = signed.hash());
        let result = transport.request("eth_sendRawTransaction", vec![json!(signed.raw_hex())])?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TransportError::InvalidResponse(format!("expected hash string, got {}", result)))
    }
}

/// Decode a `0x`-hex string result
pub(crate) fn hex_result(value: &Value) -> Result<Vec<u8>, TransportError> {
    let s = value
        .as_str()
        .ok_or_else(|| TransportError::InvalidResponse(format!("expected hex string, got {}", value)))?;
    decode_hex_lenient(s).map_err(|e| TransportError::InvalidResponse(format!("invalid hex: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use crate::abi::{AbiEncoder, AbiType, Param};
    use crate::keystore::PrivateKey;
    use crate::tx::{sign_with_key, Transaction};

    fn greet() -> FunctionDescriptor {
        FunctionDescriptor::constant("greet", vec![], vec![Param::new("", AbiType::String)])
    }

    #[test]
    fn test_call_builds_request_and_decodes() {
        let encoded = AbiEncoder::encode(&[AbiValue::string("hello")], &[AbiType::String]).unwrap();
        let transport = MockTransport::with_replies(vec![Ok(json!(format!("0x{}", hex::encode(encoded))))]);

        let result = ContractCaller::call(&transport, "0xabc", &greet(), &[]).unwrap();
        assert_eq!(result, vec![AbiValue::string("hello")]);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].0, "eth_call");
        assert_eq!(requests[0].1[0]["to"], "0xabc");
        assert_eq!(requests[0].1[0]["data"], format!("0x{}", hex::encode(greet().selector())));
        assert_eq!(requests[0].1[1], "latest");
    }

    #[test]
    fn test_call_surfaces_remote_and_decode_errors() {
        let remote = TransportError::Remote { code: -32000, message: "execution reverted".to_string() };
        let transport = MockTransport::with_replies(vec![Err(remote.clone()), Ok(json!("0x00"))]);

        assert_eq!(
            ContractCaller::call(&transport, "0xabc", &greet(), &[]).unwrap_err(),
            CallError::Transport(remote)
        );
        assert!(matches!(
            ContractCaller::call(&transport, "0xabc", &greet(), &[]),
            Err(CallError::Abi(AbiError::Decoding(_)))
        ));
    }

    #[test]
    fn test_call_passes_multibyte_target_through() {
        let target = format!("0x{}", "\u{20ac}".repeat(5));
        let transport = MockTransport::with_replies(vec![Err(TransportError::Remote {
            code: -32602,
            message: "invalid address".to_string(),
        })]);

        let err = ContractCaller::call(&transport, &target, &greet(), &[]).unwrap_err();
        assert!(matches!(err, CallError::Transport(TransportError::Remote { .. })));
        assert_eq!(transport.requests.lock().unwrap()[0].1[0]["to"], target.as_str());
    }

    #[test]
    fn test_send_raw() {
        let key = PrivateKey::from_bytes(&[0x46; 32]).unwrap();
        let signed = sign_with_key(&Transaction::new().with_to("12"), &key, 0).unwrap();
        let transport = MockTransport::with_replies(vec![Ok(json!(signed.hash())), Ok(json!(42))]);

        assert_eq!(ContractCaller::send_raw(&transport, &signed).unwrap(), signed.hash());
        assert_eq!(transport.requests.lock().unwrap()[0].1[0], json!(signed.raw_hex()));

        assert!(matches!(
            ContractCaller::send_raw(&transport, &signed),
            Err(TransportError::InvalidResponse(_))
        ));
    }
}
