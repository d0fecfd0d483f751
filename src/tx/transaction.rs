//! Unsigned legacy transaction

use super::rlp;
use super::{TxError, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE_WEI, MAX_GAS_LIMIT};
use crate::abi::{AbiEncoder, AbiError, AbiValue, FunctionDescriptor, U256};
use crate::config::TxDefaults;
use crate::utils::crypto::{decode_hex_lenient, keccak256};

/// A transaction under construction. Signing consumes a reference and
/// produces an immutable `SignedTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Recipient as hex; `None` or empty means contract creation
    pub to: Option<String>,
    pub value: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub data: Vec<u8>,
    /// Enables EIP-155 replay protection when set
    pub chain_id: Option<u64>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            to: None,
            value: U256::ZERO,
            gas_price: U256::from(DEFAULT_GAS_PRICE_WEI),
            gas_limit: U256::from(DEFAULT_GAS_LIMIT),
            data: Vec::new(),
            chain_id: None,
        }
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from configured defaults
    pub fn with_defaults(defaults: &TxDefaults) -> Self {
        Self {
            gas_price: U256::from(defaults.gas_price_wei),
            gas_limit: U256::from(defaults.gas_limit),
            chain_id: defaults.chain_id,
            ..Self::default()
        }
    }

    /// Contract call: `data = selector || arguments`
    pub fn call(
        to: impl Into<String>,
        function: &FunctionDescriptor,
        args: &[AbiValue],
    ) -> Result<Self, AbiError> {
        Ok(Self::new().with_to(to).with_data(function.encode(args)?))
    }

    /// Contract creation: `data = bytecode || constructor arguments`
    pub fn deploy(
        bytecode: &[u8],
        constructor: &FunctionDescriptor,
        args: &[AbiValue],
    ) -> Result<Self, AbiError> {
        Ok(Self::new().with_data(AbiEncoder::encode_constructor(constructor, bytecode, args)?))
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.as_deref().map_or(true, |t| t.trim_start_matches("0x").is_empty())
    }

    /// Recipient bytes; empty for contract creation
    pub fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        let to = match self.to.as_deref() {
            Some(to) if !self.is_contract_creation() => to,
            _ => return Ok(Vec::new()),
        };
        let bytes = decode_hex_lenient(to)
            .map_err(|e| TxError::InvalidTransaction(format!("invalid recipient hex: {}", e)))?;
        if bytes.len() > 20 {
            return Err(TxError::InvalidTransaction(format!(
                "recipient is {} bytes, at most 20 allowed",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    pub fn validate(&self) -> Result<(), TxError> {
        if self.gas_limit > U256::from(MAX_GAS_LIMIT) {
            return Err(TxError::InvalidTransaction(format!(
                "gas limit {} exceeds maximum {}",
                self.gas_limit, MAX_GAS_LIMIT
            )));
        }
        if self.chain_id == Some(0) {
            return Err(TxError::InvalidTransaction("chain id must be non-zero".to_string()));
        }
        self.to_bytes().map(|_| ())
    }

    /// RLP items `[nonce, gas_price, gas_limit, to, value, data]`
    pub(crate) fn rlp_fields(&self, nonce: u64) -> Result<Vec<Vec<u8>>, TxError> {
        self.validate()?;
        Ok(vec![
            rlp::encode_u64(nonce),
            rlp::encode_u256(&self.gas_price),
            rlp::encode_u256(&self.gas_limit),
            rlp::encode_bytes(&self.to_bytes()?),
            rlp::encode_u256(&self.value),
            rlp::encode_bytes(&self.data),
        ])
    }

    /// Payload hashed for signing; EIP-155 appends `[chain_id, 0, 0]`
    pub fn signing_payload(&self, nonce: u64) -> Result<Vec<u8>, TxError> {
        let mut fields = self.rlp_fields(nonce)?;
        if let Some(chain_id) = self.chain_id {
            fields.push(rlp::encode_u64(chain_id));
            fields.push(rlp::encode_u64(0));
            fields.push(rlp::encode_u64(0));
        }
        Ok(rlp::encode_list(&fields))
    }

    pub fn signing_hash(&self, nonce: u64) -> Result<[u8; 32], TxError> {
        Ok(keccak256(&self.signing_payload(nonce)?))
    }
}
