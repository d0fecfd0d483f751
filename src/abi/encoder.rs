//! ABI encoder for Solidity/EVM contracts

use super::function::FunctionDescriptor;
use super::types::*;

/// ABI encoder
pub struct AbiEncoder;

impl AbiEncoder {
    /// Encode a single value according to its type.
    ///
    /// Dynamic values are returned as their tail encoding (length or count
    /// word followed by content); the caller places the offset.
    pub fn encode_value(value: &AbiValue, abi_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        match (value, abi_type) {
            (AbiValue::Uint(u), AbiType::Int { signed: false, bits }) => {
                if u.bits() > *bits as u32 {
                    return Err(AbiError::Encoding(format!("value {} does not fit uint{}", u, bits)));
                }
                Ok(u.to_be_bytes().to_vec())
            }

            // Unsigned value passed for a signed slot: must fit the positive range
            (AbiValue::Uint(u), AbiType::Int { signed: true, bits }) => {
                let as_signed = I256::new(*u, false);
                if !as_signed.fits_signed(*bits) {
                    return Err(AbiError::Encoding(format!("value {} does not fit int{}", u, bits)));
                }
                Ok(as_signed.to_be_bytes().to_vec())
            }

            (AbiValue::Int(i), AbiType::Int { signed: true, bits }) => {
                if !i.fits_signed(*bits) {
                    return Err(AbiError::Encoding(format!("value {} does not fit int{}", i, bits)));
                }
                Ok(i.to_be_bytes().to_vec())
            }

            (AbiValue::Int(i), AbiType::Int { signed: false, bits }) => {
                if i.is_negative() {
                    return Err(AbiError::Encoding(format!("negative value {} for uint{}", i, bits)));
                }
                Self::encode_value(&AbiValue::Uint(i.magnitude()), abi_type)
            }

            (AbiValue::Address(addr), AbiType::Address) => {
                let mut result = [0u8; 32];
                result[12..].copy_from_slice(addr);
                Ok(result.to_vec())
            }

            // Integer supplied for an address: the upper 12 bytes must be zero
            (AbiValue::Uint(u), AbiType::Address) => {
                let word = u.to_be_bytes();
                if word[..12].iter().any(|&b| b != 0) {
                    return Err(AbiError::Encoding(format!("malformed address: 0x{}", u.to_hex())));
                }
                Ok(word.to_vec())
            }

            (AbiValue::Bool(b), AbiType::Bool) => {
                let mut result = [0u8; 32];
                result[31] = u8::from(*b);
                Ok(result.to_vec())
            }

            (AbiValue::FixedBytes(bytes), AbiType::FixedBytes(size)) => {
                if bytes.len() > *size {
                    return Err(AbiError::Encoding(format!(
                        "{} bytes do not fit bytes{}",
                        bytes.len(),
                        size
                    )));
                }
                let mut result = [0u8; 32];
                result[..bytes.len()].copy_from_slice(bytes);
                Ok(result.to_vec())
            }

            (AbiValue::Bytes(bytes), AbiType::Bytes) => Ok(Self::encode_dynamic_bytes(bytes)),

            (AbiValue::String(s), AbiType::String) => Ok(Self::encode_dynamic_bytes(s.as_bytes())),

            (AbiValue::Array(values), AbiType::Array(inner_type)) => {
                let mut result = U256::from(values.len() as u64).to_be_bytes().to_vec();
                let types = vec![inner_type.as_ref(); values.len()];
                result.extend_from_slice(&Self::encode_sequence(values, &types)?);
                Ok(result)
            }

            (AbiValue::Array(values), AbiType::FixedArray(inner_type, size)) => {
                if values.len() != *size {
                    return Err(AbiError::TypeMismatch {
                        expected: format!("array of size {}", size),
                        got: format!("array of size {}", values.len()),
                    });
                }
                let types = vec![inner_type.as_ref(); values.len()];
                Self::encode_sequence(values, &types)
            }

            _ => Err(AbiError::TypeMismatch {
                expected: abi_type.canonical_type(),
                got: value.kind_name().to_string(),
            }),
        }
    }

    /// Encode multiple values as one head/tail sequence
    pub fn encode(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        if values.len() != types.len() {
            return Err(AbiError::Encoding(format!(
                "Value count {} doesn't match type count {}",
                values.len(),
                types.len()
            )));
        }
        let types: Vec<&AbiType> = types.iter().collect();
        Self::encode_sequence(values, &types)
    }

    /// Head/tail encoding. Offsets are measured from the start of the sequence.
    fn encode_sequence(values: &[AbiValue], types: &[&AbiType]) -> Result<Vec<u8>, AbiError> {
        let mut parts = Vec::with_capacity(values.len());
        let mut head_size = 0usize;
        for (value, abi_type) in values.iter().zip(types.iter()) {
            let encoded = Self::encode_value(value, abi_type)?;
            let dynamic = abi_type.is_dynamic();
            head_size += if dynamic { WORD_SIZE } else { encoded.len() };
            parts.push((dynamic, encoded));
        }

        let mut head = Vec::with_capacity(head_size);
        let mut tail = Vec::new();
        for (dynamic, encoded) in parts {
            if dynamic {
                let offset = head_size + tail.len();
                head.extend_from_slice(&U256::from(offset as u64).to_be_bytes());
                tail.extend_from_slice(&encoded);
            } else {
                head.extend_from_slice(&encoded);
            }
        }

        head.extend_from_slice(&tail);
        Ok(head)
    }

    /// `[length:32][content right-padded to a multiple of 32]`
    fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
        let padded_len = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
        let mut result = Vec::with_capacity(WORD_SIZE + padded_len);
        result.extend_from_slice(&U256::from(bytes.len() as u64).to_be_bytes());
        result.extend_from_slice(bytes);
        result.resize(WORD_SIZE + padded_len, 0);
        result
    }

    /// Encode the argument blob for a descriptor's inputs (no selector)
    pub fn encode_arguments(
        descriptor: &FunctionDescriptor,
        args: &[AbiValue],
    ) -> Result<Vec<u8>, AbiError> {
        let inputs = descriptor.inputs();
        if args.len() != inputs.len() {
            return Err(AbiError::Encoding(format!(
                "{} expects {} arguments, got {}",
                descriptor.signature(),
                inputs.len(),
                args.len()
            )));
        }
        Self::encode_sequence(args, &descriptor.input_types())
    }

    /// Encode a function call: selector followed by the argument blob
    pub fn encode_call(
        descriptor: &FunctionDescriptor,
        args: &[AbiValue],
    ) -> Result<Vec<u8>, AbiError> {
        let encoded = Self::encode_arguments(descriptor, args)?;
        let mut result = Vec::with_capacity(4 + encoded.len());
        result.extend_from_slice(&descriptor.selector());
        result.extend_from_slice(&encoded);
        Ok(result)
    }

    /// Encode a deployment payload: bytecode followed by constructor arguments
    pub fn encode_constructor(
        descriptor: &FunctionDescriptor,
        bytecode: &[u8],
        args: &[AbiValue],
    ) -> Result<Vec<u8>, AbiError> {
        let encoded = Self::encode_arguments(descriptor, args)?;
        let mut result = Vec::with_capacity(bytecode.len() + encoded.len());
        result.extend_from_slice(bytecode);
        result.extend_from_slice(&encoded);
        Ok(result)
    }
}

impl FunctionDescriptor {
    /// Selector plus encoded arguments
    pub fn encode(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        AbiEncoder::encode_call(self, args)
    }
}
