//! ABI decoder for Solidity/EVM contracts
//!
//! Every read is bounds-checked; hostile input yields `AbiError::Decoding`.

use super::function::FunctionDescriptor;
use super::types::*;

/// ABI decoder
pub struct AbiDecoder;

/// A decoded event log, parameters in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub name: String,
    pub params: Vec<(String, AbiValue)>,
}

impl DecodedEvent {
    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Decoded output allowed per input byte. Canonical encodings never read the
/// same tail twice, so they stay under one.
const OUTPUT_FACTOR: usize = 2;

/// Bounds the decoded output of one input buffer. Offsets may alias the
/// same tail, so without a cap a small payload can expand to many copies.
struct DecodeBudget {
    remaining: usize,
}

impl DecodeBudget {
    fn for_input(data: &[u8]) -> Self {
        Self { remaining: data.len().saturating_mul(OUTPUT_FACTOR) }
    }

    fn charge(&mut self, bytes: usize) -> Result<(), AbiError> {
        self.remaining = self
            .remaining
            .checked_sub(bytes)
            .ok_or_else(|| decoding("decoded output exceeds input size".to_string()))?;
        Ok(())
    }
}

impl AbiDecoder {
    /// Decode a value whose encoding starts at `offset`.
    ///
    /// Returns the value and the number of head bytes it occupies in its
    /// enclosing sequence (one word for dynamic types).
    pub fn decode_value(
        data: &[u8],
        abi_type: &AbiType,
        offset: usize,
    ) -> Result<(AbiValue, usize), AbiError> {
        Self::decode_value_in(data, abi_type, offset, &mut DecodeBudget::for_input(data))
    }

    fn decode_value_in(
        data: &[u8],
        abi_type: &AbiType,
        offset: usize,
        budget: &mut DecodeBudget,
    ) -> Result<(AbiValue, usize), AbiError> {
        // Non-empty fixed arrays are paid for by their elements
        match abi_type {
            AbiType::FixedArray(_, len) if *len > 0 => {}
            _ => budget.charge(WORD_SIZE)?,
        }

        let value = match abi_type {
            AbiType::Int { signed: false, bits } => {
                let word = read_word(data, offset)?;
                let value = U256::from_be_bytes(word);
                if value.bits() > *bits as u32 {
                    return Err(decoding(format!("value out of range for uint{}", bits)));
                }
                AbiValue::Uint(value)
            }

            AbiType::Int { signed: true, bits } => {
                let value = I256::from_be_bytes(read_word(data, offset)?);
                if !value.fits_signed(*bits) {
                    return Err(decoding(format!("value out of range for int{}", bits)));
                }
                AbiValue::Int(value)
            }

            AbiType::Address => {
                let word = read_word(data, offset)?;
                if word[..12].iter().any(|&b| b != 0) {
                    return Err(decoding("address has non-zero padding".to_string()));
                }
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&word[12..]);
                AbiValue::Address(addr)
            }

            AbiType::Bool => {
                let word = read_word(data, offset)?;
                if word[..31].iter().any(|&b| b != 0) || word[31] > 1 {
                    return Err(decoding("bool must be 0 or 1".to_string()));
                }
                AbiValue::Bool(word[31] == 1)
            }

            AbiType::FixedBytes(size) => {
                let word = read_word(data, offset)?;
                AbiValue::FixedBytes(word[..*size].to_vec())
            }

            AbiType::Bytes => {
                let bytes = Self::decode_dynamic_bytes(data, offset)?;
                budget.charge(bytes.len())?;
                AbiValue::Bytes(bytes.to_vec())
            }

            AbiType::String => {
                let bytes = Self::decode_dynamic_bytes(data, offset)?;
                budget.charge(bytes.len())?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| decoding("string is not valid UTF-8".to_string()))?;
                AbiValue::String(s.to_string())
            }

            AbiType::Array(inner) => {
                let count = read_usize(data, offset)?;
                let start = offset
                    .checked_add(WORD_SIZE)
                    .ok_or_else(|| decoding("array offset overflow".to_string()))?;
                // Every element occupies at least one head word
                let available = data.len().saturating_sub(start) / WORD_SIZE;
                if count > available {
                    return Err(decoding(format!("array count {} exceeds data", count)));
                }
                let types = vec![inner.as_ref(); count];
                AbiValue::Array(Self::decode_sequence(data, start, &types, budget)?)
            }

            AbiType::FixedArray(inner, len) => {
                // Dynamic elements take one head word each
                let needed = if abi_type.is_dynamic() {
                    len.checked_mul(WORD_SIZE)
                } else {
                    abi_type.checked_head_size()
                };
                if !needed.is_some_and(|n| n <= data.len().saturating_sub(offset)) {
                    return Err(decoding(format!("fixed array of {} exceeds data", len)));
                }
                let types = vec![inner.as_ref(); *len];
                AbiValue::Array(Self::decode_sequence(data, offset, &types, budget)?)
            }
        };

        let consumed = abi_type
            .checked_head_size()
            .ok_or_else(|| decoding(format!("{} is too large", abi_type)))?;
        Ok((value, consumed))
    }

    /// Decode multiple values from one head/tail sequence starting at 0
    pub fn decode(data: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, AbiError> {
        let types: Vec<&AbiType> = types.iter().collect();
        Self::decode_all(data, &types)
    }

    fn decode_all(data: &[u8], types: &[&AbiType]) -> Result<Vec<AbiValue>, AbiError> {
        Self::decode_sequence(data, 0, types, &mut DecodeBudget::for_input(data))
    }

    /// Walk a head section at `base`; dynamic offsets are relative to `base`
    fn decode_sequence(
        data: &[u8],
        base: usize,
        types: &[&AbiType],
        budget: &mut DecodeBudget,
    ) -> Result<Vec<AbiValue>, AbiError> {
        let mut values = Vec::with_capacity(types.len());
        let mut head = base;

        for abi_type in types {
            if abi_type.is_dynamic() {
                let rel = read_usize(data, head)?;
                let position = base
                    .checked_add(rel)
                    .filter(|&p| p < data.len())
                    .ok_or_else(|| decoding(format!("offset {} out of range", rel)))?;
                let (value, _) = Self::decode_value_in(data, abi_type, position, budget)?;
                values.push(value);
                head += WORD_SIZE;
            } else {
                let (value, consumed) = Self::decode_value_in(data, abi_type, head, budget)?;
                values.push(value);
                head = head
                    .checked_add(consumed)
                    .ok_or_else(|| decoding("head overflow".to_string()))?;
            }
        }

        Ok(values)
    }

    /// Content of a `[length:32][content]` encoding
    fn decode_dynamic_bytes(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
        let len = read_usize(data, offset)?;
        let start = offset + WORD_SIZE;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| decoding(format!("length {} exceeds data", len)))?;
        Ok(&data[start..end])
    }

    /// Decode return data against the descriptor's outputs
    pub fn decode_result(
        descriptor: &FunctionDescriptor,
        data: &[u8],
    ) -> Result<Vec<AbiValue>, AbiError> {
        Self::decode_all(data, &descriptor.output_types())
    }

    /// Decode an argument blob (selector already stripped)
    pub fn decode_call_arguments(
        descriptor: &FunctionDescriptor,
        data: &[u8],
    ) -> Result<Vec<AbiValue>, AbiError> {
        Self::decode_all(data, &descriptor.input_types())
    }

    /// Decode full call data, checking the selector first
    pub fn decode_call_data(
        descriptor: &FunctionDescriptor,
        data: &[u8],
    ) -> Result<Vec<AbiValue>, AbiError> {
        if data.len() < 4 {
            return Err(decoding("call data shorter than a selector".to_string()));
        }
        if data[..4] != descriptor.selector() {
            return Err(decoding(format!(
                "selector 0x{} does not match {}",
                hex::encode(&data[..4]),
                descriptor.signature()
            )));
        }
        Self::decode_call_arguments(descriptor, &data[4..])
    }

    /// Decode an event log.
    ///
    /// Topic 0 is the signature hash unless the event is anonymous. The
    /// remaining topics pair 1:1 with indexed inputs; dynamic and array
    /// indexed values are returned as their 32-byte hash.
    pub fn decode_event(
        descriptor: &FunctionDescriptor,
        data: &[u8],
        topics: &[[u8; 32]],
    ) -> Result<DecodedEvent, AbiError> {
        let skip = usize::from(!descriptor.is_anonymous());
        let indexed = descriptor.indexed_inputs();
        if topics.len() != indexed.len() + skip {
            return Err(decoding(format!(
                "{} expects {} topics, got {}",
                descriptor.signature(),
                indexed.len() + skip,
                topics.len()
            )));
        }

        let inputs = descriptor.inputs();
        let mut slots: Vec<Option<AbiValue>> = vec![None; inputs.len()];

        for (&index, topic) in indexed.iter().zip(&topics[skip..]) {
            let ty = &inputs[index].param_type;
            let value = if ty.is_dynamic() || matches!(ty, AbiType::FixedArray(..)) {
                AbiValue::FixedBytes(topic.to_vec())
            } else {
                Self::decode_value(topic, ty, 0)?.0
            };
            slots[index] = Some(value);
        }

        let data_inputs = descriptor.data_inputs();
        let data_types: Vec<&AbiType> = data_inputs.iter().map(|&i| &inputs[i].param_type).collect();
        let data_values = Self::decode_all(data, &data_types)?;
        for (&index, value) in data_inputs.iter().zip(data_values) {
            slots[index] = Some(value);
        }

        let params = inputs
            .iter()
            .zip(slots)
            .map(|(param, slot)| {
                slot.map(|v| (param.name.clone(), v))
                    .ok_or_else(|| decoding(format!("missing value for {}", param.name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedEvent { name: descriptor.name().to_string(), params })
    }
}

impl FunctionDescriptor {
    /// Decode return data for this function
    pub fn decode_result(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        AbiDecoder::decode_result(self, data)
    }
}

fn decoding(msg: String) -> AbiError {
    AbiError::Decoding(msg)
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(WORD_SIZE)
        .filter(|&end| end <= data.len())
        .map(|end| &data[offset..end])
        .ok_or_else(|| decoding(format!("insufficient data at offset {}", offset)))
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    U256::from_be_bytes(read_word(data, offset)?)
        .to_usize()
        .ok_or_else(|| decoding(format!("length or offset at {} too large", offset)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encoder::AbiEncoder;

    fn word(v: u64) -> Vec<u8> {
        U256::from(v).to_be_bytes().to_vec()
    }

    #[test]
    fn test_decode_uint256() {
        let (value, consumed) = AbiDecoder::decode_value(&word(12345), &AbiType::UINT256, 0).unwrap();
        assert_eq!(value, AbiValue::uint(12345));
        assert_eq!(consumed, 32);
    }

    #[test]
    fn test_decode_negative_int() {
        let data = [0xffu8; 32];
        let (value, _) = AbiDecoder::decode_value(&data, &AbiType::int(8), 0).unwrap();
        assert_eq!(value, AbiValue::int(-1));
    }

    #[test]
    fn test_decode_out_of_range_uint() {
        assert!(AbiDecoder::decode_value(&word(256), &AbiType::uint(8), 0).is_err());
    }

    #[test]
    fn test_decode_bool_strict() {
        assert_eq!(
            AbiDecoder::decode_value(&word(1), &AbiType::Bool, 0).unwrap().0,
            AbiValue::Bool(true)
        );
        assert!(AbiDecoder::decode_value(&word(2), &AbiType::Bool, 0).is_err());
    }

    #[test]
    fn test_decode_address_dirty_padding() {
        let mut data = word(0);
        data[0] = 1;
        assert!(AbiDecoder::decode_value(&data, &AbiType::Address, 0).is_err());
    }

    #[test]
    fn test_decode_string() {
        let mut data = word(32);
        data.extend(word(5));
        let mut content = b"hello".to_vec();
        content.resize(32, 0);
        data.extend(content);

        let values = AbiDecoder::decode(&data, &[AbiType::String]).unwrap();
        assert_eq!(values, vec![AbiValue::string("hello")]);
    }

    #[test]
    fn test_decode_truncated() {
        assert!(AbiDecoder::decode(&[0u8; 31], &[AbiType::UINT256]).is_err());

        // Length claims more content than present
        let mut data = word(32);
        data.extend(word(100));
        let err = AbiDecoder::decode(&data, &[AbiType::Bytes]).unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn test_decode_offset_out_of_range() {
        let data = word(4096);
        assert!(AbiDecoder::decode(&data, &[AbiType::String]).is_err());

        let huge = [0xffu8; 32];
        assert!(AbiDecoder::decode(&huge, &[AbiType::Bytes]).is_err());
    }

    #[test]
    fn test_decode_array_count_too_large() {
        let mut data = word(32);
        data.extend(word(1_000_000));
        assert!(AbiDecoder::decode(&data, &[AbiType::array(AbiType::UINT256)]).is_err());
    }

    /// `string[]` whose `count` offsets all point at one `len`-byte string
    fn aliased_strings(count: usize, len: usize) -> Vec<u8> {
        let mut data = word(32);
        data.extend(word(count as u64));
        for _ in 0..count {
            data.extend(word((count * 32) as u64));
        }
        data.extend(word(len as u64));
        data.extend(vec![b'a'; len.div_ceil(32) * 32]);
        data
    }

    #[test]
    fn test_decode_aliased_offsets_are_bounded() {
        let ty = [AbiType::array(AbiType::String)];

        let single = AbiDecoder::decode(&aliased_strings(1, 4096), &ty).unwrap();
        assert_eq!(single, vec![AbiValue::Array(vec![AbiValue::string("a".repeat(4096))])]);

        let err = AbiDecoder::decode(&aliased_strings(64, 4096), &ty).unwrap_err();
        assert!(matches!(err, AbiError::Decoding(_)));
    }

    #[test]
    fn test_decode_oversized_fixed_array_type() {
        let data = vec![0u8; 64];
        let huge = AbiType::fixed_array(AbiType::UINT256, 1usize << 59);
        assert!(AbiDecoder::decode(&data, &[huge.clone()]).is_err());

        let empty_of_huge = AbiType::fixed_array(huge, 0);
        let err = AbiDecoder::decode(&data, &[empty_of_huge.clone()]).unwrap_err();
        assert!(matches!(err, AbiError::Decoding(_)));
        assert!(AbiDecoder::decode_value(&data, &empty_of_huge, 0).is_err());
    }

    #[test]
    fn test_decode_call_data_checks_selector() {
        let f = FunctionDescriptor::parse_signature("transfer(address,uint256)").unwrap();
        let addr = AbiValue::address_from_str("0x1234567890123456789012345678901234567890").unwrap();
        let mut encoded = f.encode(&[addr.clone(), AbiValue::uint(5)]).unwrap();

        assert_eq!(
            AbiDecoder::decode_call_data(&f, &encoded).unwrap(),
            vec![addr, AbiValue::uint(5)]
        );

        encoded[0] ^= 0xff;
        assert!(AbiDecoder::decode_call_data(&f, &encoded).is_err());
        assert!(AbiDecoder::decode_call_data(&f, &[0xa9]).is_err());
    }

    #[test]
    fn test_decode_fixed_array_of_strings() {
        let ty = AbiType::fixed_array(AbiType::String, 2);
        let value = AbiValue::Array(vec![AbiValue::string("x"), AbiValue::string("")]);
        let encoded = AbiEncoder::encode(&[value.clone()], &[ty.clone()]).unwrap();
        assert_eq!(AbiDecoder::decode(&encoded, &[ty]).unwrap(), vec![value]);
    }
}
