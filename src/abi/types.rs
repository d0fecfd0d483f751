//! ABI type definitions for Solidity/EVM contracts

use std::fmt;
use std::str::FromStr;

/// ABI word size in bytes
pub const WORD_SIZE: usize = 32;

/// All supported Solidity types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    // Boolean
    Bool,

    // Signed or unsigned integer, 8..=256 bits in steps of 8
    Int { signed: bool, bits: u16 },

    // Address (20 bytes, left-padded to a word)
    Address,

    // Fixed-size bytes (bytes1 through bytes32, right-padded to a word)
    FixedBytes(usize),

    // Dynamic bytes
    Bytes,

    // Dynamic UTF-8 string
    String,

    // Fixed-size array T[N]
    FixedArray(Box<AbiType>, usize),

    // Dynamic array T[]
    Array(Box<AbiType>),
}

impl AbiType {
    pub const UINT256: AbiType = AbiType::Int { signed: false, bits: 256 };
    pub const INT256: AbiType = AbiType::Int { signed: true, bits: 256 };

    /// Unsigned integer of the given width
    pub fn uint(bits: u16) -> Self {
        AbiType::Int { signed: false, bits }
    }

    /// Signed integer of the given width
    pub fn int(bits: u16) -> Self {
        AbiType::Int { signed: true, bits }
    }

    /// Dynamic array of `inner`
    pub fn array(inner: AbiType) -> Self {
        AbiType::Array(Box::new(inner))
    }

    /// Fixed-size array of `len` elements of `inner`
    pub fn fixed_array(inner: AbiType, len: usize) -> Self {
        AbiType::FixedArray(Box::new(inner), len)
    }

    /// Check if the type is dynamic (requires offset encoding)
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            _ => false,
        }
    }

    /// Size in bytes this type occupies in a head section.
    ///
    /// Dynamic types occupy a single offset word; static arrays occupy
    /// their full flattened size.
    ///
    /// Saturates at `usize::MAX` for fixed arrays too large to address; see
    /// `checked_head_size`.
    pub fn head_size(&self) -> usize {
        self.checked_head_size().unwrap_or(usize::MAX)
    }

    /// Head size, or `None` when a static array's flattened size overflows
    pub fn checked_head_size(&self) -> Option<usize> {
        match self {
            AbiType::FixedArray(inner, len) if !self.is_dynamic() => {
                inner.checked_head_size()?.checked_mul(*len)
            }
            _ => Some(WORD_SIZE),
        }
    }

    /// Parse type from its string representation
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();

        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(AbiType::array(Self::parse(inner)?));
        }

        // Fixed array T[N]; the last bracket pair is the outermost dimension
        if s.ends_with(']') {
            let idx = s
                .rfind('[')
                .ok_or_else(|| AbiError::InvalidType(format!("Unbalanced brackets: {}", s)))?;
            let size_str = &s[idx + 1..s.len() - 1];
            let size: usize = size_str
                .parse()
                .map_err(|_| AbiError::InvalidType(format!("Invalid array size: {}", size_str)))?;
            let array = AbiType::fixed_array(Self::parse(&s[..idx])?, size);
            if array.checked_head_size().is_none() {
                return Err(AbiError::InvalidType(format!("Fixed array too large: {}", s)));
            }
            return Ok(array);
        }

        match s {
            "address" => Ok(AbiType::Address),
            "bool" => Ok(AbiType::Bool),
            "bytes" => Ok(AbiType::Bytes),
            "string" => Ok(AbiType::String),
            "uint" => Ok(AbiType::UINT256),
            "int" => Ok(AbiType::INT256),

            s if s.starts_with("bytes") => {
                let size_str = &s[5..];
                let size: usize = size_str
                    .parse()
                    .map_err(|_| AbiError::InvalidType(format!("Invalid bytes size: {}", size_str)))?;
                if size == 0 || size > 32 {
                    return Err(AbiError::InvalidType(format!("bytes size must be 1-32: {}", size)));
                }
                Ok(AbiType::FixedBytes(size))
            }

            s if s.starts_with("uint") => Self::parse_int(&s[4..], false),
            s if s.starts_with("int") => Self::parse_int(&s[3..], true),

            _ => Err(AbiError::InvalidType(format!("Unknown type: {}", s))),
        }
    }

    fn parse_int(size_str: &str, signed: bool) -> Result<Self, AbiError> {
        let bits: u16 = size_str
            .parse()
            .map_err(|_| AbiError::InvalidType(format!("Invalid integer size: {}", size_str)))?;
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(AbiError::InvalidType(format!("Unsupported integer size: {}", bits)));
        }
        Ok(AbiType::Int { signed, bits })
    }

    /// Get the canonical type string for signature calculation
    pub fn canonical_type(&self) -> String {
        match self {
            AbiType::Bool => "bool".to_string(),
            AbiType::Int { signed: true, bits } => format!("int{}", bits),
            AbiType::Int { signed: false, bits } => format!("uint{}", bits),
            AbiType::Address => "address".to_string(),
            AbiType::FixedBytes(size) => format!("bytes{}", size),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::FixedArray(inner, size) => format!("{}[{}]", inner.canonical_type(), size),
            AbiType::Array(inner) => format!("{}[]", inner.canonical_type()),
        }
    }
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbiType::parse(s)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_type())
    }
}

/// ABI value - runtime representation of Solidity values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Address([u8; 20]),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    // Dynamic or fixed array
    Array(Vec<AbiValue>),
}

impl AbiValue {
    /// Create an unsigned value from a u64
    pub fn uint(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }

    /// Create a signed value from an i64
    pub fn int(value: i64) -> Self {
        AbiValue::Int(I256::from(value))
    }

    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        AbiValue::String(value.into())
    }

    /// Create an unsigned value from a string (decimal or 0x-hex)
    pub fn uint_from_str(s: &str) -> Result<Self, AbiError> {
        Ok(AbiValue::Uint(s.parse()?))
    }

    /// Create an Address value from a hex string
    pub fn address_from_str(s: &str) -> Result<Self, AbiError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(AbiError::InvalidValue("Address must be 20 bytes".to_string()));
        }
        let bytes = hex::decode(s)
            .map_err(|_| AbiError::InvalidValue("Invalid hex in address".to_string()))?;
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(AbiValue::Address(addr))
    }

    /// Create bytes value from hex string
    pub fn bytes_from_hex(s: &str) -> Result<Self, AbiError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| AbiError::InvalidValue("Invalid hex".to_string()))?;
        Ok(AbiValue::Bytes(bytes))
    }

    pub fn as_uint(&self) -> Option<&U256> {
        match self {
            AbiValue::Uint(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&I256> {
        match self {
            AbiValue::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&[u8; 20]> {
        match self {
            AbiValue::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Short description of the value kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
        }
    }
}

/// 256-bit unsigned integer (little-endian u64 limbs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U256(pub [u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0, 0, 0, 0]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);
    pub const MAX: U256 = U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX]);

    /// Create from bytes (big-endian, at most 32 bytes are read from the tail)
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut padded = [0u8; 32];
        let take = bytes.len().min(32);
        padded[32 - take..].copy_from_slice(&bytes[bytes.len() - take..]);

        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let offset = (3 - i) * 8;
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&padded[offset..offset + 8]);
            *limb = u64::from_be_bytes(chunk);
        }
        U256(limbs)
    }

    /// Convert to bytes (big-endian, 32 bytes)
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for i in 0..4 {
            let offset = (3 - i) * 8;
            bytes[offset..offset + 8].copy_from_slice(&self.0[i].to_be_bytes());
        }
        bytes
    }

    /// Big-endian bytes with leading zeros removed (empty for zero)
    pub fn to_be_bytes_trimmed(&self) -> Vec<u8> {
        let bytes = self.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(32);
        bytes[start..].to_vec()
    }

    /// Parse from hex string (without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, AbiError> {
        if s.len() > 64 {
            return Err(AbiError::Overflow);
        }
        let padded = if s.len() % 2 == 1 { format!("0{}", s) } else { s.to_string() };
        let bytes = hex::decode(padded).map_err(|_| AbiError::InvalidValue("Invalid hex".to_string()))?;
        Ok(Self::from_be_bytes(&bytes))
    }

    /// Parse from decimal string
    pub fn from_dec(s: &str) -> Result<Self, AbiError> {
        if s.is_empty() {
            return Err(AbiError::InvalidValue("Empty decimal string".to_string()));
        }
        let mut result = U256::ZERO;
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| AbiError::InvalidValue(format!("Invalid decimal digit: {}", c)))?;
            result = result.checked_mul_u64(10).ok_or(AbiError::Overflow)?;
            result = result.checked_add(U256::from(digit as u64)).ok_or(AbiError::Overflow)?;
        }
        Ok(result)
    }

    /// Checked addition
    pub fn checked_add(&self, other: U256) -> Option<U256> {
        let mut result = [0u64; 4];
        let mut carry = 0u64;

        for i in 0..4 {
            let (sum1, c1) = self.0[i].overflowing_add(other.0[i]);
            let (sum2, c2) = sum1.overflowing_add(carry);
            result[i] = sum2;
            carry = (c1 as u64) + (c2 as u64);
        }

        if carry != 0 {
            None
        } else {
            Some(U256(result))
        }
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: U256) -> Option<U256> {
        let mut result = [0u64; 4];
        let mut borrow = 0u64;

        for i in 0..4 {
            let (diff1, b1) = self.0[i].overflowing_sub(other.0[i]);
            let (diff2, b2) = diff1.overflowing_sub(borrow);
            result[i] = diff2;
            borrow = (b1 as u64) + (b2 as u64);
        }

        if borrow != 0 {
            None
        } else {
            Some(U256(result))
        }
    }

    /// Checked multiplication by u64
    pub fn checked_mul_u64(&self, other: u64) -> Option<U256> {
        let mut result = [0u64; 4];
        let mut carry = 0u128;

        for i in 0..4 {
            let prod = (self.0[i] as u128) * (other as u128) + carry;
            result[i] = prod as u64;
            carry = prod >> 64;
        }

        if carry != 0 {
            None
        } else {
            Some(U256(result))
        }
    }

    /// Divide by a u64, returning quotient and remainder
    fn div_rem_u64(&self, divisor: u64) -> (U256, u64) {
        let mut quotient = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            quotient[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        (U256(quotient), rem as u64)
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    /// Number of significant bits
    pub fn bits(&self) -> u32 {
        for i in (0..4).rev() {
            if self.0[i] != 0 {
                return (i as u32) * 64 + (64 - self.0[i].leading_zeros());
            }
        }
        0
    }

    /// Get as u64 if it fits
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0 {
            Some(self.0[0])
        } else {
            None
        }
    }

    /// Get as usize if it fits
    pub fn to_usize(&self) -> Option<usize> {
        self.to_u64().and_then(|v| usize::try_from(v).ok())
    }

    /// Get as u128 (truncates)
    pub fn as_u128(&self) -> u128 {
        (self.0[1] as u128) << 64 | (self.0[0] as u128)
    }

    /// To hex string (64 chars, no prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// JSON-RPC quantity encoding: 0x-prefixed, no leading zeros
    pub fn to_quantity(&self) -> String {
        let trimmed = self.to_be_bytes_trimmed();
        if trimmed.is_empty() {
            return "0x0".to_string();
        }
        let encoded = hex::encode(trimmed);
        format!("0x{}", encoded.trim_start_matches('0'))
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }
}

impl FromStr for U256 {
    type Err = AbiError;

    /// Accepts decimal or 0x-prefixed hex
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex_part) => U256::from_hex(hex_part),
            None => U256::from_dec(s),
        }
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut digits = Vec::new();
        let mut value = *self;
        while !value.is_zero() {
            let (q, r) = value.div_rem_u64(10);
            digits.push(b'0' + r as u8);
            value = q;
        }
        digits.reverse();
        write!(f, "{}", String::from_utf8_lossy(&digits))
    }
}

/// 256-bit signed integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256(pub U256, pub bool); // (abs value, is_negative)

impl I256 {
    pub const ZERO: I256 = I256(U256::ZERO, false);

    /// Build from magnitude and sign; negative zero normalizes to zero
    pub fn new(magnitude: U256, negative: bool) -> Self {
        I256(magnitude, negative && !magnitude.is_zero())
    }

    pub fn is_negative(&self) -> bool {
        self.1
    }

    pub fn magnitude(&self) -> U256 {
        self.0
    }

    /// Whether the value fits a two's complement integer of `bits` width
    pub fn fits_signed(&self, bits: u16) -> bool {
        let limit = bits as u32 - 1;
        if !self.1 {
            return self.0.bits() <= limit;
        }
        // |v| <= 2^(bits-1)  <=>  |v| - 1 < 2^(bits-1)
        match self.0.checked_sub(U256::ONE) {
            Some(m) => m.bits() <= limit,
            None => true,
        }
    }

    /// Convert to i128 if it fits
    pub fn to_i128(&self) -> Option<i128> {
        if self.0.bits() > 127 {
            if self.1 && self.0 == U256::from(1u128 << 127) {
                return Some(i128::MIN);
            }
            return None;
        }
        let magnitude = self.0.as_u128() as i128;
        Some(if self.1 { -magnitude } else { magnitude })
    }

    /// Convert to bytes (big-endian, two's complement, 32 bytes)
    pub fn to_be_bytes(&self) -> [u8; 32] {
        if !self.1 {
            self.0.to_be_bytes()
        } else {
            let mut bytes = self.0.to_be_bytes();
            for b in &mut bytes {
                *b = !*b;
            }
            let mut carry = 1u8;
            for i in (0..32).rev() {
                let (sum, c) = bytes[i].overflowing_add(carry);
                bytes[i] = sum;
                carry = c as u8;
                if carry == 0 {
                    break;
                }
            }
            bytes
        }
    }

    /// Create from a 32-byte word (big-endian, two's complement)
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return I256::ZERO;
        }

        let is_negative = bytes[0] & 0x80 != 0;
        if !is_negative {
            return I256(U256::from_be_bytes(bytes), false);
        }

        let mut inverted = bytes.to_vec();
        for b in &mut inverted {
            *b = !*b;
        }
        let mut carry = 1u8;
        for i in (0..inverted.len()).rev() {
            let (sum, c) = inverted[i].overflowing_add(carry);
            inverted[i] = sum;
            carry = c as u8;
            if carry == 0 {
                break;
            }
        }
        // -2^255 inverts back onto itself with the carry fully consumed
        I256::new(U256::from_be_bytes(&inverted), true)
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        I256::new(U256::from(value.unsigned_abs()), value < 0)
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        I256::new(U256::from(value.unsigned_abs()), value < 0)
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.1 {
            write!(f, "-{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// ABI errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("ABI encoding error: {0}")]
    Encoding(String),

    #[error("ABI decoding error: {0}")]
    Decoding(String),

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Numeric overflow")]
    Overflow,

    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("No such contract method: {0}")]
    NoSuchContractMethod(String),
}

impl AbiError {
    /// Whether this error was raised while producing wire bytes
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            AbiError::Encoding(_) | AbiError::TypeMismatch { .. } | AbiError::Overflow
        )
    }

    /// Whether this error was raised while reading wire bytes
    pub fn is_decoding(&self) -> bool {
        matches!(self, AbiError::Decoding(_))
    }
}
