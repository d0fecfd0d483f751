//! Minimal RLP encoding for legacy transactions

use crate::abi::U256;

/// Encode an integer as a big-endian string without leading zeros
pub fn encode_u64(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(8);
    encode_bytes(&bytes[start..])
}

/// Encode a 256-bit integer as a big-endian string without leading zeros
pub fn encode_u256(value: &U256) -> Vec<u8> {
    encode_bytes(&value.to_be_bytes_trimmed())
}

/// Encode a 32-byte word (signature r/s) as an integer
pub fn encode_word(word: &[u8; 32]) -> Vec<u8> {
    let start = word.iter().position(|&b| b != 0).unwrap_or(32);
    encode_bytes(&word[start..])
}

/// Encode a byte string
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        data.to_vec()
    } else if data.len() < 56 {
        let mut encoded = vec![0x80 + data.len() as u8];
        encoded.extend_from_slice(data);
        encoded
    } else {
        let len_bytes = encode_length(data.len());
        let mut encoded = vec![0xb7 + len_bytes.len() as u8];
        encoded.extend_from_slice(&len_bytes);
        encoded.extend_from_slice(data);
        encoded
    }
}

/// Wrap already-encoded items in a list header
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let content_len: usize = items.iter().map(Vec::len).sum();
    let mut encoded = Vec::with_capacity(content_len + 9);

    if content_len < 56 {
        encoded.push(0xc0 + content_len as u8);
    } else {
        let len_bytes = encode_length(content_len);
        encoded.push(0xf7 + len_bytes.len() as u8);
        encoded.extend_from_slice(&len_bytes);
    }

    for item in items {
        encoded.extend_from_slice(item);
    }
    encoded
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = (len as u64).to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

/// Decode a list whose items are all byte strings
#[cfg(test)]
pub(crate) fn decode_flat_list(data: &[u8]) -> Option<Vec<Vec<u8>>> {
    fn header(data: &[u8], short: u8, long: u8) -> Option<(usize, usize)> {
        let prefix = *data.first()?;
        if prefix < long {
            Some((1, (prefix - short) as usize))
        } else {
            let n = (prefix - long) as usize;
            let len = data.get(1..1 + n)?.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            Some((1 + n, len))
        }
    }

    if *data.first()? < 0xc0 {
        return None;
    }
    let (skip, len) = header(data, 0xc0, 0xf8)?;
    let mut rest = data.get(skip..skip + len)?;
    let mut items = Vec::new();

    while !rest.is_empty() {
        let prefix = rest[0];
        if prefix < 0x80 {
            items.push(vec![prefix]);
            rest = &rest[1..];
        } else if prefix < 0xc0 {
            let (skip, len) = header(rest, 0x80, 0xb8)?;
            items.push(rest.get(skip..skip + len)?.to_vec());
            rest = &rest[skip + len..];
        } else {
            return None;
        }
    }
    Some(items)
}
