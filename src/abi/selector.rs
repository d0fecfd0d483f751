//! Function selector and event topic calculation

use crate::utils::crypto::keccak256;

/// Selector calculator
pub struct AbiSelector;

impl AbiSelector {
    /// Function selector: first 4 bytes of keccak256(signature)
    pub fn selector_from_signature(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Event topic: keccak256(signature)
    pub fn topic_from_signature(signature: &str) -> [u8; 32] {
        keccak256(signature.as_bytes())
    }

    /// Build the canonical signature `name(type1,type2,...)`
    pub fn signature<'a, I>(name: &str, canonical_types: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let types: Vec<&str> = canonical_types.into_iter().collect();
        format!("{}({})", name, types.join(","))
    }

    /// Selector as 0x-prefixed hex
    pub fn selector_hex(signature: &str) -> String {
        format!("0x{}", hex::encode(Self::selector_from_signature(signature)))
    }
}
