//! ABI (Application Binary Interface) module for Solidity/EVM contracts
//!
//! - Solidity types (uint, int, address, bool, bytes, string, arrays)
//! - Function call encoding and result decoding
//! - Event log decoding
//! - JSON ABI parsing into a `ContractIndex`
//! - Function selector calculation

pub mod types;
pub mod function;
pub mod encoder;
pub mod decoder;
pub mod parser;
pub mod selector;

#[cfg(test)]
mod tests;

pub use types::*;
pub use function::*;
pub use encoder::*;
pub use decoder::*;
pub use parser::*;
pub use selector::*;
