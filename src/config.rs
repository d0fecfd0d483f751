//! Core Configuration
//!
//! Key-derivation settings for new keystores and defaults applied to new
//! transactions. Loadable from JSON; every section falls back to its
//! standard preset when omitted.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::tx::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE_WEI, MAX_GAS_LIMIT};

/// PBKDF2 iteration count of the standard Keystore V3 format
pub const STANDARD_PBKDF2_ITERATIONS: u32 = 262_144;

/// Derived key length; split into a 16-byte cipher key and a 16-byte MAC key
pub const KEYSTORE_DKLEN: u32 = 32;

/// PBKDF2 parameters used when creating keystores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfSettings {
    pub iterations: u32,
    pub dklen: u32,
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl KdfSettings {
    /// Standard Keystore V3 preset
    pub fn standard() -> Self {
        Self {
            iterations: STANDARD_PBKDF2_ITERATIONS,
            dklen: KEYSTORE_DKLEN,
        }
    }

    /// Low-cost preset for tests and throwaway wallets
    pub fn light() -> Self {
        Self {
            iterations: 1_024,
            dklen: KEYSTORE_DKLEN,
        }
    }

    /// Reject settings the keystore format cannot carry
    pub fn validate(&self) -> CoreResult<()> {
        if self.iterations == 0 {
            return Err(CoreError::invalid_input("KDF iterations must be positive"));
        }
        if self.dklen != KEYSTORE_DKLEN {
            return Err(CoreError::invalid_input(format!(
                "KDF dklen must be {}, got {}",
                KEYSTORE_DKLEN, self.dklen
            )));
        }
        Ok(())
    }
}

/// Defaults applied by `Transaction::new`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxDefaults {
    pub gas_price_wei: u64,
    pub gas_limit: u64,
    pub chain_id: Option<u64>,
}

impl Default for TxDefaults {
    fn default() -> Self {
        Self {
            gas_price_wei: DEFAULT_GAS_PRICE_WEI,
            gas_limit: DEFAULT_GAS_LIMIT,
            chain_id: None,
        }
    }
}

impl TxDefaults {
    pub fn validate(&self) -> CoreResult<()> {
        if self.gas_limit > MAX_GAS_LIMIT {
            return Err(CoreError::invalid_input(format!(
                "default gas limit {} exceeds maximum {}",
                self.gas_limit, MAX_GAS_LIMIT
            )));
        }
        if self.chain_id == Some(0) {
            return Err(CoreError::invalid_input("chain id must be non-zero"));
        }
        Ok(())
    }
}

/// Crate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub kdf: KdfSettings,
    pub tx: TxDefaults,
}

impl CoreConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: CoreConfig = serde_json::from_str(json)
            .map_err(|e| CoreError::parse_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::internal(format!("Config serialization failed: {}", e)))
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.kdf.validate()?;
        self.tx.validate()
    }
}
