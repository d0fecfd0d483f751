//! Structured Logging with Sensitive Data Redaction
//!
//! Entries are emitted as `tracing` events. Field values are redacted by key:
//! - Passphrases, private keys and derived key material: fully redacted
//! - Addresses: partially redacted
//! - Transaction hashes: shortened
//!
//! Installing a subscriber is left to the embedding application.

use std::fmt;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the log entry (auto-redacts sensitive data)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let redacted = redact_if_sensitive(key, &value.to_string());
        self.fields.push((key, redacted));
        self
    }

    /// Add a field with explicit redaction
    pub fn redacted_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let redacted = redact_value(&value.to_string());
        self.fields.push((key, redacted));
        self
    }

    /// Add an address field (partial redaction)
    pub fn address_field(mut self, key: &'static str, address: &str) -> Self {
        self.fields.push((key, redact_address(address)));
        self
    }

    /// Render fields as `k=v k=v`
    pub fn fields_string(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Emit the entry as a tracing event
    pub fn log(self) {
        let fields = self.fields_string();
        let module = self.module;
        let message = self.message.as_str();

        match self.level {
            LogLevel::Debug => tracing::debug!(module, fields = %fields, "{}", message),
            LogLevel::Info => tracing::info!(module, fields = %fields, "{}", message),
            LogLevel::Warn => tracing::warn!(module, fields = %fields, "{}", message),
            LogLevel::Error => tracing::error!(module, fields = %fields, "{}", message),
        }
    }
}

/// Redact a value if the key suggests it's sensitive
fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    let fully_redacted_keys = [
        "private_key", "privatekey", "secret", "password", "passphrase",
        "derived", "mac_key", "enc_key", "signing_key", "ciphertext",
    ];
    if fully_redacted_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_value(value);
    }

    let address_keys = ["address", "recipient", "sender", "from", "to"];
    if address_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_address(value);
    }

    let hash_keys = ["tx_hash", "hash", "txhash"];
    if hash_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_hash(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
fn redact_value(value: &str) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }

    let len = value.len();
    if len <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", len)
    }
}

/// Partially redact an address (show prefix and last 4 chars)
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    let suffix_len = 4;

    if trimmed.len() <= prefix_len + suffix_len + 3 {
        return redact_value(trimmed);
    }

    abbreviate(trimmed, prefix_len, suffix_len).unwrap_or_else(|| redact_value(trimmed))
}

/// Partially redact a hash (show first 10 and last 6 chars)
fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    if trimmed.len() <= 20 {
        return trimmed.to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    abbreviate(trimmed, prefix_len, 6).unwrap_or_else(|| redact_value(trimmed))
}

/// `prefix...suffix` by byte length; `None` when a cut falls inside a character
fn abbreviate(value: &str, prefix_len: usize, suffix_len: usize) -> Option<String> {
    let prefix = value.get(..prefix_len)?;
    let suffix = value.get(value.len().checked_sub(suffix_len)?..)?;
    Some(format!("{}...{}", prefix, suffix))
}

/// Shared body of the level macros
#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Debug-level entry with auto-redacted fields
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::__log_at!(Debug, $($args)*) };
}

/// Info-level entry with auto-redacted fields
#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::__log_at!(Info, $($args)*) };
}

/// Warn-level entry with auto-redacted fields
#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::__log_at!(Warn, $($args)*) };
}

/// Error-level entry with auto-redacted fields
#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::__log_at!(Error, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_value("secret_key_12345"), "[REDACTED:16chars]");
    }

    #[test]
    fn test_redact_address() {
        let addr = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
        let redacted = redact_address(addr);
        assert!(redacted.starts_with("0xd8dA6B"));
        assert!(redacted.ends_with("6045"));
        assert!(redacted.contains("..."));

        // Short "to" values such as "12" are not worth showing partially
        assert_eq!(redact_address("12"), "[REDACTED]");
    }

    #[test]
    fn test_redact_hash() {
        let hash = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let redacted = redact_hash(hash);
        assert!(redacted.starts_with("0x1234567890"));
        assert!(redacted.ends_with("abcdef"));
    }

    #[test]
    fn test_redact_multibyte_values() {
        let address = format!("0x{}", "\u{20ac}".repeat(5));
        assert_eq!(redact_address(&address), "[REDACTED:17chars]");
        assert_eq!(redact_address(&format!("0x1{}", "\u{e9}".repeat(10))), "[REDACTED:23chars]");

        let hash = format!("0x{}", "\u{20ac}".repeat(10));
        assert_eq!(redact_hash(&hash), "[REDACTED:32chars]");

        // Cuts that land on character boundaries still abbreviate
        let accented = format!("0x{}", "\u{e9}".repeat(10));
        assert_eq!(redact_address(&accented), "0x\u{e9}\u{e9}\u{e9}...\u{e9}\u{e9}");

        let entry = LogEntry::new(LogLevel::Warn, "test", "odd recipient").field("to", &address);
        assert_eq!(entry.fields[0].1, "[REDACTED:17chars]");
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert!(redact_if_sensitive("passphrase", "hunter22").contains("REDACTED"));
        assert!(redact_if_sensitive("derived_key", "00112233").contains("REDACTED"));
        assert!(redact_if_sensitive("address", "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
            .contains("..."));
        assert_eq!(redact_if_sensitive("nonce", "10"), "10");
    }

    #[test]
    fn test_log_entry() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Test message")
            .field("nonce", 7)
            .field("private_key", "secret")
            .address_field("recipient", "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

        let pk = entry.fields.iter().find(|(k, _)| *k == "private_key").unwrap();
        assert!(pk.1.contains("REDACTED"));

        let addr = entry.fields.iter().find(|(k, _)| *k == "recipient").unwrap();
        assert!(addr.1.contains("..."));

        assert!(entry.fields_string().starts_with("nonce=7 "));
    }

    #[test]
    fn test_log_macro_emits_without_subscriber() {
        crate::log_warn!("test", "overloaded name", name = "transfer");
        crate::log_debug!("test", "plain message");
    }
}
