//! Receipt Tracker
//!
//! Polls `eth_getTransactionReceipt` until the transaction is mined,
//! the attempt budget runs out, or the caller cancels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::abi::U256;
use crate::rpc::{Transport, TransportError};
use crate::{log_debug, log_info, log_warn};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of polls before giving up
pub const DEFAULT_POLL_ATTEMPTS: u32 = 60;

/// Longest sleep between cancellation checks while waiting out an interval
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Receipt polling errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No receipt after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Polling cancelled")]
    Cancelled,
}

/// Execution outcome reported in the receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    /// Execution reverted
    Failed,
    /// Pre-Byzantium receipt without a status field
    Unknown,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
    pub block_hash: Option<String>,
    pub gas_used: Option<U256>,
    /// Set for contract creations
    pub contract_address: Option<String>,
    /// Receipt exactly as returned by the node
    pub raw: Value,
}

impl TxReceipt {
    /// Interpret an `eth_getTransactionReceipt` result object
    pub fn from_json(value: Value) -> Result<Self, TransportError> {
        let obj = value
            .as_object()
            .ok_or_else(|| TransportError::InvalidResponse(format!("expected receipt object, got {}", value)))?;

        let string = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        let quantity = |key: &str| -> Result<Option<U256>, TransportError> {
            string(key)
                .map(|s| {
                    U256::from_hex(s.trim_start_matches("0x"))
                        .map_err(|e| TransportError::InvalidResponse(format!("invalid {}: {}", key, e)))
                })
                .transpose()
        };

        let status = match string("status").as_deref() {
            Some("0x1") => ReceiptStatus::Success,
            Some("0x0") => ReceiptStatus::Failed,
            _ => ReceiptStatus::Unknown,
        };
        let block_number = quantity("blockNumber")?
            .map(|n| {
                n.to_u64().ok_or_else(|| {
                    TransportError::InvalidResponse(format!("blockNumber {} exceeds u64", n))
                })
            })
            .transpose()?;

        Ok(Self {
            transaction_hash: string("transactionHash").unwrap_or_default(),
            status,
            block_number,
            block_hash: string("blockHash"),
            gas_used: quantity("gasUsed")?,
            contract_address: string("contractAddress"),
            raw: value,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fixed-interval receipt poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPoller {
    interval: Duration,
    max_attempts: u32,
}

impl Default for ReceiptPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_ATTEMPTS)
    }
}

impl ReceiptPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Block until the receipt is available.
    ///
    /// The token is checked before every attempt and while sleeping between
    /// attempts. Transport errors end polling immediately; only a `null`
    /// result (not yet mined) is retried.
    pub fn poll<T: Transport + ?Sized>(
        &self,
        transport: &T,
        tx_hash: &str,
        cancel: &CancellationToken,
    ) -> Result<TxReceipt, PollError> {
        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                log_warn!("tracker", "receipt polling cancelled", tx_hash = tx_hash, attempt = attempt);
                return Err(PollError::Cancelled);
            }

            let result = transport.request("eth_getTransactionReceipt", vec![json!(tx_hash)])?;
            if !result.is_null() {
                let receipt = TxReceipt::from_json(result)?;
                log_info!(
                    "tracker",
                    "receipt found",
                    tx_hash = tx_hash,
                    attempt = attempt,
                    status = format!("{:?}", receipt.status)
                );
                return Ok(receipt);
            }

            log_debug!("tracker", "receipt pending", tx_hash = tx_hash, attempt = attempt);
            if attempt < self.max_attempts && !sleep_unless_cancelled(self.interval, cancel) {
                log_warn!("tracker", "receipt polling cancelled", tx_hash = tx_hash, attempt = attempt);
                return Err(PollError::Cancelled);
            }
        }

        Err(PollError::Timeout { attempts: self.max_attempts })
    }
}

/// Sleep for `duration` in short slices. Returns `false` as soon as the
/// token is cancelled.
fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    let deadline = Instant::now().checked_add(duration);
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => CANCEL_CHECK_INTERVAL,
        };
        if remaining.is_zero() {
            return true;
        }
        std::thread::sleep(remaining.min(CANCEL_CHECK_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::MockTransport;

    const HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

    fn fast() -> ReceiptPoller {
        ReceiptPoller::new(Duration::from_millis(1), 3)
    }

    fn receipt_json() -> Value {
        json!({
            "transactionHash": HASH,
            "blockNumber": "0x5daf3b",
            "blockHash": "0x1d59ff54b1eb26b013ce3cb5fc9dab3705b415a67127a003c3e61eb445bb8df2",
            "gasUsed": "0x5208",
            "status": "0x1",
            "contractAddress": null
        })
    }

    #[test]
    fn test_receipt_after_pending() {
        let transport = MockTransport::with_replies(vec![Ok(Value::Null), Ok(receipt_json())]);
        let receipt = fast().poll(&transport, HASH, &CancellationToken::new()).unwrap();

        assert!(receipt.is_success());
        assert_eq!(receipt.transaction_hash, HASH);
        assert_eq!(receipt.block_number, Some(0x5daf3b));
        assert_eq!(receipt.gas_used, Some(U256::from(21_000u64)));
        assert_eq!(receipt.contract_address, None);
        assert_eq!(transport.request_count(), 2);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].0, "eth_getTransactionReceipt");
        assert_eq!(requests[0].1, vec![json!(HASH)]);
    }

    #[test]
    fn test_failed_status() {
        let mut receipt = receipt_json();
        receipt["status"] = json!("0x0");
        let parsed = TxReceipt::from_json(receipt).unwrap();
        assert_eq!(parsed.status, ReceiptStatus::Failed);
        assert!(!parsed.is_success());
    }

    #[test]
    fn test_oversized_block_number_is_rejected() {
        let mut receipt = receipt_json();
        receipt["blockNumber"] = json!("0x10000000000000000");
        assert!(matches!(
            TxReceipt::from_json(receipt.clone()),
            Err(TransportError::InvalidResponse(_))
        ));

        receipt["blockNumber"] = json!("0xffffffffffffffff");
        assert_eq!(TxReceipt::from_json(receipt).unwrap().block_number, Some(u64::MAX));

        let transport = MockTransport::with_replies(vec![Ok(json!({
            "transactionHash": HASH,
            "blockNumber": "0x10000000000000000",
            "status": "0x1"
        }))]);
        let err = fast().poll(&transport, HASH, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PollError::Transport(TransportError::InvalidResponse(_))));
    }

    #[test]
    fn test_timeout_after_max_attempts() {
        let transport =
            MockTransport::with_replies(vec![Ok(Value::Null), Ok(Value::Null), Ok(Value::Null)]);
        let err = fast().poll(&transport, HASH, &CancellationToken::new()).unwrap_err();
        assert_eq!(err, PollError::Timeout { attempts: 3 });
        assert_eq!(transport.request_count(), 3);
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let transport = MockTransport::with_replies(vec![Ok(receipt_json())]);
        let token = CancellationToken::new();
        token.clone().cancel();

        assert_eq!(fast().poll(&transport, HASH, &token).unwrap_err(), PollError::Cancelled);
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_cancel_interrupts_interval_sleep() {
        let transport =
            MockTransport::with_replies(vec![Ok(Value::Null), Ok(Value::Null), Ok(receipt_json())]);
        let poller = ReceiptPoller::new(Duration::from_secs(10), 3);
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                token.cancel();
            })
        };

        let started = Instant::now();
        let err = poller.poll(&transport, HASH, &token).unwrap_err();
        canceller.join().unwrap();

        assert_eq!(err, PollError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_transport_error_is_not_retried() {
        let transport = MockTransport::with_replies(vec![
            Err(TransportError::Connectivity("connection refused".to_string())),
            Ok(receipt_json()),
        ]);
        let err = fast().poll(&transport, HASH, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PollError::Transport(TransportError::Connectivity(_))));
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_malformed_receipt() {
        let transport = MockTransport::with_replies(vec![Ok(json!("mined"))]);
        let err = fast().poll(&transport, HASH, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PollError::Transport(TransportError::InvalidResponse(_))));
    }
}
