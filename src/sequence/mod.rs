//! Sequence code allocation
//!
//! [`SequenceAllocator`] mints the human-readable codes stamped on invoices
//! and payments. The atomic read-increment-write lives in the storage layer;
//! this service owns the policy around it: which sequence names exist, how
//! their codes are formatted, and how transient storage failures are retried.

use crate::config::LedgerConfig;
use crate::core::{LedgerError, LedgerResult, StorageError, ValidationError};
use crate::storage::LedgerStorage;
use std::sync::Arc;
use std::time::Duration;

/// Issues strictly increasing, globally unique codes per named sequence.
///
/// No other component touches counter state. Concurrent callers for the same
/// key each get a distinct code; the embedded sequence numbers are
/// consecutive in issuance order.
pub struct SequenceAllocator {
    storage: Arc<dyn LedgerStorage>,
    config: Arc<LedgerConfig>,
}

impl SequenceAllocator {
    pub fn new(storage: Arc<dyn LedgerStorage>, config: Arc<LedgerConfig>) -> Self {
        Self { storage, config }
    }

    /// Mint the next code for `key`.
    ///
    /// The key must be declared in the configuration. Transient storage
    /// failures are retried up to the configured bound with a fixed backoff;
    /// exhaustion surfaces the last `StorageUnavailable`. A failed attempt
    /// never skips or burns a sequence value.
    pub async fn allocate(&self, key: &str) -> LedgerResult<String> {
        let spec = self.config.sequences.get(key).ok_or_else(|| {
            LedgerError::from(ValidationError::unknown_value("sequence", key))
        })?;

        let mut attempt = 0;
        loop {
            match self
                .storage
                .allocate_seq(key, &spec.prefix, spec.pad)
                .await
            {
                Ok(counter) => {
                    let code = counter.code();
                    tracing::debug!(key, seq = counter.seq, %code, "sequence allocated");
                    return Ok(code);
                }
                Err(StorageError::Unavailable { reason })
                    if attempt + 1 < self.config.retry.max_attempts =>
                {
                    attempt += 1;
                    tracing::warn!(key, attempt, %reason, "sequence allocation retry");
                    tokio::time::sleep(Duration::from_millis(self.config.retry.backoff_ms)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
