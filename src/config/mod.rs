//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Formatting rule for one named sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSpec {
    /// Code prefix (e.g. "INV")
    pub prefix: String,

    /// Minimum zero-padded width of the numeric part
    pub pad: usize,
}

/// Bounds for retrying transient storage failures and commit contention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts before giving up (first try included)
    #[serde(default = "RetryConfig::default_max_attempts")]
    pub max_attempts: u32,

    /// Sleep between attempts, milliseconds
    #[serde(default = "RetryConfig::default_backoff_ms")]
    pub backoff_ms: u64,
}

impl RetryConfig {
    fn default_max_attempts() -> u32 {
        3
    }

    fn default_backoff_ms() -> u64 {
        25
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            backoff_ms: Self::default_backoff_ms(),
        }
    }
}

/// Complete configuration for the ledger core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Known sequence names with their code formatting rules
    #[serde(default = "default_sequences")]
    pub sequences: HashMap<String, SequenceSpec>,

    /// Retry bounds shared by the allocator and the payment recorder
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_sequences() -> HashMap<String, SequenceSpec> {
    HashMap::from([
        (
            "invoice".to_string(),
            SequenceSpec {
                prefix: "INV".to_string(),
                pad: 3,
            },
        ),
        (
            "payment".to_string(),
            SequenceSpec {
                prefix: "PAY".to_string(),
                pad: 3,
            },
        ),
    ])
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl LedgerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Default configuration: shared "invoice" and "payment" sequences
    pub fn default_config() -> Self {
        Self {
            sequences: default_sequences(),
            retry: RetryConfig::default(),
        }
    }
}
