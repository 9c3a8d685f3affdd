//! Cart store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CartError;

/// Default storage namespace.
pub const DEFAULT_NAMESPACE: &str = "@GoMarketplace";

/// Configuration for a [`CartStore`](crate::CartStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Prefix of the storage key; the snapshot lives at `<namespace>:cart`.
    pub namespace: String,
    /// What to do when the persisted snapshot does not parse.
    pub on_corrupt: CorruptSnapshotPolicy,
    /// Retry policy for snapshot writes.
    pub retry: RetryPolicy,
}

impl CartConfig {
    /// The fixed key the cart snapshot is stored under.
    pub fn storage_key(&self) -> String {
        market_kv::cache_key!(self.namespace.as_str(), "cart")
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the corrupt snapshot policy.
    pub fn with_on_corrupt(mut self, policy: CorruptSnapshotPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    /// Set the write retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check the configuration before a store is built from it.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.namespace.trim().is_empty() {
            return Err(CartError::InvalidConfig(
                "namespace must not be empty".to_string(),
            ));
        }
        if let BackoffStrategy::Exponential { base_ms, max_ms } = self.retry.backoff {
            if base_ms > max_ms {
                return Err(CartError::InvalidConfig(format!(
                    "retry backoff base ({}ms) exceeds max ({}ms)",
                    base_ms, max_ms
                )));
            }
        }
        Ok(())
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            on_corrupt: CorruptSnapshotPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Handling of a persisted snapshot that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptSnapshotPolicy {
    /// Refuse to start: loading returns `CartError::CorruptSnapshot`.
    #[default]
    Fail,
    /// Start with an empty cart; the bad snapshot is overwritten on the
    /// next mutation.
    Reset,
}

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Fixed delay between retries.
    Fixed { delay_ms: u64 },
    /// Exponential backoff with base and max.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential { base_ms, max_ms } => {
                let multiplier = 2u64.saturating_pow(attempt);
                Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base_ms: 50,
            max_ms: 500,
        }
    }
}

/// Retry policy for snapshot writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a new retry policy with the default backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::default(),
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::None,
        }
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Check if a failed attempt (0-indexed) should be retried.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
