//! Configuration for the reorder engine
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `max_repeat_count`
pub const ENV_MAX_REPEAT_COUNT: &str = "SITETREE_MAX_REPEAT_COUNT";
/// Environment variable overriding `max_conflict_retries`
pub const ENV_MAX_CONFLICT_RETRIES: &str = "SITETREE_MAX_CONFLICT_RETRIES";
/// Environment variable overriding `retry_backoff_base_ms`
pub const ENV_RETRY_BACKOFF_MS: &str = "SITETREE_RETRY_BACKOFF_MS";
/// Environment variable overriding `retry_backoff_max_ms`
pub const ENV_RETRY_BACKOFF_MAX_MS: &str = "SITETREE_RETRY_BACKOFF_MAX_MS";

/// Configuration for sibling reordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Upper bound on single-step moves per node; larger requests are clamped
    pub max_repeat_count: u32,

    /// Retries of one step after a concurrent-update conflict
    pub max_conflict_retries: usize,

    /// First backoff delay; doubles on every retry
    pub retry_backoff_base_ms: u64,

    /// Ceiling for a single backoff delay
    pub retry_backoff_max_ms: u64,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            max_repeat_count: 1000,
            max_conflict_retries: 5,
            retry_backoff_base_ms: 10,
            retry_backoff_max_ms: 500,
        }
    }
}

impl ReorderConfig {
    /// Defaults overridden by `SITETREE_*` environment variables
    ///
    /// Unparseable values are logged and ignored. The result is not
    /// validated; `ReorderService::with_config` does that.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(value) = read_env(ENV_MAX_REPEAT_COUNT) {
            config.max_repeat_count = value;
        }
        if let Some(value) = read_env(ENV_MAX_CONFLICT_RETRIES) {
            config.max_conflict_retries = value;
        }
        if let Some(value) = read_env(ENV_RETRY_BACKOFF_MS) {
            config.retry_backoff_base_ms = value;
        }
        if let Some(value) = read_env(ENV_RETRY_BACKOFF_MAX_MS) {
            config.retry_backoff_max_ms = value;
        }
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_repeat_count == 0 {
            return Err("max_repeat_count must be greater than 0".to_string());
        }

        if self.retry_backoff_base_ms == 0 {
            return Err("retry_backoff_base_ms must be greater than 0".to_string());
        }

        if self.retry_backoff_max_ms < self.retry_backoff_base_ms {
            return Err(format!(
                "retry_backoff_max_ms ({}) cannot be below retry_backoff_base_ms ({})",
                self.retry_backoff_max_ms, self.retry_backoff_base_ms
            ));
        }

        Ok(())
    }

    /// Repeat count actually executed for a requested count
    pub fn effective_repeat(&self, requested: u32) -> u32 {
        requested.min(self.max_repeat_count)
    }

    /// Backoff before retry number `attempt` (0-based): base * 2^attempt, capped
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let factor = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
        let delay = self
            .retry_backoff_base_ms
            .saturating_mul(factor)
            .min(self.retry_backoff_max_ms);
        Duration::from_millis(delay)
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
