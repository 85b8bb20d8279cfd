// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Retry strategy abstraction for document store operations.
//!
//! Role resolution and other store-facing paths retry transient failures a
//! bounded number of times. Strategies are pluggable via the
//! [`RetryStrategy`] trait.
//!
//! # Built-in Strategies
//!
//! - [`NoRetry`]: No retries, fail immediately
//! - [`LinearBackoff`]: Linearly increasing delays (1×, 2×, 3× the base)

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// =============================================================================
// Retry Configuration
// =============================================================================

/// Configuration for retry strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (0 behaves like 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay used to derive per-attempt delays.
    #[serde(default = "default_base_delay")]
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,

    /// Upper bound on any single delay.
    #[serde(default = "default_max_delay")]
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,

    /// Multiplier applied to the base delay per elapsed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_multiplier() -> f64 {
    1.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

// Duration serialization helper
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// =============================================================================
// Retry Decision
// =============================================================================

/// Decision on whether to retry an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// Do not retry, return the error.
    DoNotRetry,
}

// =============================================================================
// Retry Strategy Trait
// =============================================================================

/// A strategy for determining when and how to retry failed store operations.
#[async_trait]
pub trait RetryStrategy: Send + Sync {
    /// Returns the name of this strategy for logging.
    fn name(&self) -> &str;

    /// Determines whether to retry after a failure.
    ///
    /// `attempt` is the number of the attempt that just failed (1-based).
    fn should_retry(&self, error: &StoreError, attempt: u32) -> RetryDecision;

    /// Executes an async operation with retry logic, returning the result of
    /// the operation or the last error once retries are exhausted.
    async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => match self.should_retry(&error, attempt) {
                    RetryDecision::Retry(delay) => {
                        tracing::debug!(
                            strategy = %self.name(),
                            attempt = attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Retrying store operation"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry => {
                        return Err(error);
                    }
                },
            }
        }
    }
}

// =============================================================================
// No Retry Strategy
// =============================================================================

/// A strategy that never retries - fail immediately on error.
#[derive(Debug, Clone, Default)]
pub struct NoRetry;

impl NoRetry {
    /// Creates a new no-retry strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RetryStrategy for NoRetry {
    fn name(&self) -> &str {
        "no_retry"
    }

    fn should_retry(&self, _error: &StoreError, _attempt: u32) -> RetryDecision {
        RetryDecision::DoNotRetry
    }
}

// =============================================================================
// Linear Backoff Strategy
// =============================================================================

/// A strategy with linearly increasing delays.
///
/// Delay formula: `min(base_delay + (attempt-1) * base_delay * multiplier, max_delay)`.
/// With the default multiplier of 1.0 this yields the 1×, 2×, 3× schedule.
#[derive(Debug, Clone, Default)]
pub struct LinearBackoff {
    config: RetryConfig,
}

impl LinearBackoff {
    /// Creates a new linear backoff strategy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Creates a simple linear backoff strategy.
    pub fn simple(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            config: RetryConfig {
                max_attempts,
                base_delay,
                ..Default::default()
            },
        }
    }

    /// Calculates the delay applied after a given failed attempt.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_millis = self.config.base_delay.as_millis() as f64;
        let increment = base_millis * self.config.multiplier * (attempt.saturating_sub(1) as f64);
        let total = (base_millis + increment).min(self.config.max_delay.as_millis() as f64);

        Duration::from_millis(total as u64)
    }
}

#[async_trait]
impl RetryStrategy for LinearBackoff {
    fn name(&self) -> &str {
        "linear_backoff"
    }

    fn should_retry(&self, error: &StoreError, attempt: u32) -> RetryDecision {
        if attempt >= self.config.max_attempts {
            return RetryDecision::DoNotRetry;
        }

        if !error.is_retryable() {
            return RetryDecision::DoNotRetry;
        }

        RetryDecision::Retry(self.calculate_delay(attempt))
    }
}

// =============================================================================
// Tests
// =============================================================================
