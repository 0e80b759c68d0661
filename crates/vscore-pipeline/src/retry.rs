//! Retry executor with exponential backoff.
//!
//! Every call to either external service goes through [`with_retry`]:
//! - rate limits and transient failures are retried with doubling delays
//! - a Retry-After hint raises the delay floor for that attempt
//! - non-retryable errors are returned immediately
//! - the last error is returned unchanged once attempts run out

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use vscore_genai::GenAiError;
use vscore_intel::IntelError;

use crate::error::PipelineError;
use crate::metrics::record_retry;

// =============================================================================
// Configuration
// =============================================================================

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub initial_delay: Duration,
    /// Upper bound for the computed backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_attempts: std::env::var("VSCORE_RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            initial_delay: Duration::from_millis(
                std::env::var("VSCORE_RETRY_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            max_delay: Duration::from_millis(
                std::env::var("VSCORE_RETRY_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30_000),
            ),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Backoff delay before retry number `retry` (0-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

// =============================================================================
// Error classification
// =============================================================================

/// How a failed call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Transient,
    Permanent,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::RateLimited => "rate_limited",
            ErrorClass::Transient => "transient",
            ErrorClass::Permanent => "permanent",
        }
    }
}

/// Errors the retry executor knows how to classify.
pub trait RetryClassify {
    fn classify(&self) -> ErrorClass;

    /// Minimum wait requested by the remote side, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryClassify for IntelError {
    fn classify(&self) -> ErrorClass {
        match self {
            IntelError::RateLimited(_) => ErrorClass::RateLimited,
            e if e.is_retryable() => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms().map(Duration::from_millis)
    }
}

impl RetryClassify for GenAiError {
    fn classify(&self) -> ErrorClass {
        match self {
            GenAiError::RateLimited(_) => ErrorClass::RateLimited,
            e if e.is_retryable() => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms().map(Duration::from_millis)
    }
}

impl RetryClassify for PipelineError {
    fn classify(&self) -> ErrorClass {
        match self {
            PipelineError::Intel(e) => e.classify(),
            PipelineError::GenAi(e) => e.classify(),
            PipelineError::Io(_) => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            PipelineError::Intel(e) => e.retry_after(),
            PipelineError::GenAi(e) => e.retry_after(),
            _ => None,
        }
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Execute an async operation with retry.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryClassify + Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let class = error.classify();
        if class == ErrorClass::Permanent || attempt >= max_attempts {
            return Err(error);
        }

        let mut delay = config.delay_for_retry(attempt - 1);
        if class == ErrorClass::RateLimited {
            if let Some(after) = error.retry_after() {
                delay = delay.max(after);
            }
        }

        warn!(
            operation = %operation,
            attempt,
            class = class.as_str(),
            delay_ms = delay.as_millis() as u64,
            "Remote call failed, retrying: {}",
            error
        );
        record_retry(operation, class.as_str());

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
