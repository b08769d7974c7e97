//! Retry with exponential backoff
//!
//! Every LLM call goes through [`RetryPolicy::run`]. Failures are classified with
//! [`ErrorClassifier`]; only retryable categories (rate limit, network, transient,
//! parse) are tried again. Delays double after each failure up to `max_delay`,
//! plus up to a quarter of the current delay as random jitter. A provider-supplied
//! retry-after hint replaces the computed delay, capped at `max_delay`.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use rand::Rng;
use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::constants::retry as retry_constants;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, ScribeError};

static RE_RETRY_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:try again in|retry[- ]after|wait)[:\s]+(\d+(?:\.\d+)?)\s*(ms|milliseconds?|minutes?|mins?|s|secs?|seconds?)?\b",
    )
    .expect("static regex")
});

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Backoff multiplier
    pub factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry_constants::MAX_DELAY_SECS),
            factor: retry_constants::BACKOFF_FACTOR,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_secs(config.max_delay_secs),
            factor: retry_constants::BACKOFF_FACTOR,
        }
    }
}

/// What one [`RetryPolicy::run`] call cost
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryStats {
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Sleeps taken between attempts
    pub backoffs: u32,
    pub total_delay: Duration,
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails with a non-retryable error, or attempts
    /// run out.
    ///
    /// Non-retryable errors propagate unchanged. Exhaustion surfaces as
    /// [`ScribeError::Llm`] carrying the last failure's category.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<(T, RetryStats)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut stats = RetryStats::default();
        let mut current_delay = self.base_delay;

        loop {
            stats.attempts += 1;

            let err = match op().await {
                Ok(value) => {
                    if stats.attempts > 1 {
                        debug!(operation, attempts = stats.attempts, "Succeeded after retry");
                    }
                    return Ok((value, stats));
                }
                Err(err) => err,
            };

            if matches!(err, ScribeError::Cancelled) {
                return Err(err);
            }

            let classified = ErrorClassifier::classify_error(&err, "");
            if !classified.is_retryable() {
                debug!(operation, category = %classified.category, "Non-retryable failure");
                return Err(err);
            }

            if stats.attempts >= self.max_attempts {
                warn!(
                    operation,
                    attempts = stats.attempts,
                    category = %classified.category,
                    "Retries exhausted"
                );
                return Err(ScribeError::Llm(LlmError {
                    message: format!(
                        "{} failed after {} attempts: {}",
                        operation, stats.attempts, classified.message
                    ),
                    ..classified
                }));
            }

            let delay = self.delay_for(&classified, current_delay);
            warn!(
                operation,
                attempt = stats.attempts,
                max_attempts = self.max_attempts,
                category = %classified.category,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "LLM call failed, backing off"
            );
            sleep(delay).await;
            stats.backoffs += 1;
            stats.total_delay += delay;
            current_delay = calculate_backoff(current_delay, self.factor, self.max_delay);
        }
    }

    fn delay_for(&self, classified: &LlmError, current: Duration) -> Duration {
        let hinted = classified.retry_after.or_else(|| {
            (classified.category == ErrorCategory::RateLimit)
                .then(|| parse_rate_limit_delay(&classified.message))
                .flatten()
        });
        match hinted {
            Some(wait) => wait.min(self.max_delay),
            None => (current + random_jitter(current)).min(self.max_delay),
        }
    }
}

/// Parse "try again in 2s" / "retry after 20 seconds" / "wait 3s" hints out of an
/// error message. The number must directly follow the phrase.
fn parse_rate_limit_delay(message: &str) -> Option<Duration> {
    let caps = RE_RETRY_HINT.captures(message)?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str().to_lowercase());
    let secs = match unit.as_deref() {
        Some(u) if u.starts_with("ms") || u.starts_with("milli") => amount / 1000.0,
        Some(u) if u.starts_with("min") => amount * 60.0,
        _ => amount,
    };
    Some(Duration::from_secs_f64(secs.min(300.0)))
}

/// Random jitter in `[0, delay / 4)`
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}

/// Calculate exponential backoff with cap
fn calculate_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    let next = Duration::from_secs_f32(current.as_secs_f32() * factor);
    std::cmp::min(next, max)
}
