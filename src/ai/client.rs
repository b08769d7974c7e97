//! Retrying, time-bounded LLM client used by the pipeline stages.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use super::provider::{LlmProvider, SharedProvider, TokenUsage};
use super::retry::RetryPolicy;
use super::timeout::with_timeout;
use crate::types::Result;

/// Running totals across every call made through one client
#[derive(Debug, Default)]
struct UsageCounters {
    calls: AtomicU64,
    backoffs: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

/// Snapshot of [`LlmClient`] usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub calls: u64,
    pub backoffs: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Provider plus the retry policy and per-call timeout applied to it
#[derive(Clone)]
pub struct LlmClient {
    provider: SharedProvider,
    policy: RetryPolicy,
    timeout: Duration,
    usage: Arc<UsageCounters>,
}

impl LlmClient {
    pub fn new(provider: SharedProvider, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            provider,
            policy,
            timeout,
            usage: Arc::new(UsageCounters::default()),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Complete a prompt, retrying per policy. Each attempt is bounded by the
    /// client timeout. Returns the raw (uncleaned) response text.
    pub async fn complete(&self, operation: &str, prompt: &str, system_role: &str) -> Result<String> {
        let provider: &dyn LlmProvider = self.provider.as_ref();
        let timeout = self.timeout;

        let (response, stats) = self
            .policy
            .run(operation, move || {
                with_timeout(timeout, provider.complete(prompt, system_role), operation)
            })
            .await?;

        self.record(&response.usage, stats.attempts, stats.backoffs);
        debug!(
            operation,
            attempts = stats.attempts,
            total_ms = response.timing.total_ms,
            "LLM call complete"
        );
        Ok(response.content)
    }

    fn record(&self, usage: &TokenUsage, attempts: u32, backoffs: u32) {
        self.usage
            .calls
            .fetch_add(u64::from(attempts), Ordering::Relaxed);
        self.usage
            .backoffs
            .fetch_add(u64::from(backoffs), Ordering::Relaxed);
        self.usage
            .input_tokens
            .fetch_add(u64::from(usage.input_tokens), Ordering::Relaxed);
        self.usage
            .output_tokens
            .fetch_add(u64::from(usage.output_tokens), Ordering::Relaxed);
    }

    /// Totals recorded for calls that eventually succeeded
    pub fn usage(&self) -> UsageSummary {
        UsageSummary {
            calls: self.usage.calls.load(Ordering::Relaxed),
            backoffs: self.usage.backoffs.load(Ordering::Relaxed),
            input_tokens: self.usage.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.usage.output_tokens.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmResponse, OfflineProvider};
    use crate::types::ScribeError;
    use async_trait::async_trait;

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<LlmResponse> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(LlmResponse::content_only("late"))
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow-model"
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            factor: 2.0,
        }
    }

    #[tokio::test]
    async fn test_complete_with_offline_provider() {
        let client = LlmClient::new(
            Arc::new(OfflineProvider::new()),
            fast_policy(2),
            Duration::from_secs(1),
        );
        let text = client
            .complete("summary", "Explain main.py", "You are helpful")
            .await
            .unwrap();
        assert_eq!(text, "[you] Explain main.py");
        assert_eq!(client.usage().calls, 1);
        assert!(client.usage().input_tokens > 0);
    }

    #[tokio::test]
    async fn test_timeout_is_retried_then_exhausted() {
        let client = LlmClient::new(
            Arc::new(SlowProvider),
            fast_policy(2),
            Duration::from_millis(10),
        );
        let err = client.complete("readme", "p", "s").await.unwrap_err();
        assert!(matches!(err, ScribeError::Llm(ref e) if e.message.contains("after 2 attempts")));
    }
}
