//! Timeout handling for outbound calls
//!
//! Every LLM call runs under [`with_timeout`]; remote source fetches rely on the
//! HTTP client's own timeout, configured from the same [`TimeoutConfig`].
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let config = TimeoutConfig::from_config(&app_config);
//! let text = with_timeout(config.llm_request, provider.complete(p, s), "LLM request").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::constants::network as net_constants;
use crate::types::{Result, ScribeError};

/// Per-operation timeouts
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// One LLM completion (default: 5 minutes)
    pub llm_request: Duration,
    /// One remote source request (default: 60 seconds)
    pub source_request: Duration,
    /// TCP connect for any HTTP client (default: 30 seconds)
    pub connection: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_request: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            source_request: Duration::from_secs(net_constants::SOURCE_TIMEOUT_SECS),
            connection: Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn from_config(config: &Config) -> Self {
        let llm_request = Duration::from_secs(config.llm.timeout_secs);
        let source_request = Duration::from_secs(config.source.timeout_secs);
        Self {
            llm_request,
            source_request,
            connection: Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS)
                .min(llm_request)
                .min(source_request),
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns [`ScribeError::Timeout`] if the operation doesn't complete in time.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ScribeError::timeout(operation_name, timeout)),
    }
}
