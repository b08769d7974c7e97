//! AI Integration Layer
//!
//! LLM providers, the retrying client every stage calls through, prompt
//! construction and response cleanup.

pub mod client;
pub mod prompt;
pub mod provider;
pub mod response;
pub mod retry;
pub mod timeout;

pub use client::{LlmClient, UsageSummary};
pub use provider::{
    ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse, OfflineProvider,
    OpenAiProvider, ProviderConfig, ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage,
    create_provider,
};
pub use retry::{RetryPolicy, RetryStats};
pub use timeout::{TimeoutConfig, with_timeout};
