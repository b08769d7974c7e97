//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (<config_dir>/reposcribe/) and project (.reposcribe/) level configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{analysis, network, retry, source};
use crate::types::{Result, ScribeError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Retry/backoff settings for every LLM call
    pub retry: RetryConfig,

    /// Repository walking and parsing settings
    pub analysis: AnalysisConfig,

    /// Stage toggles and per-file concurrency
    pub pipeline: PipelineConfig,

    /// Remote source settings
    pub source: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            analysis: AnalysisConfig::default(),
            pipeline: PipelineConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ScribeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ScribeError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ScribeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ScribeError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_secs.saturating_mul(1000) {
            return Err(ScribeError::Config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_secs ({}s)",
                self.retry.base_delay_ms, self.retry.max_delay_secs
            )));
        }

        if self.analysis.max_file_size == 0 {
            return Err(ScribeError::Config(
                "analysis.max_file_size must be greater than 0".to_string(),
            ));
        }

        if self.analysis.parse_concurrency == 0 || self.pipeline.concurrency == 0 {
            return Err(ScribeError::Config(
                "concurrency settings must be at least 1".to_string(),
            ));
        }

        for pattern in &self.analysis.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                ScribeError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }

        if self.source.timeout_secs == 0 {
            return Err(ScribeError::Config(
                "source.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (`openai` or `offline`)
    pub provider: String,

    /// Model name
    pub model: String,

    /// OpenAI-compatible endpoint base; `None` uses api.openai.com
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for LLM generation
    pub temperature: f32,

    /// Completion token cap
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.2,
            max_tokens: Some(4096),
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, first try included
    pub max_attempts: u32,

    /// Initial backoff in milliseconds
    pub base_delay_ms: u64,

    /// Backoff ceiling in seconds
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_delay_secs: retry::MAX_DELAY_SECS,
        }
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Extra glob patterns to exclude, matched against paths and file names
    pub exclude: Vec<String>,

    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Honor .gitignore files while walking a directory
    pub respect_gitignore: bool,

    /// Files extracted in parallel during the parse stage
    pub parse_concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            max_file_size: analysis::MAX_FILE_SIZE,
            respect_gitignore: false,
            parse_concurrency: 1,
        }
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Files summarized/analyzed at once (1 = sequential)
    pub concurrency: usize,

    pub summaries: bool,
    pub readme: bool,
    pub visualize: bool,

    /// Detailed per-file analysis is expensive and off by default
    pub analyze: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            summaries: true,
            readme: true,
            visualize: true,
            analyze: false,
        }
    }
}

// =============================================================================
// Source Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// GitHub REST API base (override for GitHub Enterprise)
    pub github_api_base: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            github_api_base: source::GITHUB_API_BASE.to_string(),
            timeout_secs: network::SOURCE_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.pipeline.analyze);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(matches!(config.validate(), Err(ScribeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.pipeline.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let mut config = Config::default();
        config.analysis.exclude = vec!["[unclosed".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let mut config = Config::default();
        config.retry.base_delay_ms = 120_000;
        config.retry.max_delay_secs = 60;
        assert!(config.validate().is_err());
    }
}
