//! OpenAI-compatible Chat Completions provider
//!
//! Works against OpenAI itself or any endpoint speaking the same protocol
//! (Groq, Mistral, local gateways) via `llm.api_base`.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming, TokenUsage,
};
use crate::constants::network as net_constants;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, ScribeError};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const PROVIDER_NAME: &str = "openai";

/// Environment variables consulted for the API key, in order
const API_KEY_VARS: &[&str] = &["OPENAI_API_KEY", "LLM_API_KEY"];

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| API_KEY_VARS.iter().find_map(|var| std::env::var(var).ok()))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ScribeError::Config(
                    "API key not found. Set OPENAI_API_KEY (or LLM_API_KEY), or use --provider offline"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(
                net_constants::CONNECTION_TIMEOUT_SECS.min(config.timeout_secs),
            ))
            .build()
            .map_err(|e| ScribeError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &str, system_role: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_role.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn transport_error(err: reqwest::Error) -> ScribeError {
        let message = format!("OpenAI request failed: {}", err);
        let classified = if err.is_timeout() || err.is_connect() {
            LlmError::with_provider(ErrorCategory::Network, message, PROVIDER_NAME)
        } else if err.is_decode() {
            LlmError::with_provider(ErrorCategory::ParseError, message, PROVIDER_NAME)
        } else {
            ErrorClassifier::classify(&message, PROVIDER_NAME)
        };
        ScribeError::Llm(classified)
    }
}

/// `Retry-After` in delta-seconds form; HTTP-date values are ignored
fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, system_role: &str) -> Result<LlmResponse> {
        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            "Sending chat completion"
        );

        let start_time = Instant::now();
        let request = self.build_request(prompt, system_role);
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let wait = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            let mut err = ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, body),
                PROVIDER_NAME,
            );
            if let Some(wait) = wait {
                err = err.retry_after(wait);
            }
            return Err(ScribeError::Llm(err));
        }

        let response_body: ChatCompletionResponse =
            response.json().await.map_err(Self::transport_error)?;

        let usage = response_body
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ScribeError::Llm(LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "No content in OpenAI response",
                    PROVIDER_NAME,
                ))
            })?;

        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            "Received completion"
        );

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER_NAME.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}
