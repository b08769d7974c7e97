//! Offline provider
//!
//! Produces a deterministic echo of the prompt so the pipeline can run
//! end to end without network access or credentials.

use async_trait::async_trait;
use std::time::Instant;

use super::{LlmProvider, LlmResponse, ResponseMetadata, ResponseTiming, TokenUsage};
use crate::types::Result;

/// Characters of the flattened prompt kept in the echo
const ECHO_CHARS: usize = 280;

#[derive(Debug, Clone, Default)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }

    /// `[<first word of system role>] <prompt on one line, first 280 chars>`
    pub fn render(prompt: &str, system_role: &str) -> String {
        let tag = system_role
            .split_whitespace()
            .next()
            .unwrap_or("assistant")
            .to_lowercase();
        let flattened: String = prompt
            .trim()
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .take(ECHO_CHARS)
            .collect();
        format!("[{}] {}", tag, flattened)
    }
}

#[async_trait]
impl LlmProvider for OfflineProvider {
    async fn complete(&self, prompt: &str, system_role: &str) -> Result<LlmResponse> {
        let start = Instant::now();
        let content = Self::render(prompt, system_role);
        let usage = TokenUsage::from_openai(
            prompt.split_whitespace().count() as u32,
            content.split_whitespace().count() as u32,
        );
        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(start.elapsed()),
            metadata: ResponseMetadata {
                model: self.model().to_string(),
                provider: self.name().to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "offline"
    }

    fn model(&self) -> &str {
        "echo"
    }
}
