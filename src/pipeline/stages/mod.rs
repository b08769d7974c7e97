//! Pipeline stages in execution order.

mod analyze;
mod fetch;
mod output;
mod parse;
mod readme;
mod summarize;
mod visualize;

pub use analyze::{AnalyzeStage, should_analyze};
pub use fetch::FetchStage;
pub use output::OutputStage;
pub use parse::ParseStage;
pub use readme::ReadmeStage;
pub use summarize::SummarizeStage;
pub use visualize::{VisualizeStage, fallback_diagram};

use super::Stage;

/// Fetch → Parse → Summarize → README → Visualize → Analyze → Output
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(FetchStage),
        Box::new(ParseStage),
        Box::new(SummarizeStage),
        Box::new(ReadmeStage),
        Box::new(VisualizeStage),
        Box::new(AnalyzeStage),
        Box::new(OutputStage),
    ]
}

/// Stub collaborators for stage tests
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::ai::{
        ErrorCategory, LlmClient, LlmError, LlmProvider, LlmResponse, OfflineProvider,
        RetryPolicy,
    };
    use crate::analyzer::{FileRecord, Language, ParseResult};
    use crate::pipeline::state::{GenerationState, InputDescriptor, Preferences};
    use crate::pipeline::{CancellationToken, StageContext};
    use crate::source::RemoteSource;
    use crate::types::{Result, ScribeError, SourceError};

    /// Replies produced by a closure over (call number, prompt)
    pub struct ScriptedProvider {
        pub calls: AtomicU32,
        pub prompts: Mutex<Vec<String>>,
        reply: Box<dyn Fn(u32, &str) -> Result<String> + Send + Sync>,
    }

    impl ScriptedProvider {
        pub fn new(reply: impl Fn(u32, &str) -> Result<String> + Send + Sync + 'static) -> Self {
            Self {
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
                reply: Box::new(reply),
            }
        }

        pub fn failing(category: ErrorCategory) -> Self {
            Self::new(move |_, _| Err(ScribeError::Llm(LlmError::new(category, "scripted failure"))))
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str, _system_role: &str) -> Result<LlmResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            (self.reply)(call, prompt).map(LlmResponse::content_only)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    pub struct StubSource {
        pub files: BTreeMap<String, String>,
    }

    #[async_trait]
    impl RemoteSource for StubSource {
        async fn fetch(
            &self,
            _locator: &str,
            _branch: Option<&str>,
        ) -> std::result::Result<BTreeMap<String, String>, SourceError> {
            Ok(self.files.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    pub fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            factor: 2.0,
        }
    }

    pub fn context_with(provider: Arc<dyn LlmProvider + Send + Sync>) -> StageContext {
        let llm = LlmClient::new(provider, fast_policy(), Duration::from_secs(5));
        let source = Arc::new(StubSource {
            files: BTreeMap::new(),
        });
        StageContext::new(llm, source, CancellationToken::new())
    }

    pub fn offline_context() -> StageContext {
        context_with(Arc::new(OfflineProvider::new()))
    }

    pub fn record(path: &str, language: Language, code: &str, symbols: &[&str]) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            language,
            cleaned_code: code.to_string(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// State that has already been through Parse
    pub fn parsed_state(records: Vec<FileRecord>) -> GenerationState {
        let mut state = GenerationState::new(
            InputDescriptor::upload(BTreeMap::new()),
            Preferences::default(),
        );
        let mut parsed = ParseResult::new("repo");
        for record in records {
            parsed.insert(record);
        }
        state.parse_result = Some(parsed);
        state
    }
}
