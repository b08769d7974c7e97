//! Generation Pipeline
//!
//! Runs a fixed, ordered list of stages over one [`GenerationState`]:
//!
//! ```text
//! Fetch → Parse → Summarize → README → Visualize → Analyze → Output
//! ```
//!
//! Stages run one at a time. Optional stages are gated by [`Preferences`], and
//! every stage is raced against the request's [`CancellationToken`].

pub mod cancel;
pub mod chunking;
pub mod result;
pub mod stages;
pub mod state;

pub use cancel::CancellationToken;
pub use result::GenerationResult;
pub use state::{
    FileAnalysis, FileSummary, GenerationState, InputDescriptor, InputKind, InputPayload,
    Preferences, ProjectAnalysis, SourceTree, StageKind,
};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::ai::{LlmClient, ProviderConfig, RetryPolicy, TimeoutConfig, create_provider};
use crate::analyzer::RepositoryWalker;
use crate::config::Config;
use crate::source::{GithubSource, SharedSource};
use crate::types::{Result, ScribeError};

/// One step of the pipeline. Takes the state by value and hands it back with
/// the fields it owns filled in.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Whether the stage runs for these preferences
    fn enabled(&self, _preferences: &Preferences) -> bool {
        true
    }

    async fn run(&self, state: GenerationState, ctx: &StageContext) -> Result<GenerationState>;
}

/// Collaborators shared by every stage of a request
#[derive(Clone)]
pub struct StageContext {
    pub llm: LlmClient,
    pub source: SharedSource,
    pub walker: RepositoryWalker,
    /// Files summarized or analyzed at once
    pub concurrency: usize,
    pub cancel: CancellationToken,
}

impl StageContext {
    pub fn new(llm: LlmClient, source: SharedSource, cancel: CancellationToken) -> Self {
        Self {
            llm,
            source,
            walker: RepositoryWalker::new(),
            concurrency: 1,
            cancel,
        }
    }

    pub fn with_walker(mut self, walker: RepositoryWalker) -> Self {
        self.walker = walker;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    ctx: StageContext,
}

impl Pipeline {
    /// Pipeline with the standard stage order
    pub fn new(ctx: StageContext) -> Self {
        Self {
            stages: stages::default_stages(),
            ctx,
        }
    }

    pub fn with_stages(ctx: StageContext, stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages, ctx }
    }

    /// Wire provider, retry policy, source and walker from configuration
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let provider = create_provider(&ProviderConfig::from(&config.llm))?;
        let timeouts = TimeoutConfig::from_config(config);
        let llm = LlmClient::new(
            provider,
            RetryPolicy::from(&config.retry),
            timeouts.llm_request,
        );
        let source: SharedSource =
            Arc::new(GithubSource::from_config(&config.source, &timeouts)?);
        let walker = RepositoryWalker::from_config(&config.analysis)?;

        let ctx = StageContext::new(llm, source, cancel)
            .with_walker(walker)
            .with_concurrency(config.pipeline.concurrency);
        Ok(Self::new(ctx))
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Run every enabled stage in order.
    ///
    /// Returns [`ScribeError::Cancelled`] without a partial result once the
    /// token fires, whether between stages or inside one.
    #[instrument(skip_all, fields(request_id = %state.request_id, input = %state.input.kind))]
    pub async fn run(&self, mut state: GenerationState) -> Result<GenerationResult> {
        let started = Instant::now();

        for stage in &self.stages {
            let kind = stage.kind();
            if self.ctx.cancel.is_cancelled() {
                info!(stage = %kind, "Cancelled before stage");
                return Err(ScribeError::Cancelled);
            }
            if !stage.enabled(&state.preferences) {
                debug!(stage = %kind, "Stage disabled, skipping");
                continue;
            }

            let stage_started = Instant::now();
            state = tokio::select! {
                biased;
                _ = self.ctx.cancel.cancelled() => {
                    info!(stage = %kind, "Cancelled during stage");
                    return Err(ScribeError::Cancelled);
                }
                result = stage.run(state, &self.ctx) => result?,
            };
            state.completed.push(kind);
            info!(
                stage = %kind,
                elapsed_ms = stage_started.elapsed().as_millis() as u64,
                "Stage complete"
            );
        }

        let usage = self.ctx.llm.usage();
        info!(
            provider = self.ctx.llm.provider_name(),
            model = self.ctx.llm.model(),
            stages = state.completed.len(),
            llm_calls = usage.calls,
            backoffs = usage.backoffs,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(GenerationResult::from(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::output::DIAGRAM_KEY;
    use crate::pipeline::stages::testing::{ScriptedProvider, context_with, offline_context};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn repo() -> InputDescriptor {
        InputDescriptor::upload(BTreeMap::from([
            (
                "main.py".to_string(),
                "# entry point\ndef main():\n    print('hi')\n".to_string(),
            ),
            ("README.md".to_string(), "# Old readme\n".to_string()),
        ]))
    }

    #[tokio::test]
    async fn test_end_to_end_offline() {
        let pipeline = Pipeline::new(offline_context());
        let state = GenerationState::new(repo(), Preferences::default());
        let result = pipeline.run(state).await.unwrap();

        assert_eq!(result.summaries.len(), 1);
        assert!(!result.summaries["main.py"].is_empty());
        assert!(!result.readme.is_empty());
        assert!(result.diagram().is_some());
        assert!(result.project_analysis.is_none());
        assert_eq!(result.file_tree, vec!["main.py"]);
        assert_eq!(
            result.completed_stages,
            vec![
                StageKind::Fetch,
                StageKind::Parse,
                StageKind::Summarize,
                StageKind::Readme,
                StageKind::Visualize,
                StageKind::Output,
            ]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_replies_reach_outputs() {
        let provider = Arc::new(ScriptedProvider::new(|_, prompt| {
            let reply = if prompt.starts_with("Analyze the following") {
                "- Prints a greeting"
            } else if prompt.contains("CODEBASE INFORMATION") {
                "# Greeter\n\nPrints a greeting on start."
            } else if prompt.contains("Code Summary") {
                "Greeter partial"
            } else {
                "flowchart TD\n    Main --> Stdout"
            };
            Ok(reply.to_string())
        }));
        let pipeline = Pipeline::new(context_with(provider.clone()));
        let result = pipeline
            .run(GenerationState::new(repo(), Preferences::default()))
            .await
            .unwrap();

        assert_eq!(result.summaries["main.py"], "Prints a greeting");
        assert_eq!(result.readme, "# Greeter\n\nPrints a greeting on start.");
        assert!(result.diagram().is_some_and(|d| d.contains("Main --> Stdout")));

        let prompts = provider.prompts.lock().unwrap();
        let partial = prompts
            .iter()
            .find(|p| p.contains("Code Summary") && !p.contains("CODEBASE INFORMATION"))
            .unwrap();
        assert!(partial.contains("Prints a greeting"));
        let last_readme = prompts
            .iter()
            .find(|p| p.contains("CODEBASE INFORMATION"))
            .unwrap();
        assert!(last_readme.contains("Greeter partial"));
    }

    #[tokio::test]
    async fn test_disabled_stages_are_skipped() {
        let provider = Arc::new(ScriptedProvider::new(|_, _| Ok("unused".to_string())));
        let pipeline = Pipeline::new(context_with(provider.clone()));
        let prefs = Preferences {
            generate_summaries: false,
            generate_readme: false,
            visualize_structure: false,
            analyze_project: false,
        };
        let result = pipeline.run(GenerationState::new(repo(), prefs)).await.unwrap();

        assert_eq!(provider.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(result.readme.is_empty());
        assert!(result.summaries.is_empty());
        assert!(!result.diagrams.contains_key(DIAGRAM_KEY));
        assert_eq!(
            result.completed_stages,
            vec![StageKind::Fetch, StageKind::Parse, StageKind::Output]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_stage() {
        let ctx = offline_context();
        ctx.cancel.cancel();
        let err = Pipeline::new(ctx)
            .run(GenerationState::new(repo(), Preferences::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_during_stage() {
        let provider = Arc::new(ScriptedProvider::new(|_, _| Ok("never seen".to_string())));
        struct Stall;
        #[async_trait]
        impl Stage for Stall {
            fn kind(&self) -> StageKind {
                StageKind::Summarize
            }
            async fn run(&self, state: GenerationState, _ctx: &StageContext) -> Result<GenerationState> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(state)
            }
        }

        let ctx = context_with(provider);
        let cancel = ctx.cancel.clone();
        let pipeline = Pipeline::with_stages(
            ctx,
            vec![Box::new(stages::FetchStage), Box::new(Stall)],
        );
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            pipeline.run(GenerationState::new(repo(), Preferences::default())),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, ScribeError::Cancelled));
    }

    #[tokio::test]
    async fn test_unsupported_payload_fails_request() {
        let input = InputDescriptor::new(InputKind::Github, InputPayload::Archive(vec![1, 2]));
        let err = Pipeline::new(offline_context())
            .run(GenerationState::new(input, Preferences::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::UnsupportedInput(_)));
    }

    #[test]
    fn test_default_stage_order() {
        let kinds = Pipeline::new(offline_context()).stage_kinds();
        assert_eq!(
            kinds,
            vec![
                StageKind::Fetch,
                StageKind::Parse,
                StageKind::Summarize,
                StageKind::Readme,
                StageKind::Visualize,
                StageKind::Analyze,
                StageKind::Output,
            ]
        );
    }

    #[test]
    fn test_from_default_config() {
        let pipeline = Pipeline::from_config(&Config::default(), CancellationToken::new());
        // the default provider needs an API key, which the test env may not have
        if let Ok(pipeline) = pipeline {
            assert_eq!(pipeline.context().concurrency, 1);
        }
    }
}
