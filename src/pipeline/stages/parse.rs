use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::pipeline::state::{GenerationState, SourceTree, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::types::{Result, ScribeError};

/// Walks the fetched sources into a [`ParseResult`](crate::analyzer::ParseResult)
pub struct ParseStage;

#[async_trait]
impl Stage for ParseStage {
    fn kind(&self) -> StageKind {
        StageKind::Parse
    }

    #[instrument(skip_all)]
    async fn run(&self, mut state: GenerationState, ctx: &StageContext) -> Result<GenerationState> {
        let parsed = match state.sources.as_ref() {
            Some(SourceTree::Disk(root)) => ctx.walker.walk_dir_async(root).await?,
            Some(SourceTree::Memory(files)) if files.is_empty() => {
                return Err(ScribeError::MissingContent(format!(
                    "{} input contained no files",
                    state.input.kind
                )));
            }
            Some(SourceTree::Memory(files)) => ctx.walker.walk_memory_async(files).await,
            None => return Err(ScribeError::stage("parse", "no sources were fetched")),
        };

        for failure in &parsed.failures {
            warn!(path = %failure.path, reason = %failure.reason, "File skipped");
        }
        info!(
            root = %parsed.root,
            files = parsed.len(),
            failures = parsed.failures.len(),
            "Repository parsed"
        );

        state.parse_result = Some(parsed);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Language;
    use crate::pipeline::stages::testing::offline_context;
    use crate::pipeline::state::{InputDescriptor, Preferences};
    use std::collections::BTreeMap;

    fn with_sources(sources: SourceTree) -> GenerationState {
        let mut state = GenerationState::new(
            InputDescriptor::upload(BTreeMap::new()),
            Preferences::default(),
        );
        state.sources = Some(sources);
        state
    }

    #[tokio::test]
    async fn test_memory_sources_are_filtered() {
        let files = BTreeMap::from([
            ("a.py".to_string(), "def a():\n    pass\n".to_string()),
            ("a.min.js".to_string(), "var a=1;".to_string()),
            ("node_modules/x.js".to_string(), "var x;".to_string()),
        ]);
        let state = ParseStage
            .run(with_sources(SourceTree::Memory(files)), &offline_context())
            .await
            .unwrap();
        let parsed = state.parse_result.unwrap();
        assert_eq!(parsed.files.keys().collect::<Vec<_>>(), vec!["a.py"]);
        assert_eq!(parsed.files["a.py"].language, Language::Python);
        assert_eq!(parsed.files["a.py"].symbols, vec!["a"]);
    }

    #[tokio::test]
    async fn test_empty_memory_is_missing_content() {
        let err = ParseStage
            .run(with_sources(SourceTree::Memory(BTreeMap::new())), &offline_context())
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::MissingContent(_)));
    }

    #[tokio::test]
    async fn test_disk_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        let state = ParseStage
            .run(
                with_sources(SourceTree::Disk(dir.path().to_path_buf())),
                &offline_context(),
            )
            .await
            .unwrap();
        let parsed = state.parse_result.unwrap();
        assert_eq!(parsed.files["main.go"].symbols, vec!["main"]);
    }

    #[tokio::test]
    async fn test_missing_sources_is_stage_error() {
        let state = GenerationState::new(
            InputDescriptor::upload(BTreeMap::new()),
            Preferences::default(),
        );
        let err = ParseStage.run(state, &offline_context()).await.unwrap_err();
        assert!(matches!(err, ScribeError::Stage { .. }));
    }
}
