use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::pipeline::chunking::build_file_tree;
use crate::pipeline::state::{GenerationState, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::types::Result;

/// Fills the caller-facing file tree; projection happens in the pipeline
pub struct OutputStage;

#[async_trait]
impl Stage for OutputStage {
    fn kind(&self) -> StageKind {
        StageKind::Output
    }

    #[instrument(skip_all)]
    async fn run(&self, mut state: GenerationState, _ctx: &StageContext) -> Result<GenerationState> {
        let tree = build_file_tree(
            state
                .parsed(StageKind::Output)?
                .files
                .keys()
                .map(String::as_str),
        );
        debug!(entries = tree.len(), "File tree built");
        state.file_tree = tree;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Language;
    use crate::pipeline::stages::testing::{offline_context, parsed_state, record};

    #[tokio::test]
    async fn test_file_tree() {
        let state = parsed_state(vec![
            record("src/lib.rs", Language::Rust, "fn a() {}", &["a"]),
            record("build.sh", Language::Bash, "echo hi", &[]),
        ]);
        let state = OutputStage.run(state, &offline_context()).await.unwrap();
        assert_eq!(state.file_tree, vec!["build.sh", "src/", "src/lib.rs"]);
    }
}
