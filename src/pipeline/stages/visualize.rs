use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::ai::LlmClient;
use crate::ai::prompt::{ARCHITECT_SYSTEM_ROLE, diagram_prompt, explanation_prompt, mapping_prompt};
use crate::ai::response::{extract_between, extract_block, extract_mermaid, strip_think_tags};
use crate::constants::output::{DIAGRAM_KEY, NO_README};
use crate::pipeline::chunking::build_file_tree;
use crate::pipeline::state::{GenerationState, Preferences, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::types::Result;

/// Three-phase architecture diagram: explain, map components, draw
pub struct VisualizeStage;

#[async_trait]
impl Stage for VisualizeStage {
    fn kind(&self) -> StageKind {
        StageKind::Visualize
    }

    fn enabled(&self, preferences: &Preferences) -> bool {
        preferences.visualize_structure
    }

    #[instrument(skip_all)]
    async fn run(&self, mut state: GenerationState, ctx: &StageContext) -> Result<GenerationState> {
        let parsed = state.parsed(StageKind::Visualize)?;
        let tree = build_file_tree(parsed.files.keys().map(String::as_str)).join("\n");
        let readme = if state.readme.trim().is_empty() {
            NO_README
        } else {
            state.readme.as_str()
        };

        let diagram = match draw(&ctx.llm, &tree, readme).await {
            Ok(diagram) if !diagram.is_empty() => diagram,
            Ok(_) => {
                warn!("Diagram reply was empty, using fallback");
                fallback_diagram(&state.input.display_name())
            }
            Err(e) => {
                warn!(error = %e, "Diagram generation failed, using fallback");
                fallback_diagram(&state.input.display_name())
            }
        };

        info!(lines = diagram.lines().count(), "Diagram generated");
        state.diagrams.insert(DIAGRAM_KEY.to_string(), diagram);
        Ok(state)
    }
}

async fn draw(llm: &LlmClient, tree: &str, readme: &str) -> Result<String> {
    let reply = llm
        .complete("visualize.explain", &explanation_prompt(tree, readme), ARCHITECT_SYSTEM_ROLE)
        .await?;
    let reply = strip_think_tags(&reply);
    let explanation = extract_between(&reply, "<explanation>", "</explanation>")
        .unwrap_or(reply.trim())
        .to_string();

    let reply = llm
        .complete("visualize.map", &mapping_prompt(&explanation, tree), ARCHITECT_SYSTEM_ROLE)
        .await?;
    let reply = strip_think_tags(&reply);
    let mapping = extract_block(&reply, "<component_mapping>", "</component_mapping>")
        .unwrap_or(reply.trim())
        .to_string();

    let reply = llm
        .complete("visualize.diagram", &diagram_prompt(&explanation, &mapping), ARCHITECT_SYSTEM_ROLE)
        .await?;
    Ok(extract_mermaid(&reply))
}

/// Minimal flowchart used when the diagram phases fail
pub fn fallback_diagram(project_name: &str) -> String {
    format!(
        "flowchart TD\n    Root[\"{}\"]\n    Root --> Files[\"Project Files\"]\n    Files --> Note[\"See file tree for details\"]",
        project_name.replace('"', "'")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ErrorCategory;
    use crate::analyzer::Language;
    use crate::pipeline::stages::testing::{ScriptedProvider, context_with, parsed_state, record};
    use crate::pipeline::state::InputDescriptor;
    use std::sync::Arc;

    fn state() -> GenerationState {
        let mut state = parsed_state(vec![
            record("src/app.py", Language::Python, "def run(): pass", &["run"]),
            record("setup.py", Language::Python, "x = 1", &[]),
        ]);
        state.input = InputDescriptor::github("acme/widgets", None);
        state
    }

    #[tokio::test]
    async fn test_three_phases() {
        let provider = Arc::new(ScriptedProvider::new(|call, _| {
            Ok(match call {
                0 => "<think>x</think>intro <explanation>An app.</explanation>".to_string(),
                1 => "noise <component_mapping>App: src/app.py</component_mapping> tail".to_string(),
                _ => "```mermaid\nflowchart LR\n  A --> B\n```".to_string(),
            })
        }));
        let state = VisualizeStage.run(state(), &context_with(provider.clone())).await.unwrap();
        assert_eq!(state.diagrams[DIAGRAM_KEY], "flowchart LR\n  A --> B");

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("<file_tree>\nsetup.py\nsrc/\nsrc/app.py\n</file_tree>"));
        assert!(prompts[0].contains(&format!("<readme>\n{}\n</readme>", NO_README)));
        assert!(prompts[1].contains("<explanation>\nAn app.\n</explanation>"));
        assert!(prompts[2].ends_with("<component_mapping>App: src/app.py</component_mapping>"));
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let provider = Arc::new(ScriptedProvider::failing(ErrorCategory::Auth));
        let state = VisualizeStage.run(state(), &context_with(provider)).await.unwrap();
        assert_eq!(state.diagrams[DIAGRAM_KEY], fallback_diagram("widgets"));
        assert!(state.diagrams[DIAGRAM_KEY].contains("Root[\"widgets\"]"));
    }

    #[tokio::test]
    async fn test_empty_diagram_uses_fallback() {
        let provider = Arc::new(ScriptedProvider::new(|call, _| {
            Ok(if call < 2 { "text".to_string() } else { "```mermaid\n```".to_string() })
        }));
        let state = VisualizeStage.run(state(), &context_with(provider)).await.unwrap();
        assert!(state.diagrams[DIAGRAM_KEY].starts_with("flowchart TD\n    Root[\"widgets\"]"));
    }

    #[test]
    fn test_fallback_escapes_quotes() {
        assert!(fallback_diagram("a\"b").contains("Root[\"a'b\"]"));
    }
}
