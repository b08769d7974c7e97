//! Caller-visible projection of a finished generation.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{GenerationState, InputKind, ProjectAnalysis, StageKind};
use crate::analyzer::FileFailure;
use crate::constants::output::DIAGRAM_KEY;
use crate::types::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub request_id: Uuid,
    pub input_kind: InputKind,
    pub readme: String,
    /// Path → summary text
    pub summaries: BTreeMap<String, String>,
    pub diagrams: BTreeMap<String, String>,
    pub project_analysis: Option<ProjectAnalysis>,
    pub file_tree: Vec<String>,
    pub parse_failures: Vec<FileFailure>,
    pub completed_stages: Vec<StageKind>,
    pub generated_at: DateTime<Utc>,
}

impl From<GenerationState> for GenerationResult {
    fn from(state: GenerationState) -> Self {
        let parse_failures = state
            .parse_result
            .map(|parsed| parsed.failures)
            .unwrap_or_default();

        Self {
            request_id: state.request_id,
            input_kind: state.input.kind,
            readme: state.readme,
            summaries: state
                .summaries
                .into_iter()
                .map(|(path, summary)| (path, summary.summary))
                .collect(),
            diagrams: state.diagrams,
            project_analysis: state.project_analysis,
            file_tree: state.file_tree,
            parse_failures,
            completed_stages: state.completed,
            generated_at: Utc::now(),
        }
    }
}

impl GenerationResult {
    pub fn diagram(&self) -> Option<&str> {
        self.diagrams.get(DIAGRAM_KEY).map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Single Markdown report: README, summaries, diagram, analysis
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        if !self.readme.is_empty() {
            out.push_str(self.readme.trim_end());
            out.push_str("\n\n");
        }

        if !self.summaries.is_empty() {
            out.push_str("## File Summaries\n\n");
            for (path, summary) in &self.summaries {
                let _ = writeln!(out, "- `{}`: {}", path, summary);
            }
            out.push('\n');
        }

        if let Some(diagram) = self.diagram() {
            let _ = write!(out, "## Architecture Diagram\n\n```mermaid\n{}\n```\n\n", diagram);
        }

        if let Some(analysis) = &self.project_analysis {
            let _ = write!(
                out,
                "## Project Analysis\n\nAnalyzed {} of {} files.\n\n",
                analysis.file_count, analysis.total_files
            );
            for (path, file) in &analysis.detailed_analysis {
                let _ = write!(out, "### `{}` ({})\n\n{}\n\n", path, file.language, file.purpose);
                if !file.functions.is_empty() {
                    out.push_str("**Key functions**\n\n");
                    for function in &file.functions {
                        let _ = writeln!(out, "- {}", function);
                    }
                    out.push('\n');
                }
                if !file.key_details.is_empty() {
                    out.push_str("**Technical details**\n\n");
                    for detail in &file.key_details {
                        let _ = writeln!(out, "- {}", detail);
                    }
                    out.push('\n');
                }
            }
        }

        if !self.parse_failures.is_empty() {
            out.push_str("## Skipped Files\n\n");
            for failure in &self.parse_failures {
                let _ = writeln!(out, "- `{}`: {}", failure.path, failure.reason);
            }
            out.push('\n');
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }
}
