use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::ai::LlmClient;
use crate::ai::prompt::{summary_prompt, summary_system_role};
use crate::ai::response::parse_summary_bullets;
use crate::analyzer::FileRecord;
use crate::constants::output::NO_SUMMARY;
use crate::pipeline::chunking::line_windows;
use crate::pipeline::state::{FileSummary, GenerationState, Preferences, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::types::Result;

/// Per-file summaries, one LLM call per line window
pub struct SummarizeStage;

#[async_trait]
impl Stage for SummarizeStage {
    fn kind(&self) -> StageKind {
        StageKind::Summarize
    }

    fn enabled(&self, preferences: &Preferences) -> bool {
        preferences.generate_summaries
    }

    #[instrument(skip_all, fields(concurrency = ctx.concurrency))]
    async fn run(&self, mut state: GenerationState, ctx: &StageContext) -> Result<GenerationState> {
        let files: Vec<FileRecord> = state
            .parsed(StageKind::Summarize)?
            .files
            .values()
            .filter(|record| !record.cleaned_code.trim().is_empty())
            .cloned()
            .collect();
        let total = files.len();

        let llm = &ctx.llm;
        let mut results = stream::iter(files)
            .map(|record| async move {
                let summary = summarize_file(llm, &record).await;
                (record, summary)
            })
            .buffer_unordered(ctx.concurrency.max(1));

        while let Some((record, summary)) = results.next().await {
            debug!(path = %record.path, "Summarized");
            state.record_summary(
                record.path,
                FileSummary {
                    language: record.language,
                    summary,
                    symbols: record.symbols,
                },
            );
        }

        info!(files = total, "Summaries generated");
        Ok(state)
    }
}

/// Summaries of every chunk joined with spaces, or the placeholder when no
/// chunk produced text. Failed chunks are skipped.
async fn summarize_file(llm: &LlmClient, record: &FileRecord) -> String {
    let system_role = summary_system_role(record.language);
    let mut parts: Vec<String> = Vec::new();

    for (index, chunk) in line_windows(&record.cleaned_code).iter().enumerate() {
        let prompt = summary_prompt(record.language, chunk);
        match llm.complete("summarize", &prompt, &system_role).await {
            Ok(reply) => parts.extend(
                parse_summary_bullets(&reply)
                    .into_iter()
                    .map(|bullet| bullet.summary)
                    .filter(|summary| !summary.is_empty()),
            ),
            Err(e) => {
                warn!(path = %record.path, chunk = index, error = %e, "Chunk summary failed, skipping");
            }
        }
    }

    if parts.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        parts.join(" ")
    }
}
