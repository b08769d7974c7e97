use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::ai::prompt::{
    README_SYSTEM_ROLE, final_readme_prompt, partial_readme_prompt, readme_block,
};
use crate::ai::response::{clean_markdown, unescape_newlines};
use crate::constants::chunking::README_CHUNK_CHARS;
use crate::constants::output::NO_SUMMARY;
use crate::pipeline::chunking::group_by_chars;
use crate::pipeline::state::{GenerationState, Preferences, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::types::Result;

/// Map-reduce README: one partial per block group, then one final call.
/// Any exhausted call fails the request.
pub struct ReadmeStage;

#[async_trait]
impl Stage for ReadmeStage {
    fn kind(&self) -> StageKind {
        StageKind::Readme
    }

    fn enabled(&self, preferences: &Preferences) -> bool {
        preferences.generate_readme
    }

    #[instrument(skip_all)]
    async fn run(&self, mut state: GenerationState, ctx: &StageContext) -> Result<GenerationState> {
        let blocks = readme_blocks(&state)?;
        let groups = group_by_chars(&blocks, README_CHUNK_CHARS);
        debug!(blocks = blocks.len(), groups = groups.len(), "README input grouped");

        let mut partials = Vec::with_capacity(groups.len());
        for group in &groups {
            let reply = ctx
                .llm
                .complete("readme.partial", &partial_readme_prompt(group), README_SYSTEM_ROLE)
                .await?;
            partials.push(clean(&reply));
        }

        let reply = ctx
            .llm
            .complete(
                "readme.final",
                &final_readme_prompt(&partials.join("\n\n")),
                README_SYSTEM_ROLE,
            )
            .await?;
        state.readme = clean(&reply);

        info!(partials = partials.len(), chars = state.readme.len(), "README generated");
        Ok(state)
    }
}

fn clean(reply: &str) -> String {
    unescape_newlines(&clean_markdown(reply))
}

/// One block per summarized file. Without summaries every parsed file gets a
/// placeholder block so the README still sees the repository layout.
fn readme_blocks(state: &GenerationState) -> Result<Vec<String>> {
    if !state.summaries.is_empty() {
        return Ok(state
            .summaries
            .iter()
            .map(|(path, s)| readme_block(path, s.language, &s.summary, &s.symbols))
            .collect());
    }

    Ok(state
        .parsed(StageKind::Readme)?
        .files
        .values()
        .map(|r| readme_block(&r.path, r.language, NO_SUMMARY, &r.symbols))
        .collect())
}
