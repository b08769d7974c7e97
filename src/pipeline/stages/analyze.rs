use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::ai::LlmClient;
use crate::ai::prompt::{analysis_prompt, summary_system_role};
use crate::ai::response::parse_analysis;
use crate::analyzer::{FileRecord, Language};
use crate::constants::analysis::MIN_ANALYSIS_CODE_CHARS;
use crate::constants::output::ANALYSIS_FAILED;
use crate::pipeline::state::{FileAnalysis, GenerationState, Preferences, ProjectAnalysis, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::types::Result;

/// Lowercased file-name fragments of configuration, lock and bundled files
const SKIPPED_NAME_PARTS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "tsconfig",
    "webpack",
    "vite.config",
    "babel",
    "eslint",
    ".lock",
    ".min.js",
    ".bundle.js",
];

/// Detailed per-file analysis of the code-bearing files
pub struct AnalyzeStage;

#[async_trait]
impl Stage for AnalyzeStage {
    fn kind(&self) -> StageKind {
        StageKind::Analyze
    }

    fn enabled(&self, preferences: &Preferences) -> bool {
        preferences.analyze_project
    }

    #[instrument(skip_all, fields(concurrency = ctx.concurrency))]
    async fn run(&self, mut state: GenerationState, ctx: &StageContext) -> Result<GenerationState> {
        let parsed = state.parsed(StageKind::Analyze)?;
        let total_files = parsed.len();
        let languages: Vec<Language> = parsed
            .languages()
            .into_iter()
            .filter(|lang| *lang != Language::Css)
            .collect();
        let files: Vec<FileRecord> = parsed
            .files
            .values()
            .filter(|record| should_analyze(record))
            .cloned()
            .collect();
        debug!(candidates = files.len(), total_files, "Analysis candidates selected");

        let llm = &ctx.llm;
        let mut results = stream::iter(files)
            .map(|record| async move {
                let analysis = analyze_file(llm, &record).await;
                (record.path, analysis)
            })
            .buffer_unordered(ctx.concurrency.max(1));

        let mut detailed_analysis = BTreeMap::new();
        while let Some((path, analysis)) = results.next().await {
            detailed_analysis.insert(path, analysis);
        }

        info!(analyzed = detailed_analysis.len(), total_files, "Project analysis complete");
        state.project_analysis = Some(ProjectAnalysis {
            file_count: detailed_analysis.len(),
            detailed_analysis,
            total_files,
            languages,
        });
        Ok(state)
    }
}

/// Files with real logic: not markup, not trivially short, with at least one
/// symbol, and not a config, lock or bundled file
pub fn should_analyze(record: &FileRecord) -> bool {
    if record.language.is_markup() {
        return false;
    }
    if record.cleaned_code.trim().chars().count() < MIN_ANALYSIS_CODE_CHARS {
        return false;
    }
    if record.symbols.is_empty() {
        return false;
    }
    let name = record
        .path
        .rsplit('/')
        .next()
        .unwrap_or(&record.path)
        .to_lowercase();
    !SKIPPED_NAME_PARTS.iter().any(|part| name.contains(part))
}

async fn analyze_file(llm: &LlmClient, record: &FileRecord) -> FileAnalysis {
    let prompt = analysis_prompt(record.language, &record.cleaned_code, &record.symbols);
    let system_role = summary_system_role(record.language);

    match llm.complete("analyze", &prompt, &system_role).await {
        Ok(reply) => {
            let sections = parse_analysis(&reply);
            FileAnalysis {
                summary: sections.purpose.clone(),
                purpose: sections.purpose,
                functions: sections.functions,
                key_details: sections.key_details,
                language: record.language,
                symbols: record.symbols.clone(),
            }
        }
        Err(e) => {
            warn!(path = %record.path, error = %e, "File analysis failed");
            FileAnalysis {
                summary: ANALYSIS_FAILED.to_string(),
                purpose: format!("Error: {}", e),
                functions: Vec::new(),
                key_details: Vec::new(),
                language: record.language,
                symbols: record.symbols.clone(),
            }
        }
    }
}
