//! Generate Command
//!
//! Resolves the source argument into an input descriptor, runs the pipeline
//! on a current-thread runtime, and writes the artifacts:
//!
//! - `README.md`
//! - `summaries.json` (path → summary)
//! - `diagram.mmd`
//! - `analysis.json` when analysis ran
//! - `report.<ext>` when `--format` is given

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::ReportFormat;
use crate::cli::Output;
use crate::config::{Config, ConfigLoader};
use crate::pipeline::{
    CancellationToken, GenerationResult, GenerationState, InputDescriptor, InputKind, Pipeline,
    Preferences,
};
use crate::types::{Result, ScribeError};

const DEFAULT_OUTPUT_DIR: &str = "reposcribe-output";

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Locator, archive path, file-map JSON path, or directory
    pub source: String,
    /// Inferred from `source` when absent
    pub kind: Option<InputKind>,
    pub branch: Option<String>,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub no_summaries: bool,
    pub no_readme: bool,
    pub no_visualize: bool,
    pub analyze: bool,
    pub concurrency: Option<usize>,
    pub format: Option<ReportFormat>,
}

pub fn run(options: GenerateOptions, output: &Output) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    apply_overrides(&mut config, &options);
    config.validate()?;

    let input = resolve_input(&options.source, options.kind, options.branch.clone())?;
    let preferences = preferences_for(&config, &options);
    let out_dir = options
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    output.header("reposcribe generate");
    output.field("Source", &options.source);
    output.field("Kind", input.kind);
    output.field("Provider", format!("{} ({})", config.llm.provider, config.llm.model));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let pipeline = Pipeline::from_config(&config, cancel.clone())?;

        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                ctrl_c.cancel();
            }
        });

        pipeline
            .run(GenerationState::new(input, preferences))
            .await
    })?;

    for failure in &result.parse_failures {
        output.warning(&format!("Skipped {}: {}", failure.path, failure.reason));
    }

    let written = write_outputs(&result, &out_dir, options.format)?;
    let files = result.file_tree.iter().filter(|e| !e.ends_with('/')).count();
    output.success(&format!("Generated documentation for {} files", files));
    for path in &written {
        output.file_written(path);
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, options: &GenerateOptions) {
    if let Some(provider) = &options.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &options.model {
        config.llm.model = model.clone();
    }
    if let Some(concurrency) = options.concurrency {
        config.pipeline.concurrency = concurrency;
    }
}

fn preferences_for(config: &Config, options: &GenerateOptions) -> Preferences {
    let mut preferences = Preferences::from(&config.pipeline);
    if options.no_summaries {
        preferences.generate_summaries = false;
    }
    if options.no_readme {
        preferences.generate_readme = false;
    }
    if options.no_visualize {
        preferences.visualize_structure = false;
    }
    if options.analyze {
        preferences.analyze_project = true;
    }
    preferences
}

/// Turn the positional source into an input descriptor.
///
/// Without an explicit kind: an existing directory is local, an existing
/// `.zip` file is an archive, anything else is a GitHub locator.
pub fn resolve_input(
    source: &str,
    kind: Option<InputKind>,
    branch: Option<String>,
) -> Result<InputDescriptor> {
    let path = Path::new(source);
    let kind = kind.unwrap_or_else(|| {
        if path.is_dir() {
            InputKind::Local
        } else if path.is_file() && source.to_lowercase().ends_with(".zip") {
            InputKind::Zip
        } else {
            InputKind::Github
        }
    });

    let input = match kind {
        InputKind::Github => InputDescriptor::github(source, branch),
        InputKind::Zip => InputDescriptor::zip(fs::read(path)?),
        InputKind::Upload => {
            let content = fs::read_to_string(path)?;
            let files: BTreeMap<String, String> = serde_json::from_str(&content).map_err(|e| {
                ScribeError::UnsupportedInput(format!(
                    "{} is not a JSON object of path → content: {}",
                    source, e
                ))
            })?;
            InputDescriptor::upload(files)
        }
        InputKind::Local => InputDescriptor::local(path),
    };
    info!(kind = %input.kind, payload = input.payload.describe(), "Input resolved");
    Ok(input)
}

/// Write every artifact into `dir`, returning the paths written
pub fn write_outputs(
    result: &GenerationResult,
    dir: &Path,
    format: Option<ReportFormat>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut write = |name: String, content: String| -> Result<()> {
        let path = dir.join(name);
        fs::write(&path, content)?;
        written.push(path);
        Ok(())
    };

    if !result.readme.is_empty() {
        write("README.md".to_string(), result.readme.clone())?;
    }
    if !result.summaries.is_empty() {
        write(
            "summaries.json".to_string(),
            serde_json::to_string_pretty(&result.summaries)?,
        )?;
    }
    if let Some(diagram) = result.diagram() {
        write("diagram.mmd".to_string(), format!("{}\n", diagram))?;
    }
    if let Some(analysis) = &result.project_analysis {
        write(
            "analysis.json".to_string(),
            serde_json::to_string_pretty(analysis)?,
        )?;
    }
    if let Some(format) = format {
        let report = match format {
            ReportFormat::Json => result.to_json()?,
            ReportFormat::Yaml => result.to_yaml()?,
            ReportFormat::Markdown => result.to_markdown(),
            ReportFormat::Toml => {
                return Err(ScribeError::Config(
                    "generate reports support json, yaml or markdown".to_string(),
                ));
            }
        };
        write(format!("report.{}", format.extension()), report)?;
    }

    Ok(written)
}
