//! Generation state moved through the pipeline.
//!
//! Each stage takes the state by value, writes only the fields it owns, and
//! hands it back. Ownership per field:
//!
//! | Field | Writer |
//! |---|---|
//! | `sources` | Fetch |
//! | `parse_result` | Parse |
//! | `summaries` | Summarize |
//! | `readme` | README |
//! | `diagrams` | Visualize |
//! | `project_analysis` | Analyze |
//! | `file_tree` | Output |
//! | `completed` | the pipeline itself |

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzer::{Language, ParseResult};
use crate::config::PipelineConfig;
use crate::types::{Result, ScribeError};

// =============================================================================
// Input
// =============================================================================

/// Where the repository comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Github,
    Zip,
    Upload,
    Local,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Zip => "zip",
            Self::Upload => "upload",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "github" | "repo" | "url" => Ok(Self::Github),
            "zip" => Ok(Self::Zip),
            "upload" => Ok(Self::Upload),
            "local" | "dir" | "path" => Ok(Self::Local),
            other => Err(ScribeError::UnsupportedInput(format!(
                "Unsupported input kind '{}'. Use: github, repo, url, zip, upload, local",
                other
            ))),
        }
    }
}

/// Raw input data
#[derive(Clone)]
pub enum InputPayload {
    /// Repository URL or `owner/repo`
    Locator(String),
    /// ZIP archive bytes
    Archive(Vec<u8>),
    /// Path → content map
    Files(BTreeMap<String, String>),
    Directory(PathBuf),
}

impl InputPayload {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Locator(_) => "locator",
            Self::Archive(_) => "archive",
            Self::Files(_) => "file map",
            Self::Directory(_) => "directory",
        }
    }
}

impl fmt::Debug for InputPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locator(l) => f.debug_tuple("Locator").field(l).finish(),
            Self::Archive(bytes) => write!(f, "Archive({} bytes)", bytes.len()),
            Self::Files(files) => write!(f, "Files({} entries)", files.len()),
            Self::Directory(p) => f.debug_tuple("Directory").field(p).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputDescriptor {
    pub kind: InputKind,
    pub payload: InputPayload,
    pub branch: Option<String>,
}

impl InputDescriptor {
    pub fn new(kind: InputKind, payload: InputPayload) -> Self {
        Self {
            kind,
            payload,
            branch: None,
        }
    }

    pub fn github(locator: impl Into<String>, branch: Option<String>) -> Self {
        Self {
            kind: InputKind::Github,
            payload: InputPayload::Locator(locator.into()),
            branch,
        }
    }

    pub fn zip(bytes: Vec<u8>) -> Self {
        Self::new(InputKind::Zip, InputPayload::Archive(bytes))
    }

    pub fn upload(files: BTreeMap<String, String>) -> Self {
        Self::new(InputKind::Upload, InputPayload::Files(files))
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(InputKind::Local, InputPayload::Directory(path.into()))
    }

    /// Human-facing project name: last locator/path segment, else "Repository"
    pub fn display_name(&self) -> String {
        let candidate = match &self.payload {
            InputPayload::Locator(locator) => locator
                .trim_end_matches('/')
                .rsplit(['/', ':'])
                .next()
                .map(|s| s.trim_end_matches(".git").to_string()),
            InputPayload::Directory(path) => path
                .canonicalize()
                .ok()
                .as_deref()
                .and_then(|p| p.file_name())
                .or_else(|| path.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            InputPayload::Archive(_) | InputPayload::Files(_) => None,
        };
        candidate
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Repository".to_string())
    }
}

/// Which optional stages run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub generate_summaries: bool,
    pub generate_readme: bool,
    pub visualize_structure: bool,
    pub analyze_project: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for Preferences {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            generate_summaries: config.summaries,
            generate_readme: config.readme,
            visualize_structure: config.visualize,
            analyze_project: config.analyze,
        }
    }
}

// =============================================================================
// Stage outputs
// =============================================================================

/// Fetched repository content
#[derive(Debug, Clone)]
pub enum SourceTree {
    Disk(PathBuf),
    Memory(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub language: Language,
    pub summary: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub summary: String,
    pub purpose: String,
    pub functions: Vec<String>,
    pub key_details: Vec<String>,
    pub language: Language,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub detailed_analysis: BTreeMap<String, FileAnalysis>,
    /// Files that were analyzed
    pub file_count: usize,
    /// Files in the parse result
    pub total_files: usize,
    /// Sorted, stylesheets excluded
    pub languages: Vec<Language>,
}

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Fetch,
    Parse,
    Summarize,
    Readme,
    Visualize,
    Analyze,
    Output,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Summarize => "summarize",
            Self::Readme => "readme",
            Self::Visualize => "visualize",
            Self::Analyze => "analyze",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
pub struct GenerationState {
    pub request_id: Uuid,
    pub input: InputDescriptor,
    pub preferences: Preferences,
    pub sources: Option<SourceTree>,
    pub parse_result: Option<ParseResult>,
    pub summaries: BTreeMap<String, FileSummary>,
    pub readme: String,
    pub diagrams: BTreeMap<String, String>,
    pub project_analysis: Option<ProjectAnalysis>,
    /// Sorted folders (trailing `/`) and files
    pub file_tree: Vec<String>,
    pub completed: Vec<StageKind>,
}

impl GenerationState {
    pub fn new(input: InputDescriptor, preferences: Preferences) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            input,
            preferences,
            sources: None,
            parse_result: None,
            summaries: BTreeMap::new(),
            readme: String::new(),
            diagrams: BTreeMap::new(),
            project_analysis: None,
            file_tree: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Parse output, or a stage error naming who needed it
    pub fn parsed(&self, stage: StageKind) -> Result<&ParseResult> {
        self.parse_result
            .as_ref()
            .ok_or_else(|| ScribeError::stage(stage.as_str(), "parse result missing"))
    }

    /// Store a file summary, replacing any earlier one for the same path
    pub fn record_summary(&mut self, path: impl Into<String>, summary: FileSummary) {
        self.summaries.insert(path.into(), summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_aliases() {
        for (raw, kind) in [
            ("github", InputKind::Github),
            ("Repo", InputKind::Github),
            ("url", InputKind::Github),
            ("zip", InputKind::Zip),
            ("upload", InputKind::Upload),
            ("dir", InputKind::Local),
            ("path", InputKind::Local),
        ] {
            assert_eq!(raw.parse::<InputKind>().unwrap(), kind);
        }
        assert!(matches!(
            "svn".parse::<InputKind>(),
            Err(ScribeError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            InputDescriptor::github("https://github.com/acme/widgets.git", None).display_name(),
            "widgets"
        );
        assert_eq!(
            InputDescriptor::github("git@github.com:acme/tool", None).display_name(),
            "tool"
        );
        assert_eq!(InputDescriptor::upload(BTreeMap::new()).display_name(), "Repository");
        assert_eq!(InputDescriptor::local("/srv/app").display_name(), "app");
    }

    #[test]
    fn test_payload_debug_hides_bytes() {
        let debug = format!("{:?}", InputPayload::Archive(vec![1, 2, 3]));
        assert_eq!(debug, "Archive(3 bytes)");
    }

    #[test]
    fn test_preferences_from_config() {
        let prefs = Preferences::default();
        assert!(prefs.generate_summaries && prefs.generate_readme && prefs.visualize_structure);
        assert!(!prefs.analyze_project);
    }

    #[test]
    fn test_record_summary_replaces() {
        let mut state = GenerationState::new(
            InputDescriptor::upload(BTreeMap::new()),
            Preferences::default(),
        );
        let summary = |text: &str| FileSummary {
            language: Language::Python,
            summary: text.to_string(),
            symbols: vec![],
        };
        state.record_summary("a.py", summary("first"));
        state.record_summary("a.py", summary("second"));
        assert_eq!(state.summaries.len(), 1);
        assert_eq!(state.summaries["a.py"].summary, "second");
        assert!(state.parsed(StageKind::Summarize).is_err());
    }
}
