//! Repository walker: turns a directory or an in-memory file map into a
//! [`ParseResult`].
//!
//! Both modes share one shape: select candidates (exclusion, classification,
//! decoding), then run the extractor over each candidate. Extraction may fan
//! out over blocking workers; records land in an ordered map either way.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use super::exclusion::{ExclusionFilter, is_virtual_env};
use crate::analyzer::parser::{Language, SymbolExtractor};
use crate::analyzer::record::{FileRecord, ParseResult};
use crate::config::AnalysisConfig;
use crate::constants::analysis;
use crate::types::{Result, ScribeError};

/// A file that passed selection and awaits extraction
struct Candidate {
    path: String,
    language: Language,
    source: String,
}

#[derive(Debug, Clone)]
pub struct RepositoryWalker {
    filter: ExclusionFilter,
    max_file_size: u64,
    respect_gitignore: bool,
    concurrency: usize,
}

impl Default for RepositoryWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryWalker {
    pub fn new() -> Self {
        Self {
            filter: ExclusionFilter::new(),
            max_file_size: analysis::MAX_FILE_SIZE,
            respect_gitignore: false,
            concurrency: 1,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            filter: ExclusionFilter::new().with_patterns(&config.exclude)?,
            max_file_size: config.max_file_size,
            respect_gitignore: config.respect_gitignore,
            concurrency: config.parse_concurrency.max(1),
        })
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Largest file, in bytes, any input mode accepts
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    // =========================================================================
    // Disk mode
    // =========================================================================

    /// Walk a directory on disk and extract every selected file
    pub fn walk_dir(&self, root: &Path) -> Result<ParseResult> {
        let (mut result, candidates) = self.collect_dir(root)?;
        for candidate in candidates {
            apply(&mut result, extract(candidate));
        }
        finish(&mut result);
        Ok(result)
    }

    /// [`walk_dir`](Self::walk_dir) with extraction on blocking workers
    pub async fn walk_dir_async(&self, root: &Path) -> Result<ParseResult> {
        let walker = self.clone();
        let root = root.to_path_buf();
        let (mut result, candidates) =
            tokio::task::spawn_blocking(move || walker.collect_dir(&root))
                .await
                .map_err(|e| ScribeError::stage("parse", e.to_string()))??;
        self.extract_concurrently(&mut result, candidates).await;
        finish(&mut result);
        Ok(result)
    }

    /// Walk several roots, keyed by directory name. A root whose name is
    /// already taken is keyed by its full path instead.
    pub fn walk_roots(&self, roots: &[PathBuf]) -> Result<BTreeMap<String, ParseResult>> {
        let mut results = BTreeMap::new();
        for root in roots {
            let mut parsed = self.walk_dir(root)?;
            if results.contains_key(&parsed.root) {
                parsed.root = root.display().to_string();
            }
            results.insert(parsed.root.clone(), parsed);
        }
        Ok(results)
    }

    fn collect_dir(&self, root: &Path) -> Result<(ParseResult, Vec<Candidate>)> {
        if !root.is_dir() {
            return Err(ScribeError::MissingContent(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut result = ParseResult::new(root_name(root));
        let mut candidates = Vec::new();

        let prune = self.filter.clone();
        let prune_root = root.to_path_buf();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .require_git(false)
            .ignore(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if prune.is_excluded_dir(&name) {
                    return false;
                }
                if relative_path(&prune_root, entry.path())
                    .is_some_and(|rel| prune.is_excluded_user_dir(&rel))
                {
                    debug!("Skipping excluded directory: {}", entry.path().display());
                    return false;
                }
                if is_virtual_env(entry.path()) {
                    debug!("Skipping virtual environment: {}", entry.path().display());
                    return false;
                }
                true
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Some(rel) = relative_path(root, entry.path()) else {
                continue;
            };
            if self.filter.is_excluded(&rel) {
                continue;
            }
            let Some(language) = Language::classify(&rel) else {
                continue;
            };

            match entry.metadata() {
                Ok(meta) if meta.len() > self.max_file_size => {
                    debug!("Skipping {} ({} bytes over limit)", rel, meta.len());
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Cannot stat {}: {}", rel, e);
                    result.record_failure(&rel, e.to_string());
                    continue;
                }
            }

            let bytes = match std::fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Error reading {}: {}", rel, e);
                    result.record_failure(&rel, e.to_string());
                    continue;
                }
            };
            match String::from_utf8(bytes) {
                Ok(source) => candidates.push(Candidate {
                    path: rel,
                    language,
                    source,
                }),
                Err(e) => {
                    warn!("Skipping {}: not valid UTF-8", rel);
                    result.record_failure(&rel, format!("invalid UTF-8: {}", e.utf8_error()));
                }
            }
        }

        info!(
            "Selected {} files under {} ({} failures)",
            candidates.len(),
            root.display(),
            result.failures.len()
        );
        Ok((result, candidates))
    }

    // =========================================================================
    // In-memory mode
    // =========================================================================

    /// Parse a flat path → content map
    pub fn walk_memory(&self, files: &BTreeMap<String, String>) -> ParseResult {
        let mut result = ParseResult::new(analysis::DEFAULT_ROOT);
        for candidate in self.collect_memory(files) {
            apply(&mut result, extract(candidate));
        }
        finish(&mut result);
        result
    }

    /// [`walk_memory`](Self::walk_memory) with extraction on blocking workers
    pub async fn walk_memory_async(&self, files: &BTreeMap<String, String>) -> ParseResult {
        let mut result = ParseResult::new(analysis::DEFAULT_ROOT);
        let candidates = self.collect_memory(files);
        self.extract_concurrently(&mut result, candidates).await;
        finish(&mut result);
        result
    }

    fn collect_memory(&self, files: &BTreeMap<String, String>) -> Vec<Candidate> {
        files
            .iter()
            .filter_map(|(path, content)| {
                let path = normalize(path);
                if path.is_empty() || self.filter.is_excluded(&path) {
                    return None;
                }
                let language = Language::classify(&path)?;
                Some(Candidate {
                    path,
                    language,
                    source: content.clone(),
                })
            })
            .collect()
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    async fn extract_concurrently(&self, result: &mut ParseResult, candidates: Vec<Candidate>) {
        let outcomes: Vec<_> = stream::iter(candidates)
            .map(|candidate| tokio::task::spawn_blocking(move || extract(candidate)))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Ok(outcome) => apply(result, outcome),
                Err(e) => warn!("Extraction worker failed: {}", e),
            }
        }
    }
}

type Outcome = std::result::Result<FileRecord, (String, String)>;

fn extract(candidate: Candidate) -> Outcome {
    match SymbolExtractor::extract(&candidate.source, candidate.language) {
        Ok(extraction) => Ok(FileRecord {
            path: candidate.path,
            language: candidate.language,
            cleaned_code: extraction.cleaned_code,
            symbols: extraction.symbols,
        }),
        Err(e) => Err((candidate.path, e.to_string())),
    }
}

fn apply(result: &mut ParseResult, outcome: Outcome) {
    match outcome {
        Ok(record) => result.insert(record),
        Err((path, reason)) => {
            warn!("Failed to parse {}: {}", path, reason);
            result.record_failure(path, reason);
        }
    }
}

/// Failures arrive in completion order; sort for stable output
fn finish(result: &mut ParseResult) {
    result.failures.sort_by(|a, b| a.path.cmp(&b.path));
}

fn root_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| root.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| analysis::DEFAULT_ROOT.to_string())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_walk_memory_filters() {
        let map = files(&[
            ("a.py", "def a():\n    pass\n"),
            ("a.min.js", "var x=1;"),
            ("node_modules/x.js", "function x() {}"),
        ]);
        let result = RepositoryWalker::new().walk_memory(&map);
        assert_eq!(result.root, "repo");
        assert_eq!(result.files.keys().collect::<Vec<_>>(), vec!["a.py"]);
        assert_eq!(result.files["a.py"].symbols, vec!["a"]);
    }

    #[test]
    fn test_walk_memory_skips_unclassified_and_docs() {
        let map = files(&[
            ("main.py", "print('hi')\n"),
            ("README.md", "# Title"),
            ("notes.txt", "todo"),
            ("./src/util.go", "package util\n\nfunc Add() {}\n"),
        ]);
        let result = RepositoryWalker::new().walk_memory(&map);
        assert_eq!(
            result.files.keys().collect::<Vec<_>>(),
            vec!["main.py", "src/util.go"]
        );
    }

    #[tokio::test]
    async fn test_walk_memory_async_matches_sequential() {
        let map = files(&[
            ("a.py", "def a():\n    pass\n"),
            ("b.js", "// x\nfunction b() {}\n"),
            ("c/d.rs", "fn d() {}\n"),
            ("e.c", "int e(void) { return 0; }\n"),
        ]);
        let walker = RepositoryWalker::new().with_concurrency(4);
        let sequential = walker.walk_memory(&map);
        let parallel = walker.walk_memory_async(&map).await;
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_walk_dir_prunes_and_records_failures() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/app.py"), "# c\nclass App:\n    pass\n").unwrap();
        fs::write(root.join("src/README.md"), "docs").unwrap();

        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "function p() {}").unwrap();

        fs::create_dir_all(root.join("sandbox/lib")).unwrap();
        fs::write(root.join("sandbox/pyvenv.cfg"), "home = /usr").unwrap();
        fs::write(root.join("sandbox/lib/site.py"), "def s():\n    pass\n").unwrap();

        fs::write(root.join("broken.py"), [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let result = RepositoryWalker::new().walk_dir(root).unwrap();

        assert_eq!(result.files.keys().collect::<Vec<_>>(), vec!["src/app.py"]);
        assert_eq!(result.files["src/app.py"].symbols, vec!["App"]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, "broken.py");
    }

    #[test]
    fn test_walk_dir_size_limit() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("big.py"), "x = 1\n".repeat(100)).unwrap();
        fs::write(temp.path().join("small.py"), "x = 1\n").unwrap();

        let result = RepositoryWalker::new()
            .with_max_file_size(64)
            .walk_dir(temp.path())
            .unwrap();
        assert_eq!(result.files.keys().collect::<Vec<_>>(), vec!["small.py"]);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_walk_dir_gitignore_toggle() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "secret.py\n").unwrap();
        fs::write(temp.path().join("secret.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("open.py"), "y = 2\n").unwrap();

        let all = RepositoryWalker::new().walk_dir(temp.path()).unwrap();
        assert_eq!(all.len(), 2);

        let ignored = RepositoryWalker::new()
            .with_gitignore(true)
            .walk_dir(temp.path())
            .unwrap();
        assert_eq!(ignored.files.keys().collect::<Vec<_>>(), vec!["open.py"]);
    }

    #[test]
    fn test_walk_dir_prunes_user_excluded_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("fixtures/deep")).unwrap();
        fs::write(root.join("fixtures/deep/sample.py"), "x = 1\n").unwrap();
        fs::create_dir_all(root.join("tools/gen")).unwrap();
        fs::write(root.join("tools/gen/out.py"), "y = 2\n").unwrap();
        fs::write(root.join("tools/keep.py"), "z = 3\n").unwrap();
        fs::write(root.join("main.py"), "print('hi')\n").unwrap();

        let config = AnalysisConfig {
            exclude: vec!["fixtures".to_string(), "tools/gen".to_string()],
            ..AnalysisConfig::default()
        };
        let walker = RepositoryWalker::from_config(&config).unwrap();
        let result = walker.walk_dir(root).unwrap();
        assert_eq!(
            result.files.keys().collect::<Vec<_>>(),
            vec!["main.py", "tools/keep.py"]
        );

        let memory = walker.walk_memory(&files(&[
            ("fixtures/deep/sample.py", "x = 1\n"),
            ("main.py", "print('hi')\n"),
        ]));
        assert_eq!(memory.files.keys().collect::<Vec<_>>(), vec!["main.py"]);
    }

    #[tokio::test]
    async fn test_walk_dir_async() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.go"), "package a\n\nfunc A() {}\n").unwrap();
        fs::write(temp.path().join("b.go"), "package a\n\nfunc B() {}\n").unwrap();

        let walker = RepositoryWalker::new().with_concurrency(2);
        let result = walker.walk_dir_async(temp.path()).await.unwrap();
        assert_eq!(result, walker.walk_dir(temp.path()).unwrap());
    }

    #[test]
    fn test_walk_roots_keys_by_name() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        fs::write(one.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(two.path().join("b.py"), "y = 2\n").unwrap();

        let roots = [one.path().to_path_buf(), two.path().to_path_buf()];
        let results = RepositoryWalker::new().walk_roots(&roots).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.values().map(|r| r.len()).sum::<usize>(), 2);

        let twice = RepositoryWalker::new()
            .walk_roots(&[one.path().to_path_buf(), one.path().to_path_buf()])
            .unwrap();
        assert_eq!(twice.len(), 2);
        assert!(twice.contains_key(&one.path().display().to_string()));
    }

    #[test]
    fn test_walk_dir_missing_root() {
        let err = RepositoryWalker::new()
            .walk_dir(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, ScribeError::MissingContent(_)));
    }
}
