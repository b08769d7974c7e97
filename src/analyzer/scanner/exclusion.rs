//! Path exclusion rules shared by the disk and in-memory walkers.
//!
//! A path is dropped when any segment is an excluded directory, when its file
//! name is on the excluded list, or when its file name matches an excluded glob.

use std::path::Path;

use glob::Pattern;

use crate::types::{Result, ScribeError};

/// Directory names never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules", "venv", ".venv", "env", ".env", ".git", ".idea", ".vscode",
    "__pycache__", "dist", "build", ".next", "out", ".parcel-cache", "coverage",
    "logs", "tmp", "temp", "target", ".ipynb_checkpoints", "mlruns", "wandb",
    "lightning_logs", "checkpoints", "runs", ".dvc", ".mlflow", ".mlem",
];

/// Exact file names: lockfiles, tool configs, CI manifests, docs, env files
pub const EXCLUDED_FILES: &[&str] = &[
    // js packaging and bundlers
    "package.json", "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "bun.lockb",
    "vite.config.ts", "vite.config.js", "webpack.config.js", "rollup.config.js",
    "esbuild.config.js", "snowpack.config.js", "metro.config.js", "vite-env.d.ts",
    "tsconfig.json", "tsconfig.app.json", "tsconfig.node.json", "tsconfig.base.json",
    // linters and formatters
    "tslint.json", "eslint.config.js", ".eslintrc.js", ".eslintrc.json", ".prettierrc",
    ".prettierrc.js", ".prettierrc.json", ".stylelintrc", ".stylelintrc.json",
    "stylelint.config.js", "tailwind.config.js", "postcss.config.js", "babel.config.js",
    ".babelrc", ".babelrc.js",
    // static site boilerplate
    "index.html", "favicon.ico", "robots.txt", "sitemap.xml",
    // repo housekeeping
    ".editorconfig", ".gitignore", ".gitattributes", ".npmrc", ".nvmrc", ".dockerignore",
    ".env", ".env.local", ".env.development", ".env.production", ".env.test",
    // test runners
    "jest.config.js", "jest.config.ts", "karma.conf.js", "mocha.opts", "vitest.config.ts",
    "cypress.config.js", "cypress.json", ".coveragerc", "tox.ini", "pytest.ini", "setup.cfg",
    // deploy and CI
    "vercel.json", "netlify.toml", "now.json", "firebase.json", "azure-pipelines.yml",
    "Procfile", "Makefile", "Dockerfile", "docker-compose.yml", ".travis.yml",
    ".gitlab-ci.yml",
    // docs and legal
    "README.md", "README", "CONTRIBUTING.md", "CHANGELOG.md", "CODEOWNERS", "LICENSE",
    "LICENSE.md", "SECURITY.md", "SUPPORT.md", "NOTICE", "AUTHORS",
    // python packaging and tooling
    "requirements.txt", "Pipfile", "Pipfile.lock", "pyproject.toml", "setup.py",
    "MANIFEST.in", "environment.yml", "conda.yml", ".python-version", ".pylintrc",
    "mypy.ini", "pyrightconfig.json", ".flake8", ".isort.cfg", "poetry.lock", "poetry.toml",
    // ml experiment artifacts
    "dvc.yaml", "dvc.lock", "output.log", "tensorboard.log",
    // logs and snapshots
    "yarn-error.log", "npm-debug.log", "snapshot.txt",
    // infrastructure
    "terraform.tf", "terraform.tfvars", "cloudbuild.yaml", ".helmignore", "Chart.yaml",
    "values.yaml", "kustomization.yaml", "skaffold.yaml",
    // os noise
    ".DS_Store", "Thumbs.db", "desktop.ini",
];

/// Multi-segment paths excluded by suffix
const EXCLUDED_PATH_SUFFIXES: &[&str] = &[".circleci/config.yml", ".github/workflows/main.yml"];

/// Glob patterns matched against the file name
pub const EXCLUDED_PATTERNS: &[&str] = &[
    "*.ipynb",
    "events.out.tfevents.*",
    "*.tfstate",
    "*.tfstate.backup",
    "*.min.js",
    "*.min.css",
    "*.bundle.js",
];

/// Child names that mark a directory as a Python virtual environment
const VENV_MARKERS: &[&str] = &["bin", "lib", "pyvenv.cfg", "Scripts", "Include"];

/// Compiled exclusion rules
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    builtin: Vec<Pattern>,
    extra: Vec<Pattern>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionFilter {
    pub fn new() -> Self {
        let builtin = EXCLUDED_PATTERNS
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        Self {
            builtin,
            extra: Vec::new(),
        }
    }

    /// Add user patterns (`analysis.exclude`). Each is matched against both the
    /// relative path and the bare file name.
    pub fn with_patterns(mut self, patterns: &[String]) -> Result<Self> {
        for raw in patterns {
            let pattern = Pattern::new(raw).map_err(|e| {
                ScribeError::Config(format!("Invalid exclude pattern '{}': {}", raw, e))
            })?;
            self.extra.push(pattern);
        }
        Ok(self)
    }

    /// Directory-only check, used to prune before descending
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        EXCLUDED_DIRS.contains(&name)
    }

    /// User-pattern check for a `/`-separated relative directory path, matched
    /// against both the path and its last segment
    pub fn is_excluded_user_dir(&self, rel: &str) -> bool {
        let name = rel.rsplit('/').next().unwrap_or(rel);
        self.extra
            .iter()
            .any(|p| p.matches(name) || p.matches(rel))
    }

    /// File-name check: exact list plus glob patterns
    pub fn is_excluded_file(&self, name: &str) -> bool {
        EXCLUDED_FILES.contains(&name)
            || self.builtin.iter().any(|p| p.matches(name))
            || self.extra.iter().any(|p| p.matches(name))
    }

    /// Full check for a `/`-separated relative path
    pub fn is_excluded(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);

        normalized
            .split('/')
            .any(|segment| self.is_excluded_dir(segment))
            || self.is_excluded_file(file_name)
            || EXCLUDED_PATH_SUFFIXES
                .iter()
                .any(|suffix| normalized.ends_with(suffix))
            || self.extra.iter().any(|p| p.matches(&normalized))
            || normalized
                .match_indices('/')
                .any(|(i, _)| self.is_excluded_user_dir(&normalized[..i]))
    }
}

/// A directory is treated as a virtual environment when any immediate child
/// carries a venv marker name. Unreadable directories are not.
pub fn is_virtual_env(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(|e| e.ok())
        .any(|entry| VENV_MARKERS.iter().any(|m| entry.file_name() == *m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_excluded_directory_segment() {
        let filter = ExclusionFilter::new();
        assert!(filter.is_excluded("node_modules/foo/index.js"));
        assert!(filter.is_excluded("app/.git/hooks/pre-commit.sh"));
        assert!(!filter.is_excluded("src/app/index.js"));
    }

    #[test]
    fn test_excluded_filename_anywhere() {
        let filter = ExclusionFilter::new();
        assert!(filter.is_excluded("package-lock.json"));
        assert!(filter.is_excluded("web/client/package-lock.json"));
        assert!(filter.is_excluded("docs/README.md"));
        assert!(filter.is_excluded("public/index.html"));
        assert!(!filter.is_excluded("public/about.html"));
    }

    #[test]
    fn test_excluded_patterns() {
        let filter = ExclusionFilter::new();
        assert!(filter.is_excluded("static/app.min.js"));
        assert!(filter.is_excluded("static/site.min.css"));
        assert!(filter.is_excluded("notebooks/explore.ipynb"));
        assert!(filter.is_excluded("logs2/events.out.tfevents.1234"));
        assert!(filter.is_excluded("infra/prod.tfstate.backup"));
        assert!(!filter.is_excluded("static/app.js"));
    }

    #[test]
    fn test_path_suffixes() {
        let filter = ExclusionFilter::new();
        assert!(filter.is_excluded(".circleci/config.yml"));
        assert!(!filter.is_excluded("config.yml"));
    }

    #[test]
    fn test_user_patterns() {
        let filter = ExclusionFilter::new()
            .with_patterns(&["generated/**".to_string(), "*_pb2.py".to_string()])
            .unwrap();
        assert!(filter.is_excluded("generated/api/client.ts"));
        assert!(filter.is_excluded("proto/user_pb2.py"));
        assert!(!filter.is_excluded("proto/user.py"));

        assert!(
            ExclusionFilter::new()
                .with_patterns(&["[bad".to_string()])
                .is_err()
        );
    }

    #[test]
    fn test_virtual_env_detection() {
        let temp = TempDir::new().unwrap();
        let venv = temp.path().join("myenv");
        std::fs::create_dir_all(venv.join("lib")).unwrap();
        std::fs::write(venv.join("pyvenv.cfg"), "home = /usr").unwrap();

        let plain = temp.path().join("pkg");
        std::fs::create_dir_all(&plain).unwrap();
        std::fs::write(plain.join("mod.py"), "x = 1").unwrap();

        assert!(is_virtual_env(&venv));
        assert!(!is_virtual_env(&plain));
        assert!(!is_virtual_env(&temp.path().join("missing")));
    }
}
