//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (<config_dir>/reposcribe/config.toml)
//! 3. Project config (.reposcribe/config.toml)
//! 4. Environment variables (REPOSCRIBE_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, ScribeError};

const PROJECT_DIR: &str = ".reposcribe";
const CONFIG_FILE: &str = "config.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the current directory:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `root` as the project directory
    pub fn load_from(root: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = root.join(Self::project_config_path());
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g., REPOSCRIBE_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("REPOSCRIBE_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ScribeError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ScribeError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (`$XDG_CONFIG_HOME/reposcribe` on Linux)
    pub fn global_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("reposcribe"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Project config file, relative to the project root
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_DIR).join(CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| ScribeError::Config(e.to_string()))
        }
    }

    /// Write a default project config under `root`. Returns the file path.
    pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
        let dir = root.join(PROJECT_DIR);
        fs::create_dir_all(&dir)?;

        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_project_config() -> String {
        r#"# reposcribe project configuration
# Overrides the global config; REPOSCRIBE_* environment variables override this file.

version = "1.0"

[llm]
provider = "openai"
model = "gpt-4o-mini"
timeout_secs = 300
temperature = 0.2

[retry]
max_attempts = 5
base_delay_ms = 2000
max_delay_secs = 60

[analysis]
exclude = []
max_file_size = 1048576
respect_gitignore = false

[pipeline]
concurrency = 1
summaries = true
readme = true
visualize = true
analyze = false
"#
        .to_string()
    }
}
