//! Config Command
//!
//! Usage:
//!   reposcribe config show [--format toml|json]
//!   reposcribe config path
//!   reposcribe config init [--force]

use super::ReportFormat;
use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::{Result, ScribeError};

/// Print the merged effective configuration
pub fn show(format: ReportFormat) -> Result<()> {
    let config = ConfigLoader::load()?;
    let as_json = match format {
        ReportFormat::Toml => false,
        ReportFormat::Json => true,
        other => {
            return Err(ScribeError::Config(format!(
                "config show supports toml or json, not {}",
                other
            )));
        }
    };
    println!("{}", ConfigLoader::render(&config, as_json)?);
    Ok(())
}

/// Print where configuration is read from
pub fn path(output: &Output) -> Result<()> {
    output.header("Configuration files");
    match ConfigLoader::global_config_path() {
        Some(global) => output.field(
            "Global",
            format!("{}{}", global.display(), missing_marker(global.exists())),
        ),
        None => output.field("Global", "(no config directory on this platform)"),
    }
    let project = ConfigLoader::project_config_path();
    output.field(
        "Project",
        format!("{}{}", project.display(), missing_marker(project.exists())),
    );
    output.field("Env", "REPOSCRIBE_<SECTION>_<KEY>");
    Ok(())
}

fn missing_marker(exists: bool) -> &'static str {
    if exists { "" } else { " (not found)" }
}

/// Write `.reposcribe/config.toml` in the current directory
pub fn init(force: bool, output: &Output) -> Result<()> {
    let root = std::env::current_dir()?;
    let path = ConfigLoader::init_project(&root, force)?;
    output.success("Initialized project configuration");
    output.field("Config", path.display());
    Ok(())
}
