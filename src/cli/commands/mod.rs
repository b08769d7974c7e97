//! Subcommand handlers.
//!
//! - `generate`: run the pipeline and write the artifacts
//! - `parse`: parse a local directory and print the records
//! - `config`: show, locate or initialize configuration

pub mod config;
pub mod generate;
pub mod parse;

use std::fmt;
use std::str::FromStr;

use crate::types::ScribeError;

/// Serialization format for printed or written reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Yaml,
    Markdown,
    Toml,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "md",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
            Self::Toml => "toml",
        })
    }
}

impl FromStr for ReportFormat {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "markdown" | "md" => Ok(Self::Markdown),
            "toml" => Ok(Self::Toml),
            other => Err(ScribeError::Config(format!(
                "Invalid format '{}'. Valid values: json, yaml, markdown, toml",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("yml".parse::<ReportFormat>().unwrap(), ReportFormat::Yaml);
        assert_eq!("md".parse::<ReportFormat>().unwrap().extension(), "md");
        assert!("xml".parse::<ReportFormat>().is_err());
    }
}
