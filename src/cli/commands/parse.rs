//! Parse Command
//!
//! Walks local directories with the configured exclusion rules and prints the
//! per-file language and symbols. Several paths print one report per root,
//! keyed by root name.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::ReportFormat;
use crate::analyzer::{FileFailure, Language, ParseResult, RepositoryWalker};
use crate::config::ConfigLoader;
use crate::types::{Result, ScribeError};

#[derive(Debug, Serialize)]
struct ParsedFile<'a> {
    path: &'a str,
    language: Language,
    lines: usize,
    symbols: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    cleaned_code: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ParseReport<'a> {
    root: &'a str,
    files: Vec<ParsedFile<'a>>,
    #[serde(skip_serializing_if = "no_failures")]
    failures: &'a [FileFailure],
}

fn no_failures(failures: &&[FileFailure]) -> bool {
    failures.is_empty()
}

pub fn run(paths: &[PathBuf], format: ReportFormat, with_code: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let walker = RepositoryWalker::from_config(&config.analysis)?;
    let rendered = match paths {
        [path] => render(&walker.walk_dir(path)?, format, with_code)?,
        _ => render_roots(&walker.walk_roots(paths)?, format, with_code)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn report(parsed: &ParseResult, with_code: bool) -> ParseReport<'_> {
    ParseReport {
        root: &parsed.root,
        files: parsed
            .files
            .values()
            .map(|record| ParsedFile {
                path: &record.path,
                language: record.language,
                lines: record.cleaned_code.lines().count(),
                symbols: &record.symbols,
                cleaned_code: with_code.then_some(record.cleaned_code.as_str()),
            })
            .collect(),
        failures: &parsed.failures,
    }
}

fn render(parsed: &ParseResult, format: ReportFormat, with_code: bool) -> Result<String> {
    serialize(&report(parsed, with_code), format)
}

fn render_roots(
    roots: &BTreeMap<String, ParseResult>,
    format: ReportFormat,
    with_code: bool,
) -> Result<String> {
    let reports: BTreeMap<&str, ParseReport<'_>> = roots
        .iter()
        .map(|(key, parsed)| (key.as_str(), report(parsed, with_code)))
        .collect();
    serialize(&reports, format)
}

fn serialize<T: Serialize>(value: &T, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        ReportFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        other => Err(ScribeError::Config(format!(
            "parse supports json or yaml, not {}",
            other
        ))),
    }
}
