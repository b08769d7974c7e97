//! Parse output records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parser::Language;

/// One parsed source file. Created once during parsing and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repository-relative, `/`-separated path
    pub path: String,
    pub language: Language,
    /// Source with comments removed
    pub cleaned_code: String,
    /// Declared names in discovery order
    pub symbols: Vec<String>,
}

/// A file that was selected for parsing but could not be read or parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Every parsed file under one logical root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Directory name for disk walks, `repo` for in-memory walks
    pub root: String,
    pub files: BTreeMap<String, FileRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
}

impl ParseResult {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn insert(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    pub fn record_failure(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(FileFailure {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Distinct languages present, sorted
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.files.values().map(|r| r.language).collect();
        langs.sort();
        langs.dedup();
        langs
    }
}
