//! Language Detection Module
//!
//! **Single source of truth** for classifying files by name.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reposcribe::analyzer::parser::Language;
//!
//! assert_eq!(Language::classify("src/main.go"), Some(Language::Go));
//! assert_eq!(Language::classify("notes.txt"), None);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Language Metadata Table - Single Source of Truth
// =============================================================================

/// Language metadata entry containing all language-specific information
struct LanguageMeta {
    /// Display name (human-readable)
    display_name: &'static str,
    /// Lowercase tag used in prompts, records and serialized output
    tag: &'static str,
    /// File suffixes that map to this language (dot included)
    suffixes: &'static [&'static str],
    /// Whether this language has a tree-sitter grammar
    has_grammar: bool,
}

/// Macro to define language metadata concisely
macro_rules! lang_meta {
    ($display:literal, $tag:literal, [$($suffix:literal),*], $grammar:literal) => {
        LanguageMeta {
            display_name: $display,
            tag: $tag,
            suffixes: &[$($suffix),*],
            has_grammar: $grammar,
        }
    };
}

impl Language {
    fn meta(&self) -> LanguageMeta {
        match self {
            Language::Python => lang_meta!("Python", "python", [".py", ".pyi"], true),
            Language::Java => lang_meta!("Java", "java", [".java"], true),
            Language::JavaScript => lang_meta!("JavaScript", "javascript", [".js", ".mjs", ".cjs", ".jsx"], true),
            Language::TypeScript => lang_meta!("TypeScript", "typescript", [".ts", ".mts", ".cts"], true),
            Language::Tsx => lang_meta!("TSX", "tsx", [".tsx"], true),
            Language::Html => lang_meta!("HTML", "html", [".html", ".htm"], true),
            Language::Css => lang_meta!("CSS", "css", [".css"], true),
            Language::C => lang_meta!("C", "c", [".c", ".h"], true),
            Language::Cpp => lang_meta!("C++", "cpp", [".cpp", ".cc", ".cxx", ".hpp", ".hh", ".h"], true),
            Language::Go => lang_meta!("Go", "go", [".go"], true),
            Language::Kotlin => lang_meta!("Kotlin", "kotlin", [".kt", ".kts"], true),
            Language::Rust => lang_meta!("Rust", "rust", [".rs"], true),
            Language::Ruby => lang_meta!("Ruby", "ruby", [".rb"], true),
            Language::Bash => lang_meta!("Bash", "bash", [".sh", ".bash"], true),
            Language::Swift => lang_meta!("Swift", "swift", [".swift"], false),
            Language::Php => lang_meta!("PHP", "php", [".php"], false),
            Language::CSharp => lang_meta!("C#", "csharp", [".cs"], false),
        }
    }
}

// =============================================================================
// Language Enum Definition
// =============================================================================

/// Languages recognized by the classifier.
///
/// Languages without a grammar are still classified; extraction passes their
/// source through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    JavaScript,
    TypeScript,
    Tsx,
    Html,
    Css,
    C,
    Cpp,
    Go,
    Kotlin,
    Rust,
    Ruby,
    Bash,
    Swift,
    Php,
    CSharp,
}

// =============================================================================
// Language Methods (using metadata table)
// =============================================================================

impl Language {
    /// Lowercase tag (`"python"`, `"cpp"`, ...)
    pub fn as_str(&self) -> &'static str {
        self.meta().tag
    }

    /// Display name (human-readable)
    pub fn display_name(&self) -> &'static str {
        self.meta().display_name
    }

    /// Classify a file name or path by suffix.
    ///
    /// The table is scanned in declaration order and the first hit wins, so a
    /// `.h` header is C rather than C++.
    pub fn classify(file_name: &str) -> Option<Language> {
        let lower = file_name.to_lowercase();
        Self::all_variants()
            .iter()
            .copied()
            .find(|lang| lang.meta().suffixes.iter().any(|s| lower.ends_with(s)))
    }

    /// Check if this language has a tree-sitter grammar
    pub fn has_grammar(&self) -> bool {
        self.meta().has_grammar
    }

    /// Stylesheet and markup languages carry no analyzable logic
    pub fn is_markup(&self) -> bool {
        matches!(self, Language::Html | Language::Css)
    }

    /// All variants in classification order
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Python, Language::Java, Language::JavaScript,
            Language::TypeScript, Language::Tsx, Language::Html, Language::Css,
            Language::C, Language::Cpp, Language::Go, Language::Kotlin,
            Language::Rust, Language::Ruby, Language::Bash, Language::Swift,
            Language::Php, Language::CSharp,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all_variants()
            .iter()
            .copied()
            .find(|lang| lang.as_str() == lower)
            .ok_or_else(|| format!("Unknown language: {}", s))
    }
}
