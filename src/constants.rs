//! Global Constants
//!
//! Centralized constants for parsing, chunking and retry tuning.
//! All magic numbers should be defined here with documentation.

/// Retry/backoff constants applied to every LLM call
pub mod retry {
    /// Maximum attempts per LLM call (first try included)
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 2_000;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 60;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Chunking constants for bounded-context prompts
pub mod chunking {
    /// Lines per summarization window
    pub const CHUNK_LINES: usize = 300;

    /// Lines shared between consecutive windows
    pub const CHUNK_OVERLAP: usize = 10;

    /// Character budget per README partial-summary group
    pub const README_CHUNK_CHARS: usize = 6_000;

    /// Code prefix sent to the analysis prompt (characters)
    pub const ANALYSIS_CODE_CHARS: usize = 4_000;

    /// Symbols listed in the analysis prompt
    pub const ANALYSIS_SYMBOL_LIMIT: usize = 10;
}

/// File analysis constants
pub mod analysis {
    /// Maximum file size to parse (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Minimum trimmed code length for the analyze stage
    pub const MIN_ANALYSIS_CODE_CHARS: usize = 50;

    /// Root key used for in-memory parse results
    pub const DEFAULT_ROOT: &str = "repo";
}

/// Pipeline output keys and placeholders
pub mod output {
    /// Key under which the architecture diagram is stored
    pub const DIAGRAM_KEY: &str = "folder_structure_mermaid";

    /// Placeholder summary for files whose chunks produced no text
    pub const NO_SUMMARY: &str = "No summary available.";

    /// Placeholder purpose when the analysis response has none
    pub const DEFAULT_PURPOSE: &str = "This file is part of the application codebase.";

    /// Summary recorded for a file whose analysis failed
    pub const ANALYSIS_FAILED: &str = "Analysis failed";

    /// README content shown to the diagram prompt when none was generated
    pub const NO_README: &str = "No README available";
}

/// Remote source constants
pub mod source {
    /// Default GitHub REST API base
    pub const GITHUB_API_BASE: &str = "https://api.github.com";

    /// Blobs larger than this are skipped (bytes)
    pub const MAX_BLOB_SIZE: u64 = 1_000_000;

    /// Branches tried when the requested default branch is missing
    pub const FALLBACK_BRANCHES: &[&str] = &["main", "master", "develop"];
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Timeout for remote source requests (seconds)
    pub const SOURCE_TIMEOUT_SECS: u64 = 60;
}
