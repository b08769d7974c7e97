//! Code Analyzer Module
//!
//! Provides language-agnostic source analysis:
//! - Language classification and tree-sitter extraction
//! - Repository walking with exclusion rules (disk or in-memory)

pub mod parser;
pub mod record;
pub mod scanner;

pub use parser::{Extraction, Language, SymbolExtractor};
pub use record::{FileFailure, FileRecord, ParseResult};
pub use scanner::{ExclusionFilter, RepositoryWalker};
