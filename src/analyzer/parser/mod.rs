//! Language Parser Module
//!
//! Tree-sitter based classification and extraction for multiple languages.
//!
//! ```rust,ignore
//! use reposcribe::analyzer::parser::{Language, SymbolExtractor};
//!
//! let language = Language::classify("app.py").unwrap();
//! let out = SymbolExtractor::extract(source, language)?;
//! println!("{:?}", out.symbols);
//! ```

pub mod extractor;
pub mod grammar;
pub mod language;

pub use extractor::{Extraction, SymbolExtractor};
pub use grammar::{create_ts_parser, get_node_text};
pub use language::Language;
