pub mod error;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, ScribeError, SourceError};
