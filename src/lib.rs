//! reposcribe - LLM-driven repository documentation
//!
//! Parses a repository with tree-sitter, then asks an LLM for per-file
//! summaries, a README and an architecture diagram.
//!
//! ## Pipeline
//!
//! ```text
//! Fetch → Parse → Summarize → README → Visualize → Analyze → Output
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use reposcribe::{CancellationToken, Config, GenerationState, InputDescriptor, Pipeline, Preferences};
//!
//! let config = Config::default();
//! let pipeline = Pipeline::from_config(&config, CancellationToken::new())?;
//! let state = GenerationState::new(InputDescriptor::github("owner/repo", None), Preferences::default());
//! let result = pipeline.run(state).await?;
//! println!("{}", result.readme);
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: language classification, exclusion rules, symbol extraction, walking
//! - [`ai`]: LLM providers, retry policy, prompts and response cleanup
//! - [`source`]: GitHub fetching and ZIP decoding
//! - [`pipeline`]: generation state and the stage sequence
//! - [`config`]: layered configuration

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod source;
pub mod types;

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, LlmError, Result, ScribeError, SourceError};

// Pipeline
pub use pipeline::{
    CancellationToken, GenerationResult, GenerationState, InputDescriptor, InputKind, Pipeline,
    Preferences, Stage, StageContext, StageKind,
};

// AI
pub use ai::{LlmClient, LlmProvider, LlmResponse, OfflineProvider, RetryPolicy, TimeoutConfig};

// Analyzer
pub use analyzer::{FileRecord, Language, ParseResult, RepositoryWalker, SymbolExtractor};

// Source
pub use source::{GithubSource, RemoteSource, decode_zip};
