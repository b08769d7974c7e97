//! Prompt construction for every LLM call the pipeline makes.
//!
//! Long instruction texts live in [`templates`]; the builders here splice in
//! code, summaries, trees and earlier phase outputs.

pub mod templates;

pub use templates::{ARCHITECT_SYSTEM_ROLE, README_SYSTEM_ROLE};

use crate::analyzer::Language;
use crate::constants::chunking::{ANALYSIS_CODE_CHARS, ANALYSIS_SYMBOL_LIMIT};

/// System role for summary and analysis calls
pub fn summary_system_role(language: Language) -> String {
    format!(
        "You are a highly skilled senior {} software engineer. Always write precise, technical, \
         and concise output without adding explanations or extra commentary.",
        language.display_name()
    )
}

/// Summary prompt for one chunk of a file
pub fn summary_prompt(language: Language, chunk: &str) -> String {
    format!(
        "Analyze the following {} source file carefully for README documentation purposes. \
         {}\n\n### Code:\n{}",
        language.as_str(),
        templates::SUMMARY_INSTRUCTIONS,
        chunk.trim()
    )
}

/// One file's entry in the README input
pub fn readme_block(path: &str, language: Language, summary: &str, symbols: &[String]) -> String {
    let mut block = format!("#### `{}` ({})\n- Summary: {}", path, language, summary);
    if !symbols.is_empty() {
        block.push_str("\n- Contains: ");
        block.push_str(&symbols.join(", "));
    }
    block
}

/// "Code Summary" partial for one group of README blocks
pub fn partial_readme_prompt(chunk: &str) -> String {
    format!(
        "\n{}\n\n---\n{}\n---\n",
        templates::PARTIAL_INSTRUCTIONS,
        chunk
    )
}

/// Final README prompt over the merged partials
pub fn final_readme_prompt(merged_partials: &str) -> String {
    format!(
        "{}\n\nCODEBASE INFORMATION:\nCode Summaries:\n{}",
        templates::README_INSTRUCTIONS,
        merged_partials
    )
}

/// Diagram phase A
pub fn explanation_prompt(file_tree: &str, readme: &str) -> String {
    format!(
        "{}\n\n<file_tree>\n{}\n</file_tree>\n\n<readme>\n{}\n</readme>",
        templates::EXPLANATION_INSTRUCTIONS,
        file_tree,
        readme
    )
}

/// Diagram phase B
pub fn mapping_prompt(explanation: &str, file_tree: &str) -> String {
    format!(
        "{}\n\n<explanation>\n{}\n</explanation>\n\n<file_tree>\n{}\n</file_tree>",
        templates::MAPPING_INSTRUCTIONS,
        explanation,
        file_tree
    )
}

/// Diagram phase C. `mapping` already carries its `<component_mapping>` tags.
pub fn diagram_prompt(explanation: &str, mapping: &str) -> String {
    format!(
        "{}\n\n<explanation>\n{}\n</explanation>\n\n{}",
        templates::DIAGRAM_INSTRUCTIONS,
        explanation,
        mapping
    )
}

/// Per-file analysis prompt over a bounded code prefix and symbol list
pub fn analysis_prompt(language: Language, code: &str, symbols: &[String]) -> String {
    let code_prefix: String = code.chars().take(ANALYSIS_CODE_CHARS).collect();
    let detected = if symbols.is_empty() {
        "None".to_string()
    } else {
        symbols
            .iter()
            .take(ANALYSIS_SYMBOL_LIMIT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "You are a senior software engineer writing technical documentation.\n\n\
         Analyze this {lang} file.\n\n{}\n\nCode to analyze:\n```{lang}\n{}\n```\n\n\
         Detected functions/classes: {}",
        templates::ANALYSIS_INSTRUCTIONS,
        code_prefix,
        detected,
        lang = language.as_str(),
    )
}
