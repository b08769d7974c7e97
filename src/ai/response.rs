//! LLM response cleanup and best-effort parsing.
//!
//! Providers return free text. These helpers strip reasoning blocks and code
//! fences, pull tagged regions out, and split structured replies into fields.
//! None of them fail: malformed input degrades to an empty or whole-text result.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::output::DEFAULT_PURPOSE;

static RE_THINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex"));
static RE_SUMMARY_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w_]+)\s*[:\-–]\s*(.+)").expect("static regex"));

/// Flowchart headers accepted as the start of a diagram, in priority order
const DIAGRAM_STARTS: &[&str] = &[
    "flowchart TD",
    "flowchart LR",
    "flowchart TB",
    "graph TD",
    "graph LR",
];

/// Remove `<think>...</think>` reasoning blocks and trim
pub fn strip_think_tags(text: &str) -> String {
    RE_THINK.replace_all(text, "").trim().to_string()
}

/// Strip reasoning blocks plus one wrapping ```` ```markdown ```` (or bare) fence
pub fn clean_markdown(text: &str) -> String {
    let stripped = strip_think_tags(text);
    let mut body = stripped.as_str();

    if let Some(rest) = body
        .strip_prefix("```markdown")
        .or_else(|| body.strip_prefix("```"))
    {
        body = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.strip_suffix('\n').unwrap_or(rest);
    }

    body.trim().to_string()
}

/// Turn literal `\n` escape sequences into newlines
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Text strictly between the first `open` and the next `close`, trimmed
pub fn extract_between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(text[start..end].trim())
}

/// The first `open ... close` region with both tags kept
pub fn extract_block<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)?;
    let end = text[start..].find(close)? + start + close.len();
    Some(&text[start..end])
}

/// Mermaid source from a diagram reply: reasoning and fences removed, starting
/// at the first recognised flowchart header. Empty when nothing is left.
pub fn extract_mermaid(text: &str) -> String {
    let cleaned = strip_think_tags(text)
        .replace("```mermaid", "")
        .replace("```", "");
    let cleaned = cleaned.trim();

    match DIAGRAM_STARTS.iter().find_map(|start| cleaned.find(start)) {
        Some(idx) => cleaned[idx..].trim().to_string(),
        None => cleaned.to_string(),
    }
}

/// One `- name: description` line from a summary reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryBullet {
    pub symbol: Option<String>,
    pub summary: String,
}

/// Parse dash bullets out of a summary reply.
///
/// Bullets shaped `name: text` (or `name - text`) split into symbol and text;
/// any other bullet keeps its whole content as the text. A reply with no
/// bullets at all becomes one free-text entry.
pub fn parse_summary_bullets(text: &str) -> Vec<SummaryBullet> {
    let text = strip_think_tags(text);

    let bullets: Vec<SummaryBullet> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(|line| line.trim_matches(|c| c == '-' || c == ' '))
        .filter(|line| !line.is_empty())
        .map(|line| match RE_SUMMARY_BULLET.captures(line) {
            Some(caps) => SummaryBullet {
                symbol: Some(caps[1].to_string()),
                summary: caps[2].trim().to_string(),
            },
            None => SummaryBullet {
                symbol: None,
                summary: line.to_string(),
            },
        })
        .collect();

    if bullets.is_empty() && !text.is_empty() {
        return vec![SummaryBullet {
            symbol: None,
            summary: text.split_whitespace().collect::<Vec<_>>().join(" "),
        }];
    }
    bullets
}

/// Sections of a per-file analysis reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSections {
    pub purpose: String,
    pub functions: Vec<String>,
    pub key_details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Purpose,
    Functions,
    Details,
}

fn section_header(line: &str) -> Option<(Section, &str)> {
    let bare = line.trim().trim_matches(|c: char| c == '*' || c == '#' || c.is_whitespace());
    let upper = bare.to_uppercase();
    let section = if upper.starts_with("PURPOSE") {
        Section::Purpose
    } else if upper.starts_with("KEY FUNCTIONS") {
        Section::Functions
    } else if upper.starts_with("TECHNICAL DETAILS") {
        Section::Details
    } else {
        return None;
    };

    // Header line must end its label with a colon; "Purpose of X is ..." is prose.
    let colon = bare.find(':')?;
    if bare[..colon].split_whitespace().count() > 4 {
        return None;
    }
    let rest = bare[colon + 1..].trim_matches(|c: char| c == '*' || c.is_whitespace());
    Some((section, rest))
}

fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if !(trimmed.starts_with('-') || trimmed.starts_with('*')) {
        return None;
    }
    let text = trimmed.trim_start_matches(['-', '*']).trim();
    (!text.is_empty()).then_some(text)
}

/// Parse a `PURPOSE` / `KEY FUNCTIONS` / `TECHNICAL DETAILS` reply.
///
/// Headers may be bold, markdown headings, or bare; content may sit on the
/// header line or the lines after it. A missing purpose falls back to a fixed
/// sentence; missing lists stay empty.
pub fn parse_analysis(text: &str) -> AnalysisSections {
    let text = strip_think_tags(text);
    let mut result = AnalysisSections::default();
    let mut purpose_lines: Vec<&str> = Vec::new();
    let mut current = Section::Preamble;

    for line in text.lines() {
        if let Some((section, inline)) = section_header(line) {
            current = section;
            // List sections only take bullets, even on the header line
            match section {
                Section::Purpose if !inline.is_empty() => purpose_lines.push(inline),
                Section::Functions => {
                    if let Some(item) = bullet_text(inline) {
                        result.functions.push(item.to_string());
                    }
                }
                Section::Details => {
                    if let Some(item) = bullet_text(inline) {
                        result.key_details.push(item.to_string());
                    }
                }
                _ => {}
            }
            continue;
        }

        match current {
            Section::Preamble => {}
            Section::Purpose => {
                let cleaned = line.trim().trim_matches('*').trim();
                if !cleaned.is_empty() {
                    purpose_lines.push(cleaned);
                }
            }
            Section::Functions => {
                if let Some(item) = bullet_text(line) {
                    result.functions.push(item.to_string());
                }
            }
            Section::Details => {
                if let Some(item) = bullet_text(line) {
                    result.key_details.push(item.to_string());
                }
            }
        }
    }

    result.purpose = purpose_lines.join(" ").trim().to_string();
    if result.purpose.is_empty() {
        result.purpose = DEFAULT_PURPOSE.to_string();
    }
    result
}
