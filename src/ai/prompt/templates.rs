//! Static prompt texts.

/// System role for the final README call and its partial sections
pub const README_SYSTEM_ROLE: &str = "You are a technical writer and documentation specialist. \
You create clean, professional, and well-structured Markdown documentation. \
Always be concise, precise, and avoid adding any extra commentary or text.";

/// System role for the three diagram phases
pub const ARCHITECT_SYSTEM_ROLE: &str = "You are a principal software engineer who designs \
and documents system architectures. Follow the requested output format exactly.";

/// Per-chunk summary instructions; the code follows under a `### Code:` heading
pub const SUMMARY_INSTRUCTIONS: &str = "\
Write a concise technical summary (2-4 sentences) that includes: \
1) The file's primary purpose and functionality \
2) Key classes/functions and their roles (only the most important ones) \
3) How this file contributes to the overall application \
4) Any notable implementation details, algorithms, or patterns used \
5) **All** API endpoints, routes, or public interfaces if present (with HTTP methods and paths) \
Focus on information that would help developers understand this component's role in the codebase. \
Do NOT list every function - only highlight core functionality that defines what this file does. \
If this file contains API routes, endpoints, or public interfaces, mention them specifically. \
Keep it technical but accessible for README documentation.";

/// Final README structure and rules; the merged code summaries are appended
pub const README_INSTRUCTIONS: &str = r#"Generate a professional README.md for this codebase in the style of a senior technical writer at a large engineering organisation.

REQUIRED SECTIONS (in this order, skip any that do not apply):

# Project Name
A single-line description of what the project does.

## Overview
Two or three paragraphs: the problem the project solves, who it is for, and its core approach.

## Features
A bulleted list of concrete capabilities derived from the code.

## Architecture
How the main components fit together and how data flows between them.

## Getting Started
### Prerequisites
Runtimes, tools, and services required.
### Installation
```bash
# installation commands
```
### Configuration
Environment variables and configuration files the code reads.
### Usage
```bash
# typical invocation
```

## API Documentation
Public interfaces, endpoints (with HTTP methods and paths), or commands, if present.

## Development
### Core Components
The key modules and what each is responsible for.
### Building
### Testing

## Contributing
A short contribution workflow.

## License
State the license if it can be determined, otherwise a placeholder line.

CRITICAL REQUIREMENTS:
- No emojis
- Proper Markdown heading hierarchy
- Concise, specific wording
- Only information that can be derived from the summaries below
- Skip sections that do not apply rather than inventing content
- Code blocks carry a language tag
- Present tense, active voice
- Follow the Google developer documentation style guide
- Output only the Markdown document, nothing before or after it"#;

/// Partial "Code Summary" instructions applied to each summary chunk
pub const PARTIAL_INSTRUCTIONS: &str = "You are an expert technical writer.\n\n\
Generate only a **Code Summary** section in markdown based on these summaries. \
Do not include any other sections, no title, no folder structure. \
Only return the \"Code Summary\" section.";

/// Phase A: how to diagram this project
pub const EXPLANATION_INSTRUCTIONS: &str = r#"You are explaining to a principal software engineer how to draw the most accurate system design diagram for a project.

You will be given:
1. The project's file tree in <file_tree> tags
2. The project's README in <readme> tags

Work through these steps:
1. Infer the architecture from the file structure
2. Use the README to learn the project's purpose and main components
3. Identify the project type (web app, API, library, CLI tool, pipeline)
4. Explain how a system design diagram for it should look

Describe FUNCTIONAL components rather than folder names. Say "REST API Endpoints" instead of "backend/api", and "UI Component Library" instead of "components/".

Cover:
a. The main functional components and what each one does
b. How components communicate (HTTP, events, queues, database queries)
c. The main data flow paths from input to output
d. Key technologies and the role each plays
e. Architectural patterns in use (client-server, pipeline, event-driven, layered)

Group components by layer (presentation, application, data) and name them by purpose.

Put your explanation inside <explanation> tags."#;

/// Phase B: map components onto paths
pub const MAPPING_INSTRUCTIONS: &str = r#"You are mapping the components of a system design to the files and directories that implement them.

You will be given:
1. A system design explanation in <explanation> tags
2. The project's file tree in <file_tree> tags

Guidelines:
1. Focus on the major components named in the explanation
2. Map each to the directories or specific files that implement it
3. Skip components with no clear counterpart in the tree
4. Use only paths that appear in the file tree

Output format:
<component_mapping>
1. [Component Name]: [File/Directory Path]
2. [Component Name]: [File/Directory Path]
</component_mapping>"#;

/// Phase C: emit the Mermaid flowchart
pub const DIAGRAM_INSTRUCTIONS: &str = r#"You are creating a system design diagram in Mermaid.js flowchart syntax.

You will be given:
1. A design explanation in <explanation> tags
2. Component-to-path mappings in <component_mapping> tags

Requirements:
1. Start with `flowchart TD`
2. Name nodes by purpose and add a second line for responsibility: "Auth Service<br/>Token Validation"
3. Label edges with what flows across them: API -->|"SQL Query"| DB
4. Group components into subgraphs by architectural layer, with `direction TB` inside each
5. Use cylinder nodes for data stores: DB[("PostgreSQL")]
6. Add classDef styles per component kind and assign them with `:::`
7. Add click events using only paths from the mapping: click AuthService "src/auth/service.py"

Mermaid syntax rules:
- Quote any label containing special characters: Node["Name (type)"]
- No spaces inside edge label pipes: A -->|"text"| B
- Subgraphs take a quoted title and no alias: subgraph "Data Layer"
- Do not use emojis

Output ONLY the Mermaid code starting with `flowchart TD`. No explanations and no code fences."#;

/// Per-file analysis reply format
pub const ANALYSIS_INSTRUCTIONS: &str = r#"Document this file following the Google developer documentation style guide, in exactly this format:

**PURPOSE:**
Two or three sentences in active voice: what the file does, how it fits into the application, and which problem it solves.

**KEY FUNCTIONS & COMPONENTS:**
Only functions or classes you can explain with specifics. For each:
- `name(params)` - Accepts [inputs]. Returns [output]. Implements [approach] to achieve [goal].
Leave this section empty rather than listing functions vaguely.

**TECHNICAL DETAILS:**
- [Design pattern] - Implements [pattern] to [goal]
- [Integration] - Connects with [service or component] via [mechanism]
- [API/Endpoints] - Exposes [method + path] that [action]
- [Data structures] - Defines [structure] to [represent what]

Rules:
- Active voice, present tense
- Every sentence must add information
- Include parameter types, return values, and error conditions where visible
- An empty section is better than a vague one"#;
