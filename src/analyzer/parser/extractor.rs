//! Comment-stripping symbol extractor.
//!
//! Extraction runs in two passes over the same grammar:
//! 1. parse the original text, collect every comment range and cut it out;
//! 2. re-parse the cleaned text and walk it in pre-order, collecting the
//!    names of declaration nodes.

use tree_sitter::{Node, Tree, TreeCursor};

use super::Language;
use super::grammar::{create_ts_parser, get_node_text};
use crate::types::{Result, ScribeError};

/// Node kinds whose names are reported as symbols
const DECLARATION_KINDS: &[&str] = &[
    "function_definition",
    "function_declaration",
    "method_definition",
    "method_declaration",
    "class_definition",
    "class_declaration",
    "class_specifier",
    "struct_specifier",
    "type_declaration",
    // rust
    "function_item",
    "struct_item",
    "enum_item",
    "trait_item",
    // ruby
    "method",
    "class",
];

/// Kinds that terminate a declarator chain or name a declaration directly
const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "simple_identifier",
    "type_identifier",
    "field_identifier",
    "qualified_identifier",
    "destructor_name",
    "operator_name",
    "constant",
];

/// Output of a single extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Declaration names in discovery order, duplicates kept
    pub symbols: Vec<String>,
    /// Source with every comment range removed
    pub cleaned_code: String,
}

/// Stateless extractor; a fresh tree-sitter parser is built per call
pub struct SymbolExtractor;

impl SymbolExtractor {
    /// Strip comments from `source` and collect declared symbol names.
    ///
    /// Languages without a grammar pass through unchanged with no symbols.
    pub fn extract(source: &str, language: Language) -> Result<Extraction> {
        let Some(grammar) = language.grammar() else {
            return Ok(Extraction {
                symbols: Vec::new(),
                cleaned_code: source.to_string(),
            });
        };

        let mut parser = create_ts_parser(grammar, language.as_str())?;

        let tree = parse(&mut parser, source, language)?;
        let ranges = comment_ranges(&tree);
        let cleaned_code = remove_ranges(source, ranges);

        let tree = parse(&mut parser, &cleaned_code, language)?;
        let symbols = collect_symbols(&tree, cleaned_code.as_bytes());

        Ok(Extraction {
            symbols,
            cleaned_code,
        })
    }
}

fn parse(parser: &mut tree_sitter::Parser, source: &str, language: Language) -> Result<Tree> {
    parser.parse(source, None).ok_or_else(|| ScribeError::Parse {
        path: String::new(),
        message: format!("tree-sitter returned no tree for {}", language),
    })
}

// =============================================================================
// Comment excision
// =============================================================================

/// Visit every node (named or anonymous) in pre-order
fn walk_preorder<'t>(tree: &'t Tree, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor: TreeCursor<'t> = tree.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Byte ranges of all comment nodes, sorted and merged
fn comment_ranges(tree: &Tree) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    walk_preorder(tree, |node| {
        if node.kind().contains("comment") && node.end_byte() > node.start_byte() {
            ranges.push((node.start_byte(), node.end_byte()));
        }
    });
    merge_ranges(ranges)
}

fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Delete merged ranges back to front so earlier offsets stay valid
fn remove_ranges(source: &str, ranges: Vec<(usize, usize)>) -> String {
    let mut cleaned = source.to_string();
    for (start, end) in ranges.into_iter().rev() {
        let start = floor_boundary(source, start);
        let end = ceil_boundary(source, end);
        if start < end {
            cleaned.replace_range(start..end, "");
        }
    }
    cleaned
}

// =============================================================================
// Symbol walk
// =============================================================================

fn collect_symbols(tree: &Tree, source: &[u8]) -> Vec<String> {
    let mut symbols = Vec::new();
    walk_preorder(tree, |node| {
        if node.is_named()
            && DECLARATION_KINDS.contains(&node.kind())
            && let Some(name) = resolve_name(node, source)
        {
            symbols.push(name);
        }
    });
    symbols
}

fn resolve_name(node: Node, source: &[u8]) -> Option<String> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_node_text(n, source))
        .or_else(|| {
            node.child_by_field_name("declarator")
                .and_then(|d| declarator_name(d, source))
        })
        .or_else(|| identifier_child(node).map(|n| get_node_text(n, source)))
        .or_else(|| spec_child_name(node, source))?;

    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Follow `declarator` fields (C/C++ pointer and function declarators) down to a name
fn declarator_name<'a>(mut node: Node, source: &'a [u8]) -> Option<&'a str> {
    loop {
        if IDENTIFIER_KINDS.contains(&node.kind()) {
            return Some(get_node_text(node, source));
        }
        node = node.child_by_field_name("declarator")?;
    }
}

/// First direct named child that is an identifier (Kotlin declarations carry no name field)
fn identifier_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| IDENTIFIER_KINDS.contains(&child.kind()));
    found
}

/// Go `type_declaration` wraps its name in a `type_spec`
fn spec_child_name<'a>(node: Node, source: &'a [u8]) -> Option<&'a str> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .filter(|child| child.kind().ends_with("_spec"))
        .find_map(|child| child.child_by_field_name("name"))
        .map(|n| get_node_text(n, source));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn extract(source: &str, language: Language) -> Extraction {
        SymbolExtractor::extract(source, language).unwrap()
    }

    #[test]
    fn test_one_comment_one_declaration_per_language() {
        let cases: &[(Language, &str, &str, &str)] = &[
            (Language::Python, "# helper note\ndef greet():\n    return 1\n", "greet", "return 1"),
            (Language::Java, "// helper note\nclass Greeter {\n}\n", "Greeter", "class Greeter"),
            (Language::JavaScript, "// helper note\nfunction greet() { return 1; }\n", "greet", "return 1"),
            (Language::TypeScript, "// helper note\nfunction greet(): number { return 1; }\n", "greet", "return 1"),
            (Language::Tsx, "// helper note\nfunction Greet() { return <div />; }\n", "Greet", "<div />"),
            (Language::C, "// helper note\nint greet(void) { return 1; }\n", "greet", "return 1"),
            (Language::Cpp, "// helper note\nint greet() { return 1; }\n", "greet", "return 1"),
            (Language::Go, "package main\n\n// helper note\nfunc greet() int { return 1 }\n", "greet", "return 1"),
            (Language::Kotlin, "// helper note\nfun greet(): Int { return 1 }\n", "greet", "return 1"),
            (Language::Rust, "// helper note\nfn greet() -> i32 { 1 }\n", "greet", "-> i32"),
            (Language::Ruby, "# helper note\ndef greet\n  1\nend\n", "greet", "def greet"),
            (Language::Bash, "# helper note\ngreet() {\n  echo hi\n}\n", "greet", "echo hi"),
        ];

        for (language, source, name, body) in cases {
            let out = extract(source, *language);
            assert_eq!(out.symbols, vec![name.to_string()], "{:?}", language);
            assert!(!out.cleaned_code.contains("helper note"), "{:?}", language);
            assert!(out.cleaned_code.contains(body), "{:?}", language);
        }
    }

    #[test]
    fn test_markup_comments_removed() {
        let html = extract("<!-- helper note --><p>hi</p>\n", Language::Html);
        assert!(html.symbols.is_empty());
        assert_eq!(html.cleaned_code, "<p>hi</p>\n");

        let css = extract("/* helper note */\nbody { color: red; }\n", Language::Css);
        assert!(css.symbols.is_empty());
        assert_eq!(css.cleaned_code, "\nbody { color: red; }\n");
    }

    #[test]
    fn test_cleaned_code_is_byte_exact_outside_comments() {
        let source = "x = 1  # trailing\ny = 2\n";
        assert_eq!(extract(source, Language::Python).cleaned_code, "x = 1  \ny = 2\n");
    }

    #[test]
    fn test_pointer_declarator_and_struct() {
        let source = "struct Point { int x; };\nchar *name_of(int id) { return 0; }\n";
        let out = extract(source, Language::C);
        assert_eq!(out.symbols, vec!["Point", "name_of"]);
    }

    #[test]
    fn test_cpp_class_and_qualified_method() {
        let source = "class Widget {};\nvoid Widget::draw() {}\n";
        let out = extract(source, Language::Cpp);
        assert_eq!(out.symbols, vec!["Widget", "Widget::draw"]);
    }

    #[test]
    fn test_go_type_and_method() {
        let source = "package main\n\ntype Server struct{}\n\nfunc (s *Server) Start() {}\n";
        let out = extract(source, Language::Go);
        assert_eq!(out.symbols, vec!["Server", "Start"]);
    }

    #[test]
    fn test_rust_items() {
        let source = "struct A;\nenum B { X }\ntrait C {}\nfn d() {}\n";
        let out = extract(source, Language::Rust);
        assert_eq!(out.symbols, vec!["A", "B", "C", "d"]);
    }

    #[test]
    fn test_nested_preorder_and_duplicates_kept() {
        let source = "class A:\n    def run(self):\n        pass\n\nclass B:\n    def run(self):\n        pass\n";
        let out = extract(source, Language::Python);
        assert_eq!(out.symbols, vec!["A", "run", "B", "run"]);
    }

    #[test]
    fn test_ruby_class_keyword_not_counted_twice() {
        let source = "class Greeter\n  def hello\n  end\nend\n";
        let out = extract(source, Language::Ruby);
        assert_eq!(out.symbols, vec!["Greeter", "hello"]);
    }

    #[test]
    fn test_anonymous_declaration_skipped() {
        let source = "struct { int x; } value;\n";
        let out = extract(source, Language::C);
        assert!(out.symbols.is_empty());
    }

    #[test]
    fn test_no_grammar_passthrough() {
        let source = "// keep me\nfunc greet() {}\n";
        let out = extract(source, Language::Swift);
        assert!(out.symbols.is_empty());
        assert_eq!(out.cleaned_code, source);
    }

    #[test]
    fn test_multibyte_comment_removed_cleanly() {
        let source = "// héllo wörld ✓\nfunction ok() {}\n";
        let out = extract(source, Language::JavaScript);
        assert_eq!(out.cleaned_code, "\nfunction ok() {}\n");
        assert_eq!(out.symbols, vec!["ok"]);
    }

    #[test]
    fn test_merge_ranges() {
        assert_eq!(merge_ranges(vec![(5, 9), (0, 3), (2, 4)]), vec![(0, 4), (5, 9)]);
        assert_eq!(merge_ranges(vec![(0, 10), (2, 4)]), vec![(0, 10)]);
        assert_eq!(merge_ranges(vec![(0, 2), (2, 4)]), vec![(0, 4)]);
    }

    fn python_source() -> impl Strategy<Value = String> {
        let line = prop_oneof![
            "[a-z]{1,8}".prop_map(|name| format!("def f_{}():\n    return 1\n", name)),
            "[a-z]{1,8}".prop_map(|name| format!("class C{}:\n    pass\n", name)),
            "[a-z ]{0,20}".prop_map(|text| format!("# {}\n", text)),
            "[a-z]{1,8}".prop_map(|name| format!("v_{} = 1  # note\n", name)),
        ];
        proptest::collection::vec(line, 0..12).prop_map(|lines| lines.concat())
    }

    proptest! {
        #[test]
        fn prop_extraction_is_deterministic(source in python_source()) {
            let first = extract(&source, Language::Python);
            let second = extract(&source, Language::Python);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_cleaning_reaches_fixpoint(source in python_source()) {
            let once = extract(&source, Language::Python);
            let twice = extract(&once.cleaned_code, Language::Python);
            prop_assert_eq!(&twice.cleaned_code, &once.cleaned_code);
            prop_assert_eq!(twice.symbols, once.symbols);
            prop_assert!(!once.cleaned_code.contains('#'));
        }
    }
}
