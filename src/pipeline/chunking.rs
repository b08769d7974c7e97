//! Bounded-context splitting for prompts.

use std::collections::BTreeSet;

use crate::constants::chunking::{CHUNK_LINES, CHUNK_OVERLAP};

/// Split code into windows of [`CHUNK_LINES`] lines, each starting
/// `CHUNK_LINES - CHUNK_OVERLAP` lines after the previous one.
/// Empty input yields no windows.
pub fn line_windows(code: &str) -> Vec<String> {
    let lines: Vec<&str> = code.lines().collect();
    let step = CHUNK_LINES - CHUNK_OVERLAP;

    (0..lines.len())
        .step_by(step)
        .map(|start| {
            let end = (start + CHUNK_LINES).min(lines.len());
            lines[start..end].join("\n")
        })
        .collect()
}

/// Greedily pack blocks into `\n\n`-joined groups whose block lengths sum to at
/// most `max_chars`. A block longer than the budget gets a group of its own.
pub fn group_by_chars(blocks: &[String], max_chars: usize) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for block in blocks {
        if !current.is_empty() && current_len + block.len() > max_chars {
            groups.push(current.join("\n\n"));
            current.clear();
            current_len = 0;
        }
        current.push(block);
        current_len += block.len();
    }
    if !current.is_empty() {
        groups.push(current.join("\n\n"));
    }
    groups
}

/// Every file plus every ancestor folder (with a trailing `/`), sorted
pub fn build_file_tree<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut entries = BTreeSet::new();
    for path in paths {
        let mut prefix = String::new();
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                break;
            }
            prefix.push_str(segment);
            prefix.push('/');
            entries.insert(prefix.clone());
        }
        entries.insert(path.to_string());
    }
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_line_windows_small_and_empty() {
        assert!(line_windows("").is_empty());
        assert_eq!(line_windows("a\nb"), vec!["a\nb"]);
    }

    #[test]
    fn test_line_windows_overlap() {
        let windows = line_windows(&numbered(600));
        // starts at 0, 290, 580
        assert_eq!(windows.len(), 3);
        assert!(windows[0].starts_with("line0\n"));
        assert!(windows[0].ends_with("line299"));
        assert!(windows[1].starts_with("line290\n"));
        assert!(windows[1].ends_with("line589"));
        assert!(windows[2].starts_with("line580\n"));
        assert!(windows[2].ends_with("line599"));
    }

    #[test]
    fn test_group_by_chars() {
        let blocks: Vec<String> = ["aaaa", "bbbb", "cccc"].iter().map(|s| s.to_string()).collect();
        assert_eq!(group_by_chars(&blocks, 8), vec!["aaaa\n\nbbbb", "cccc"]);
        assert_eq!(group_by_chars(&blocks, 100), vec!["aaaa\n\nbbbb\n\ncccc"]);
        assert!(group_by_chars(&[], 10).is_empty());
    }

    #[test]
    fn test_group_oversized_block_stands_alone() {
        let blocks = vec!["x".repeat(20), "y".to_string()];
        assert_eq!(group_by_chars(&blocks, 10), vec!["x".repeat(20), "y".to_string()]);
    }

    #[test]
    fn test_build_file_tree() {
        let tree = build_file_tree(["src/app/main.py", "src/util.py", "setup.py"]);
        assert_eq!(
            tree,
            vec!["setup.py", "src/", "src/app/", "src/app/main.py", "src/util.py"]
        );
    }

    proptest! {
        #[test]
        fn prop_windows_cover_every_line(n in 0usize..1500) {
            let code = numbered(n);
            let windows = line_windows(&code);
            let step = CHUNK_LINES - CHUNK_OVERLAP;
            prop_assert_eq!(windows.len(), n.div_ceil(step));

            let mut seen = BTreeSet::new();
            for window in &windows {
                prop_assert!(window.lines().count() <= CHUNK_LINES);
                seen.extend(window.lines().map(str::to_string));
            }
            prop_assert_eq!(seen.len(), n);
        }

        #[test]
        fn prop_groups_preserve_blocks(lens in proptest::collection::vec(1usize..50, 0..30), max in 1usize..120) {
            let blocks: Vec<String> = lens.iter().enumerate()
                .map(|(i, len)| format!("{}{}", i % 10, "z".repeat(*len)))
                .collect();
            let groups = group_by_chars(&blocks, max);
            let rejoined: Vec<String> = groups.iter()
                .flat_map(|g| g.split("\n\n").map(str::to_string))
                .collect();
            prop_assert_eq!(rejoined, blocks);
        }
    }
}
