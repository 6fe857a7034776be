//! Stage 1 of parsing: lines to blocks, blocks to a section tree.
//!
//! The grammar only knows two kinds of line besides blank ones:
//!
//! ```text
//! ## Header text        -> Block::Header { level: 2, text: "Header text" }
//! - Key: value          -> Block::Item { raw: "Key: value" }
//! ```
//!
//! An item belongs to the nearest preceding header. Header levels start at 1
//! for the root and may grow by at most one per step.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CodecError, FieldPath, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header {
        level: usize,
        text: String,
        line: usize,
    },
    Item {
        raw: String,
        line: usize,
    },
}

impl Block {
    pub fn line(&self) -> usize {
        match self {
            Block::Header { line, .. } | Block::Item { line, .. } => *line,
        }
    }
}

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"^(#+) (.*)$").expect("Invalid heading regex"))
}

/// Splits a document into header and item blocks, dropping blank lines.
pub fn tokenize(text: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = heading_regex().captures(line) {
            blocks.push(Block::Header {
                level: caps[1].len(),
                text: caps[2].to_string(),
                line: line_no,
            });
        } else if let Some(raw) = line.strip_prefix("- ") {
            blocks.push(Block::Item {
                raw: raw.to_string(),
                line: line_no,
            });
        } else if line == "-" {
            blocks.push(Block::Item {
                raw: String::new(),
                line: line_no,
            });
        } else {
            return Err(CodecError::Grammar {
                path: FieldPath::default(),
                line: line_no,
                expected: "a `#` header or a `- ` bullet".to_string(),
                found: line.to_string(),
            });
        }
    }

    Ok(blocks)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub raw: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: usize,
    pub text: String,
    pub line: usize,
    pub items: Vec<Item>,
    pub children: Vec<Section>,
}

impl Section {
    fn open(level: usize, text: String, line: usize) -> Self {
        Self {
            level,
            text,
            line,
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Line just past the last block of this section.
    pub fn end_line(&self) -> usize {
        let last_item = self.items.last().map(|item| item.line).unwrap_or(self.line);
        let last_child = self
            .children
            .last()
            .map(Section::end_line)
            .unwrap_or(0);
        last_item.max(last_child.saturating_sub(1)) + 1
    }

    /// Folds a flat block sequence into the tree under a single root header.
    pub fn build(blocks: Vec<Block>) -> Result<Section> {
        let mut blocks = blocks.into_iter();

        let root = match blocks.next() {
            Some(Block::Header {
                level: 1,
                text,
                line,
            }) => Section::open(1, text, line),
            Some(other) => {
                return Err(grammar(
                    other.line(),
                    "a level-1 `# ` root header",
                    describe(&other),
                ));
            }
            None => return Err(grammar(1, "a level-1 `# ` root header", "an empty document")),
        };

        // Open sections, root first; the last entry receives items.
        let mut stack = vec![root];

        for block in blocks {
            match block {
                Block::Item { raw, line } => {
                    if let Some(current) = stack.last_mut() {
                        current.items.push(Item { raw, line });
                    }
                }
                Block::Header { level, text, line } => {
                    if level == 1 {
                        return Err(grammar(line, "a single root header", format!("# {text}")));
                    }
                    let depth = stack.len();
                    if level > depth + 1 {
                        return Err(grammar(
                            line,
                            format!("a header of level {} or less", depth + 1),
                            format!("{} {text}", "#".repeat(level)),
                        ));
                    }
                    while stack.len() >= level {
                        close_last(&mut stack);
                    }
                    stack.push(Section::open(level, text, line));
                }
            }
        }

        while stack.len() > 1 {
            close_last(&mut stack);
        }
        Ok(stack.remove(0))
    }
}

fn close_last(stack: &mut Vec<Section>) {
    if let Some(done) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(done);
    }
}

fn describe(block: &Block) -> String {
    match block {
        Block::Header { level, text, .. } => format!("{} {text}", "#".repeat(*level)),
        Block::Item { raw, .. } => format!("- {raw}"),
    }
}

fn grammar(line: usize, expected: impl Into<String>, found: impl Into<String>) -> CodecError {
    CodecError::Grammar {
        path: FieldPath::default(),
        line,
        expected: expected.into(),
        found: found.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(level: usize, text: &str, line: usize) -> Block {
        Block::Header {
            level,
            text: text.to_string(),
            line,
        }
    }

    fn item(raw: &str, line: usize) -> Block {
        Block::Item {
            raw: raw.to_string(),
            line,
        }
    }

    #[test]
    fn tokenize_headers_items_and_blank_lines() {
        let blocks = tokenize("# Root\n- Id: 1\n\n## Nested\n- Name: x\n").unwrap();

        assert_eq!(
            blocks,
            vec![
                header(1, "Root", 1),
                item("Id: 1", 2),
                header(2, "Nested", 4),
                item("Name: x", 5),
            ]
        );
    }

    #[test]
    fn tokenize_keeps_trailing_spaces_and_bare_dashes() {
        let blocks = tokenize("# Root\n- Name: \n-\n").unwrap();

        assert_eq!(blocks[1], item("Name: ", 2));
        assert_eq!(blocks[2], item("", 3));
    }

    #[test]
    fn tokenize_accepts_crlf_line_endings() {
        let blocks = tokenize("# Root\r\n- Id: 1\r\n").unwrap();

        assert_eq!(blocks, vec![header(1, "Root", 1), item("Id: 1", 2)]);
    }

    #[test]
    fn tokenize_rejects_free_text() {
        let err = tokenize("# Root\nSome paragraph\n").unwrap_err();

        assert_eq!(err.line(), Some(2));
        assert!(matches!(err, CodecError::Grammar { .. }));
    }

    #[test]
    fn tokenize_requires_space_after_hashes() {
        assert!(tokenize("#Root\n").is_err());
    }

    #[test]
    fn build_nests_sections_by_level() {
        let blocks = tokenize("# Root\n- A: 1\n\n## One\n- B: 2\n\n### Deep\n\n## Two\n").unwrap();

        let root = Section::build(blocks).unwrap();

        assert_eq!(root.text, "Root");
        assert_eq!(root.items.len(), 1);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "One");
        assert_eq!(root.children[0].children[0].text, "Deep");
        assert_eq!(root.children[0].children[0].level, 3);
        assert_eq!(root.children[1].text, "Two");
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn build_rejects_level_jumps() {
        let blocks = tokenize("# Root\n### Too deep\n").unwrap();

        let err = Section::build(blocks).unwrap_err();

        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn build_rejects_second_root() {
        let blocks = tokenize("# Root\n# Another\n").unwrap();

        assert!(Section::build(blocks).is_err());
    }

    #[test]
    fn build_rejects_items_before_root() {
        let blocks = tokenize("- Id: 1\n# Root\n").unwrap();

        let err = Section::build(blocks).unwrap_err();

        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn build_rejects_empty_document() {
        let err = Section::build(tokenize("\n\n").unwrap()).unwrap_err();

        assert!(matches!(err, CodecError::Grammar { line: 1, .. }));
    }

    #[test]
    fn end_line_is_one_past_last_block() {
        let root = Section::build(tokenize("# Root\n- A: 1\n\n## Child\n- B: 2").unwrap()).unwrap();

        assert_eq!(root.children[0].end_line(), 6);
        assert_eq!(root.end_line(), 6);
    }
}
