//! PHP parsing on top of tree-sitter.
//!
//! The parser turns one unit of source text into a [`ParsedFile`] or a
//! [`ParseError`]. Trees that tree-sitter recovered from syntax errors are
//! reported as failures, so detectors only ever walk well-formed code.

use std::borrow::Cow;
use std::path::Path;

use thiserror::Error;
use tree_sitter::{Language, Node, Parser as TsParser, Tree};

/// Reasons a source unit could not be turned into a syntax tree.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to load PHP grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("parser returned no tree")]
    NoTree,
    #[error("syntax error at line {line}")]
    Syntax { line: usize },
}

/// Holds a parsed tree-sitter tree and the source it was built from.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: Tree,
    /// Source bytes the tree was built from.
    pub source: Vec<u8>,
    /// The file path, as handed to the parser.
    pub path: String,
}

impl ParsedFile {
    /// Get the source code as text. Invalid UTF-8 (e.g. Latin-1 comments)
    /// is replaced rather than discarded, so line structure is kept.
    pub fn source_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.source)
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// 1-based line a node starts on.
pub fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// PHP parser backed by the tree-sitter-php grammar.
///
/// `tree_sitter::Parser` is not `Sync`, so a fresh one is created per call.
/// The grammar handle itself is cheap to share across threads.
#[derive(Clone)]
pub struct PhpParser {
    language: Language,
}

impl PhpParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }

    fn create_parser(&self) -> Result<TsParser, ParseError> {
        let mut parser = TsParser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Parse in-memory source.
    pub fn parse(&self, path: &str, source: Vec<u8>) -> Result<ParsedFile, ParseError> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(&source, None).ok_or(ParseError::NoTree)?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map(line_of).unwrap_or(1);
            return Err(ParseError::Syntax { line });
        }

        Ok(ParsedFile {
            tree,
            source,
            path: path.to_string(),
        })
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile, ParseError> {
        let source = std::fs::read(path)?;
        self.parse(&path.to_string_lossy(), source)
    }
}

impl Default for PhpParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first ERROR or MISSING node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_php() {
        let parser = PhpParser::new();
        let parsed = parser
            .parse("a.php", b"<?php\n$client->get('https://x');\n".to_vec())
            .unwrap();

        assert_eq!(parsed.path, "a.php");
        assert_eq!(parsed.tree.root_node().kind(), "program");
        assert!(parsed.source_str().contains("$client"));
    }

    #[test]
    fn test_syntax_error_is_reported_with_line() {
        let parser = PhpParser::new();
        let err = parser
            .parse("broken.php", b"<?php\n$a = 1;\nfunction ( {\n".to_vec())
            .err()
            .unwrap();

        match err {
            ParseError::Syntax { line } => assert!(line >= 2, "unexpected line {}", line),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_source_str_keeps_non_utf8_files() {
        let parser = PhpParser::new();
        let parsed = parser
            .parse("latin1.php", b"<?php\n// caf\xe9\n$a = 1;\n".to_vec())
            .unwrap();
        let text = parsed.source_str();
        assert!(text.contains("$a = 1;"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let parser = PhpParser::new();
        let err = parser
            .parse_file(Path::new("/nonexistent/timeoutguard/x.php"))
            .err()
            .unwrap();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
