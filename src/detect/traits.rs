//! The detector contract.

use tree_sitter::Node;

use crate::analysis::preorder;
use crate::parser::ParsedFile;

use super::{Finding, Library};

/// A stateful visitor that recognises one HTTP client library's call sites
/// and records those missing a timeout.
///
/// Findings accumulate across `visit` calls for the tree currently being
/// walked. Callers drain them with [`Detector::take_issues`] and must call
/// [`Detector::reset`] before walking the next tree.
pub trait Detector: Send {
    /// The library this detector reports on.
    fn library(&self) -> Library;

    /// Inspect one node. Called once per node during a pre-order walk.
    fn visit(&mut self, node: Node<'_>, file: &ParsedFile);

    /// Findings accumulated since the last reset.
    fn issues(&self) -> &[Finding];

    /// Move the accumulated findings out, leaving the accumulator empty.
    fn take_issues(&mut self) -> Vec<Finding>;

    /// Return to the initial state.
    fn reset(&mut self);

    /// Walk the whole tree of `file`, visiting every node.
    fn traverse(&mut self, file: &ParsedFile) {
        preorder(file, |node| self.visit(node, file));
    }
}
