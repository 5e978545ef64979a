//! Pre-order traversal of a parsed file.

use tree_sitter::Node;

use crate::parser::ParsedFile;

/// Call `visit` once for every named node of `file`, parents before
/// children, siblings in source order.
pub fn preorder<'t, F>(file: &'t ParsedFile, mut visit: F)
where
    F: FnMut(Node<'t>),
{
    let mut cursor = file.tree.walk();

    loop {
        let node = cursor.node();
        if node.is_named() {
            visit(node);
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;

    #[test]
    fn test_preorder_visits_parents_first() {
        let parsed = PhpParser::new()
            .parse("t.php", b"<?php\nfoo(bar());\nbaz();\n".to_vec())
            .unwrap();

        let mut calls = Vec::new();
        preorder(&parsed, |node| {
            if node.kind() == "function_call_expression" {
                let callee = node.child_by_field_name("function").unwrap();
                calls.push(parsed.node_text(callee).to_string());
            }
        });

        assert_eq!(calls, vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_root_is_visited() {
        let parsed = PhpParser::new()
            .parse("t.php", b"<?php\n".to_vec())
            .unwrap();

        let mut kinds = Vec::new();
        preorder(&parsed, |node| kinds.push(node.kind()));
        assert_eq!(kinds.first(), Some(&"program"));
    }
}
