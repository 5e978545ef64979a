//! Inline suppression of issues via comments.
//!
//! Supports suppression comments like:
//! - `// timeoutguard:ignore <type> - <reason>`
//! - `// timeoutguard:ignore-next-line <type> - <reason>`
//! - `// timeoutguard:ignore-file <type> - <reason>`
//!
//! `#` and `/* ... */` comments work the same way. `*` matches every issue
//! type.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Issue, IssueType};

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Issue type to suppress (e.g., "missing_timeout") or "*" for all
    pub rule: String,
    /// Human-readable reason
    pub reason: String,
    /// File containing the suppression
    pub file: String,
    /// Line number (0 for file-level)
    pub line: usize,
    pub suppression_type: SuppressionType,
}

/// An issue that was suppressed.
#[derive(Debug, Clone)]
pub struct SuppressedIssue {
    pub issue: Issue,
    pub suppression: Suppression,
}

/// File-level directives must appear within this many lines of the top,
/// unless only comments precede them.
const FILE_HEADER_LINES: usize = 10;

lazy_static::lazy_static! {
    static ref SUPPRESSION_PATTERNS: Vec<Regex> = vec![
        // Block comment style: /* timeoutguard:... */
        Regex::new(r"/\*\s*timeoutguard:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*?))?\s*\*/").unwrap(),
        // Line comment style: // timeoutguard:...
        Regex::new(r"//\s*timeoutguard:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?").unwrap(),
        // Shell style: # timeoutguard:...
        Regex::new(r"#\s*timeoutguard:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?").unwrap(),
    ];
}

/// Parse suppression directives from file content.
pub fn parse_suppressions(file_path: &str, content: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut in_header = true;

    for (line_num, line) in content.lines().enumerate() {
        let line_number = line_num + 1;
        let trimmed = line.trim();

        if in_header && !is_header_line(trimmed) {
            in_header = false;
        }

        for pattern in SUPPRESSION_PATTERNS.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };

            let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let rule = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let reason = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            let suppression_type = match directive {
                "ignore-file" => {
                    if !in_header && line_number > FILE_HEADER_LINES {
                        continue;
                    }
                    SuppressionType::File
                }
                "ignore-next-line" => SuppressionType::NextLine,
                "ignore" => {
                    // Alone on its line it covers the next line, after code
                    // it covers its own.
                    let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
                    if line[..start].trim().is_empty() {
                        SuppressionType::NextLine
                    } else {
                        SuppressionType::Line
                    }
                }
                _ => continue,
            };

            suppressions.push(Suppression {
                rule: rule.to_string(),
                reason,
                file: file_path.to_string(),
                line: if suppression_type == SuppressionType::File {
                    0
                } else {
                    line_number
                },
                suppression_type,
            });
            break; // Only one suppression per line
        }
    }

    suppressions
}

/// Blank lines, comments and the opening tag make up the file header.
fn is_header_line(line: &str) -> bool {
    line.is_empty()
        || line.starts_with("<?php")
        || line.starts_with("//")
        || line.starts_with('#')
        || line.starts_with("/*")
        || line.starts_with('*')
}

/// Check if an issue matches a suppression.
pub fn matches_suppression(issue: &Issue, suppression: &Suppression) -> bool {
    if issue.file() != suppression.file {
        return false;
    }

    if suppression.rule != "*" {
        match IssueType::parse(&suppression.rule) {
            Some(rule) if rule == issue.issue_type() => {}
            _ => return false,
        }
    }

    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => issue.line() == suppression.line,
        SuppressionType::NextLine => issue.line() == suppression.line + 1,
    }
}

/// Separate issues into active and suppressed, preserving order.
pub fn filter_suppressed(
    issues: Vec<Issue>,
    suppressions: &[Suppression],
) -> (Vec<Issue>, Vec<SuppressedIssue>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for issue in issues {
        match suppressions.iter().find(|s| matches_suppression(&issue, s)) {
            Some(suppression) => suppressed.push(SuppressedIssue {
                issue,
                suppression: suppression.clone(),
            }),
            None => active.push(issue),
        }
    }

    (active, suppressed)
}
