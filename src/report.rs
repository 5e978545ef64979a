//! Output formatting for timeoutguard results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output grouped by file
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};
use std::path::Path;

use crate::detect::{AnalysisResult, Issue, Severity, SkippedFile, SuppressedIssue, SuppressionType};

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub summary: JsonSummary,
    pub issues: &'a [Issue],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedIssue<'a>>,
    #[serde(skip_serializing_if = "<[SkippedFile]>::is_empty")]
    pub skipped: &'a [SkippedFile],
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
}

/// Suppressed issue with the directive that silenced it.
#[derive(Serialize)]
pub struct JsonSuppressedIssue<'a> {
    pub issue: &'a Issue,
    pub suppression: JsonSuppression<'a>,
}

#[derive(Serialize)]
pub struct JsonSuppression<'a> {
    pub rule: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub reason: &'a str,
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: SuppressionType,
}

/// Build the JSON report for a result.
pub fn build_json_report(result: &AnalysisResult) -> JsonReport<'_> {
    let suppressed = result
        .suppressed
        .iter()
        .map(|si| JsonSuppressedIssue {
            issue: &si.issue,
            suppression: JsonSuppression {
                rule: &si.suppression.rule,
                reason: &si.suppression.reason,
                line: si.suppression.line,
                suppression_type: si.suppression.suppression_type,
            },
        })
        .collect();

    JsonReport {
        summary: JsonSummary {
            total: result.issues.len(),
            by_severity: result.count_by_severity(),
        },
        issues: &result.issues,
        suppressed,
        skipped: &result.skipped,
    }
}

/// Write results in JSON format.
pub fn write_json<W: Write>(out: &mut W, result: &AnalysisResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&build_json_report(result))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const TIP: &str = "Add timeouts to prevent hanging requests that can block your application.";

/// Write results in pretty (human-readable) format. File paths below
/// `base_dir` are shown as `./relative/path`.
pub fn write_pretty<W: Write>(
    out: &mut W,
    result: &AnalysisResult,
    base_dir: &Path,
    show_suppressed: bool,
) -> io::Result<()> {
    if result.issues.is_empty() {
        writeln!(
            out,
            "✅ {}",
            "No issues found! All HTTP calls have timeout configuration.".green()
        )?;
    } else {
        writeln!(
            out,
            "❌ {}\n",
            format!("Found {} issue(s):", result.issues.len()).red().bold()
        )?;
        write_issues(out, &result.issues, base_dir)?;
    }

    if !result.skipped.is_empty() {
        write_skipped(out, &result.skipped, base_dir)?;
    }

    if !result.suppressed.is_empty() {
        write_suppressed(out, &result.suppressed, base_dir, show_suppressed)?;
    }

    if !result.issues.is_empty() {
        write_summary(out, result)?;
    }

    Ok(())
}

fn write_issues<W: Write>(out: &mut W, issues: &[Issue], base_dir: &Path) -> io::Result<()> {
    let mut shown_suggestions: HashSet<String> = HashSet::new();

    for (file, file_issues) in group_by_file(issues) {
        writeln!(out, "📄 {}", display_path(file, base_dir).blue())?;

        for issue in file_issues {
            writeln!(
                out,
                "  {} Line {}: {} ({} {})",
                severity_marker(issue.severity()),
                issue.line(),
                issue.message(),
                issue.library(),
                issue.method().dimmed()
            )?;

            let key = format!("{}::{}", issue.library(), issue.issue_type());
            if !issue.suggestion().is_empty() && shown_suggestions.insert(key) {
                writeln!(out)?;
                writeln!(out, "{}", indent(issue.suggestion(), 4))?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_skipped<W: Write>(out: &mut W, skipped: &[SkippedFile], base_dir: &Path) -> io::Result<()> {
    writeln!(
        out,
        "⏭️  {}",
        format!("Skipped {} file(s) that could not be parsed:", skipped.len()).yellow()
    )?;
    for s in skipped {
        writeln!(
            out,
            "  {} {}",
            display_path(&s.file, base_dir),
            format!("({})", s.reason).dimmed()
        )?;
    }
    writeln!(out)
}

fn write_suppressed<W: Write>(
    out: &mut W,
    suppressed: &[SuppressedIssue],
    base_dir: &Path,
    show_details: bool,
) -> io::Result<()> {
    writeln!(out, "{}", format!("Suppressed ({}):", suppressed.len()).dimmed())?;

    if !show_details {
        writeln!(out, "  {}", "(use --show-suppressed to see details)".dimmed())?;
        return writeln!(out);
    }

    for si in suppressed {
        let issue = &si.issue;
        let location = match si.suppression.suppression_type {
            SuppressionType::File => format!("{}:* (file)", display_path(issue.file(), base_dir)),
            _ => format!("{}:{}", display_path(issue.file(), base_dir), issue.line()),
        };
        writeln!(out, "  {} ({} {})", location, issue.library(), issue.method())?;
        if !si.suppression.reason.is_empty() {
            writeln!(
                out,
                "    {}",
                format!("reason: {:?}", si.suppression.reason).dimmed()
            )?;
        }
    }
    writeln!(out)
}

fn write_summary<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", "Summary:".bold())?;
    for (severity, count) in result.count_by_severity() {
        writeln!(
            out,
            "  {} {}: {}",
            severity_marker(severity),
            severity.title(),
            count
        )?;
    }
    writeln!(out)?;
    writeln!(out, "💡 Tip: {}", TIP)
}

/// Group issues by file, keeping first-seen file order.
fn group_by_file(issues: &[Issue]) -> Vec<(&str, Vec<&Issue>)> {
    let mut groups: Vec<(&str, Vec<&Issue>)> = Vec::new();
    for issue in issues {
        match groups.iter_mut().find(|(file, _)| *file == issue.file()) {
            Some((_, group)) => group.push(issue),
            None => groups.push((issue.file(), vec![issue])),
        }
    }
    groups
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::High => "⚠️",
        Severity::Medium => "🟡",
        Severity::Low => "ℹ️",
    }
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `./relative/path` for files below `base_dir`, the path unchanged otherwise.
fn display_path(file_path: &str, base_dir: &Path) -> String {
    if base_dir.as_os_str().is_empty() {
        return file_path.to_string();
    }

    Path::new(file_path)
        .strip_prefix(base_dir)
        .map(|p| format!("./{}", p.to_string_lossy().replace('\\', "/")))
        .unwrap_or_else(|_| file_path.to_string())
}
