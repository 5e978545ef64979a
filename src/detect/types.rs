//! Core types for detection results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SuppressedIssue;

/// Severity levels, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Capitalised name for summaries ("High").
    pub fn title(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "missing_timeout")]
    MissingTimeout,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::MissingTimeout => "missing_timeout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missing_timeout" => Some(IssueType::MissingTimeout),
            _ => None,
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP client libraries the detectors know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Library {
    #[serde(rename = "Guzzle")]
    Guzzle,
    #[serde(rename = "Symfony HttpClient")]
    SymfonyHttpClient,
    #[serde(rename = "cURL")]
    Curl,
}

impl Library {
    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Library::Guzzle => "Guzzle",
            Library::SymfonyHttpClient => "Symfony HttpClient",
            Library::Curl => "cURL",
        }
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What a detector emits for one call site. It carries no file path: only
/// the analyzer knows which file is being walked, and it attaches the path
/// when turning the finding into an [`Issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub line: usize,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub library: Library,
    pub method: String,
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
}

impl Finding {
    /// A `missing_timeout` finding at `high` severity.
    pub fn missing_timeout(
        library: Library,
        method: &str,
        line: usize,
        message: &str,
        suggestion: &str,
    ) -> Self {
        Self {
            line,
            issue_type: IssueType::MissingTimeout,
            library,
            method: method.to_string(),
            severity: Severity::High,
            message: message.to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}

/// A finding tagged with the file it was found in. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    file: String,
    #[serde(flatten)]
    finding: Finding,
}

impl Issue {
    pub fn new(file: impl Into<String>, finding: Finding) -> Self {
        Self {
            file: file.into(),
            finding,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> usize {
        self.finding.line
    }

    pub fn issue_type(&self) -> IssueType {
        self.finding.issue_type
    }

    pub fn library(&self) -> Library {
        self.finding.library
    }

    pub fn method(&self) -> &str {
        &self.finding.method
    }

    pub fn severity(&self) -> Severity {
        self.finding.severity
    }

    pub fn message(&self) -> &str {
        &self.finding.message
    }

    pub fn suggestion(&self) -> &str {
        &self.finding.suggestion
    }
}

/// A file that was enumerated but could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Results of analyzing a set of files.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub issues: Vec<Issue>,
    /// Issues silenced by inline comments
    pub suppressed: Vec<SuppressedIssue>,
    /// Files that failed to read or parse
    pub skipped: Vec<SkippedFile>,
    /// Number of files successfully analyzed
    pub scanned: usize,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one, keeping order.
    pub fn merge(&mut self, other: AnalysisResult) {
        self.issues.extend(other.issues);
        self.suppressed.extend(other.suppressed);
        self.skipped.extend(other.skipped);
        self.scanned += other.scanned;
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issue counts per severity, most severe first.
    pub fn count_by_severity(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity()).or_insert(0) += 1;
        }
        counts
    }
}
