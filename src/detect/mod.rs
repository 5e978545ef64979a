//! Detection of HTTP calls made without a timeout.

mod analyzer;
mod curl;
mod guzzle;
mod set;
mod suppress;
mod symfony;
mod traits;
mod types;

pub use analyzer::Analyzer;
pub use curl::CurlDetector;
pub use guzzle::GuzzleDetector;
pub use set::DetectorSet;
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, SuppressedIssue, Suppression,
    SuppressionType,
};
pub use symfony::SymfonyHttpDetector;
pub use traits::Detector;
pub use types::{AnalysisResult, Finding, Issue, IssueType, Library, Severity, SkippedFile};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Detector, Finding};
    use crate::parser::PhpParser;

    /// Run one detector over a PHP snippet and drain its findings.
    pub fn analyze_code(detector: &mut dyn Detector, code: &str) -> Vec<Finding> {
        let parsed = PhpParser::new()
            .parse("test.php", code.as_bytes().to_vec())
            .unwrap();
        detector.traverse(&parsed);
        let findings = detector.take_issues();
        detector.reset();
        assert!(detector.issues().is_empty());
        findings
    }
}
