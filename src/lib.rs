//! timeoutguard - find HTTP calls without a timeout in PHP code.
//!
//! An HTTP call without a timeout can block a request-serving process for
//! as long as the remote end keeps the connection open. timeoutguard walks a
//! PHP source tree and flags Guzzle, Symfony HttpClient and cURL calls that
//! do not configure one, so CI can reject them.
//!
//! # Architecture
//!
//! - `parser`: tree-sitter PHP parsing, one file at a time
//! - `analysis`: pre-order walk and call-site classification
//! - `detect`: per-library detectors, the analyzer that runs them, suppression
//! - `config`: YAML configuration schema
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a New Detector
//!
//! Implement [`detect::Detector`] on top of [`analysis::CallSite`] and
//! register it in `DetectorSet::from_config`. Registration order is the
//! order in which a file's issues are reported.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod parser;
pub mod report;

pub use analysis::{CallKind, CallSite};
pub use config::Config;
pub use detect::{
    AnalysisResult, Analyzer, Detector, DetectorSet, Finding, Issue, IssueType, Library, Severity,
};
pub use parser::{ParseError, ParsedFile, PhpParser};
