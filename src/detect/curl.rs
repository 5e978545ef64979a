//! cURL handles executed without a timeout.
//!
//! Every `curl_exec()` call is flagged. Proving that `CURLOPT_TIMEOUT` was
//! set on the same handle earlier needs data-flow analysis across
//! statements, which this tool does not do, so the timeout check below
//! always reports "not found".

use tree_sitter::Node;

use crate::analysis::CallSite;
use crate::config::CurlConfig;
use crate::parser::ParsedFile;

use super::{Detector, Finding, Library};

const MESSAGE: &str = "cURL request without timeout configuration";

const SUGGESTION: &str = r#"// Add timeout configuration:
$ch = curl_init($url);
curl_setopt($ch, CURLOPT_TIMEOUT, 10);         // Total timeout
curl_setopt($ch, CURLOPT_CONNECTTIMEOUT, 3);  // Connection timeout
$response = curl_exec($ch);
curl_close($ch);"#;

pub struct CurlDetector {
    functions: Vec<String>,
    issues: Vec<Finding>,
}

impl CurlDetector {
    pub fn new() -> Self {
        Self::with_config(&CurlConfig::default())
    }

    pub fn with_config(config: &CurlConfig) -> Self {
        Self {
            functions: config.functions.clone(),
            issues: Vec::new(),
        }
    }

    fn is_curl_exec(&self, call: &CallSite) -> bool {
        self.functions.iter().any(|f| call.is_function(f))
    }

    /// Always false: the handle's earlier `curl_setopt` calls are not tracked.
    fn has_timeout_in_scope(&self, _call: &CallSite) -> bool {
        false
    }
}

impl Default for CurlDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for CurlDetector {
    fn library(&self) -> Library {
        Library::Curl
    }

    fn visit(&mut self, node: Node<'_>, file: &ParsedFile) {
        let Some(call) = CallSite::from_node(node, file) else {
            return;
        };

        if self.is_curl_exec(&call) && !self.has_timeout_in_scope(&call) {
            self.issues.push(Finding::missing_timeout(
                Library::Curl,
                &call.name,
                call.line,
                MESSAGE,
                SUGGESTION,
            ));
        }
    }

    fn issues(&self) -> &[Finding] {
        &self.issues
    }

    fn take_issues(&mut self) -> Vec<Finding> {
        std::mem::take(&mut self.issues)
    }

    fn reset(&mut self) {
        self.issues.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::test_support::analyze_code;

    #[test]
    fn test_flags_curl_exec() {
        let code = r#"<?php
$ch = curl_init('https://api.example.com');
$response = curl_exec($ch);
"#;
        let issues = analyze_code(&mut CurlDetector::new(), code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].library.label(), "cURL");
        assert_eq!(issues[0].method, "curl_exec");
        assert_eq!(issues[0].line, 3);
        assert!(issues[0].suggestion.contains("CURLOPT_TIMEOUT"));
    }

    #[test]
    fn test_flags_even_when_timeout_was_set() {
        let code = r#"<?php
$ch = curl_init('https://api.example.com');
curl_setopt($ch, CURLOPT_TIMEOUT, 10);
curl_setopt($ch, CURLOPT_CONNECTTIMEOUT, 3);
$response = curl_exec($ch);
"#;
        assert_eq!(analyze_code(&mut CurlDetector::new(), code).len(), 1);
    }

    #[test]
    fn test_ignores_other_functions_and_methods() {
        let code = r#"<?php
curl_multi_exec($mh, $running);
$wrapper->curl_exec($ch);
Curl::curl_exec($ch);
"#;
        assert!(analyze_code(&mut CurlDetector::new(), code).is_empty());
    }

    #[test]
    fn test_fully_qualified_call() {
        let code = "<?php\n$out = \\curl_exec($ch);\n";
        assert_eq!(analyze_code(&mut CurlDetector::new(), code).len(), 1);
    }
}
