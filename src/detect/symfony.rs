//! Symfony HttpClient requests without a `timeout` option.
//!
//! Symfony's client only exposes `request($method, $url, $options)`, so the
//! method name plus a literal HTTP verb is taken as enough evidence; no
//! receiver whitelist applies. Calls chained directly off a factory such as
//! `HttpClient::create()` are claimed as well.

use tree_sitter::Node;

use crate::analysis::{is_http_verb, CallSite};
use crate::config::SymfonyConfig;
use crate::parser::ParsedFile;

use super::{Detector, Finding, Library};

const MESSAGE: &str = "Symfony HttpClient request without timeout configuration";

const SUGGESTION: &str = r#"// Add timeout configuration:
$response = $client->request('GET', $url, [
    'timeout' => 10,  // Request timeout in seconds
]);"#;

pub struct SymfonyHttpDetector {
    factory_marker: String,
    issues: Vec<Finding>,
}

impl SymfonyHttpDetector {
    pub fn new() -> Self {
        Self::with_config(&SymfonyConfig::default())
    }

    pub fn with_config(config: &SymfonyConfig) -> Self {
        Self {
            factory_marker: config.factory_marker.clone(),
            issues: Vec::new(),
        }
    }

    /// `$client->request('GET', ...)`
    fn is_verb_request(&self, call: &CallSite) -> bool {
        call.is_method("request") && call.first_positional_literal().is_some_and(is_http_verb)
    }

    /// `HttpClient::create()->request(...)`
    fn is_factory_request(&self, call: &CallSite) -> bool {
        call.is_method("request")
            && call
                .receiver_static_class()
                .is_some_and(|class| class.contains(self.factory_marker.as_str()))
    }
}

impl Default for SymfonyHttpDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SymfonyHttpDetector {
    fn library(&self) -> Library {
        Library::SymfonyHttpClient
    }

    fn visit(&mut self, node: Node<'_>, file: &ParsedFile) {
        let Some(call) = CallSite::from_node(node, file) else {
            return;
        };

        let matched = self.is_verb_request(&call) || self.is_factory_request(&call);
        if matched && !call.has_option_key("timeout") {
            self.issues.push(Finding::missing_timeout(
                Library::SymfonyHttpClient,
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
    fn test_detects_request_without_timeout() {
        let code = r#"<?php
use Symfony\Component\HttpClient\HttpClient;

$client = HttpClient::create();
$response = $client->request('GET', 'https://api.example.com');
"#;
        let issues = analyze_code(&mut SymfonyHttpDetector::new(), code);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type.as_str(), "missing_timeout");
        assert_eq!(issues[0].library, Library::SymfonyHttpClient);
        assert_eq!(issues[0].library.label(), "Symfony HttpClient");
        assert_eq!(issues[0].method, "request");
    }

    #[test]
    fn test_ignores_request_with_timeout() {
        let code = r#"<?php
$client = HttpClient::create();
$response = $client->request('GET', 'https://api.example.com', [
    'timeout' => 10,
]);
"#;
        assert!(analyze_code(&mut SymfonyHttpDetector::new(), code).is_empty());
    }

    #[test]
    fn test_detects_post_with_other_options() {
        let code = r#"<?php
$client = HttpClient::create();
$response = $client->request('POST', 'https://api.example.com', [
    'json' => ['data' => 'value'],
]);
"#;
        assert_eq!(analyze_code(&mut SymfonyHttpDetector::new(), code).len(), 1);
    }

    #[test]
    fn test_ignores_verb_shortcuts() {
        let code = r#"<?php
$client = new SomeClient();
$response = $client->post('https://api.example.com');
"#;
        assert!(analyze_code(&mut SymfonyHttpDetector::new(), code).is_empty());
    }

    #[test]
    fn test_one_issue_per_request_call() {
        let code = r#"<?php
$client = HttpClient::create();
$client->request('GET', 'https://api.example.com');
$client->request('POST', 'https://api.example.com');
$client->request('PUT', 'https://api.example.com');
$client->request('DELETE', 'https://api.example.com');
"#;
        let issues = analyze_code(&mut SymfonyHttpDetector::new(), code);
        assert_eq!(issues.len(), 4);
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_factory_chain_is_flagged_once() {
        let code = r#"<?php
$response = HttpClient::create()->request('GET', $url);
$response = \Symfony\Component\HttpClient\HttpClient::create()->request($method, $url);
$response = HttpClient::create()->request('GET', $url, ['timeout' => 5]);
"#;
        let issues = analyze_code(&mut SymfonyHttpDetector::new(), code);
        assert_eq!(issues.len(), 2);
        assert_eq!((issues[0].line, issues[1].line), (2, 3));
    }

    #[test]
    fn test_non_verb_first_argument_is_ignored() {
        let code = r#"<?php
$client->request($method, $url);
$router->request('/users');
$httpClient->request(method: 'GET', url: $u);
"#;
        assert!(analyze_code(&mut SymfonyHttpDetector::new(), code).is_empty());
    }
}
