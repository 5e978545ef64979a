//! Guzzle requests without a `timeout` option.
//!
//! Guzzle exposes `request()` plus one shortcut per verb (`get()`, `post()`,
//! ...). The receiver's type is never resolved: a call is only attributed to
//! Guzzle when it is made on a bare variable whose name is on the client
//! whitelist. `$this->client->get()` or `$request->get('param')` are left
//! alone.

use phf::phf_set;
use tree_sitter::Node;

use crate::analysis::{is_http_verb, CallKind, CallSite};
use crate::config::GuzzleConfig;
use crate::parser::ParsedFile;

use super::{Detector, Finding, Library};

/// Guzzle client methods that issue a request.
static REQUEST_METHODS: phf::Set<&'static str> = phf_set! {
    "request", "get", "post", "put", "delete", "patch", "head", "options",
};

const MESSAGE: &str = "Guzzle HTTP request without timeout configuration";

const SUGGESTION: &str = r#"// Add timeout configuration:
$response = $client->request('GET', $url, [
    'timeout' => 10,         // Total request timeout
    'connect_timeout' => 3,  // Connection timeout
]);"#;

pub struct GuzzleDetector {
    client_variables: Vec<String>,
    foreign_client_variables: Vec<String>,
    issues: Vec<Finding>,
}

impl GuzzleDetector {
    /// Create a detector with the built-in variable whitelists.
    pub fn new() -> Self {
        Self::with_config(&GuzzleConfig::default())
    }

    pub fn with_config(config: &GuzzleConfig) -> Self {
        Self {
            client_variables: config.client_variables.clone(),
            foreign_client_variables: config.foreign_client_variables.clone(),
            issues: Vec::new(),
        }
    }

    fn is_guzzle_request(&self, call: &CallSite) -> bool {
        if call.kind != CallKind::Method || !REQUEST_METHODS.contains(call.name.as_str()) {
            return false;
        }

        let receiver = call.receiver_variable();

        // `$httpClient->request('GET', ...)` is the Symfony calling convention.
        if call.name == "request"
            && call.first_positional_literal().is_some_and(is_http_verb)
            && receiver.is_some_and(|name| contains(&self.foreign_client_variables, name))
        {
            return false;
        }

        receiver.is_some_and(|name| contains(&self.client_variables, name))
    }
}

impl Default for GuzzleDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn contains(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n == name)
}

impl Detector for GuzzleDetector {
    fn library(&self) -> Library {
        Library::Guzzle
    }

    fn visit(&mut self, node: Node<'_>, file: &ParsedFile) {
        let Some(call) = CallSite::from_node(node, file) else {
            return;
        };

        if self.is_guzzle_request(&call) && !call.has_option_key("timeout") {
            self.issues.push(Finding::missing_timeout(
                Library::Guzzle,
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
    use crate::detect::Severity;

    #[test]
    fn test_detects_get_without_timeout() {
        let code = r#"<?php
use GuzzleHttp\Client;

$client = new Client();
$response = $client->get('https://api.example.com');
"#;
        let issues = analyze_code(&mut GuzzleDetector::new(), code);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type.as_str(), "missing_timeout");
        assert_eq!(issues[0].library, Library::Guzzle);
        assert_eq!(issues[0].method, "get");
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].line, 5);
    }

    #[test]
    fn test_ignores_get_with_timeout() {
        let code = r#"<?php
$client = new Client();
$response = $client->get('https://api.example.com', [
    'timeout' => 10,
]);
"#;
        assert!(analyze_code(&mut GuzzleDetector::new(), code).is_empty());
    }

    #[test]
    fn test_detects_post_with_other_options() {
        let code = r#"<?php
$client = new Client();
$response = $client->post('https://api.example.com', [
    'json' => ['key' => 'value'],
]);
"#;
        let issues = analyze_code(&mut GuzzleDetector::new(), code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].method, "post");
    }

    #[test]
    fn test_detects_request_without_timeout() {
        let code = r#"<?php
$client = new Client();
$response = $client->request('GET', 'https://api.example.com');
"#;
        assert_eq!(analyze_code(&mut GuzzleDetector::new(), code).len(), 1);
    }

    #[test]
    fn test_ignores_non_client_receivers() {
        let code = r#"<?php
$request = new Request();
$data = $request->get('param');
$this->client->get('https://api.example.com');
Client::get('https://api.example.com');
"#;
        assert!(analyze_code(&mut GuzzleDetector::new(), code).is_empty());
    }

    #[test]
    fn test_connect_timeout_alone_is_not_enough() {
        let code = r#"<?php
$client->get('https://api.example.com', ['connect_timeout' => 3]);
$client->get('https://api.example.com', ['timeout' => 10, 'connect_timeout' => 3]);
"#;
        let issues = analyze_code(&mut GuzzleDetector::new(), code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
    }

    #[test]
    fn test_multiple_issues_in_same_file() {
        let code = r#"<?php
$response1 = $client->get('https://api.example.com');
$response2 = $guzzle->post('https://api.example.com');
"#;
        let issues = analyze_code(&mut GuzzleDetector::new(), code);
        assert_eq!(issues.len(), 2);
        assert_eq!((issues[0].line, issues[1].line), (2, 3));
    }

    #[test]
    fn test_symfony_style_request_on_http_client_is_left_alone() {
        let code = r#"<?php
$httpClient->request('GET', 'https://api.example.com');
$symfonyClient->request('post', 'https://api.example.com');
$httpClient->get('https://api.example.com');
"#;
        let issues = analyze_code(&mut GuzzleDetector::new(), code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].method, "get");
    }

    #[test]
    fn test_named_verb_argument_does_not_trigger_foreign_exclusion() {
        let code = r#"<?php
$httpClient->request(method: 'GET', url: $u);
"#;
        let issues = analyze_code(&mut GuzzleDetector::new(), code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].method, "request");
    }

    #[test]
    fn test_custom_whitelist() {
        let config = GuzzleConfig {
            client_variables: vec!["billing".to_string()],
            ..GuzzleConfig::default()
        };
        let code = r#"<?php
$billing->get('https://api.example.com');
$client->get('https://api.example.com');
"#;
        let issues = analyze_code(&mut GuzzleDetector::with_config(&config), code);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
    }
}
