//! Configuration file schema for timeoutguard.
//!
//! Every field is optional; a missing file or an empty document yields the
//! built-in detector heuristics.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File names looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["timeoutguard.yaml", ".timeoutguard.yaml"];

/// Template written by `timeoutguard init`.
pub const CONFIG_TEMPLATE: &str = include_str!("templates/timeoutguard.yaml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// Glob patterns for paths to exclude, relative to the scan root
    /// (e.g., "vendor/**", "**/tests/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub detectors: DetectorsConfig,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to null, not to an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a default config file in `dir`, if one exists.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Compile `excluded_paths` into a single matcher.
    pub fn excluded_matcher(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|e| {
                anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e)
            })?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }
}

/// Per-detector settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DetectorsConfig {
    #[serde(default)]
    pub guzzle: GuzzleConfig,
    #[serde(default)]
    pub symfony: SymfonyConfig,
    #[serde(default)]
    pub curl: CurlConfig,
}

/// Guzzle detection heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuzzleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Receiver variable names (without `$`) treated as Guzzle clients
    #[serde(default = "default_client_variables")]
    pub client_variables: Vec<String>,
    /// Receivers whose `request('<VERB>', ...)` calls belong to another library
    #[serde(default = "default_foreign_client_variables")]
    pub foreign_client_variables: Vec<String>,
}

impl Default for GuzzleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_variables: default_client_variables(),
            foreign_client_variables: default_foreign_client_variables(),
        }
    }
}

/// Symfony HttpClient detection heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymfonyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Substring of the factory class in `X::create()->request(...)` chains
    #[serde(default = "default_factory_marker")]
    pub factory_marker: String,
}

impl Default for SymfonyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            factory_marker: default_factory_marker(),
        }
    }
}

/// cURL detection heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurlConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Free functions that execute a cURL handle
    #[serde(default = "default_curl_functions")]
    pub functions: Vec<String>,
}

impl Default for CurlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            functions: default_curl_functions(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_client_variables() -> Vec<String> {
    [
        "client",
        "httpClient",
        "guzzle",
        "guzzleClient",
        "http",
        "api",
        "apiClient",
        "restClient",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_foreign_client_variables() -> Vec<String> {
    vec!["symfonyClient".to_string(), "httpClient".to_string()]
}

fn default_factory_marker() -> String {
    "HttpClient".to_string()
}

fn default_curl_functions() -> Vec<String> {
    vec!["curl_exec".to_string()]
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    // Validate excluded_paths glob patterns compile
    config.excluded_matcher()?;

    let detectors = &config.detectors;
    if detectors.guzzle.enabled && detectors.guzzle.client_variables.is_empty() {
        anyhow::bail!("detectors.guzzle.client_variables must not be empty");
    }
    if detectors.symfony.enabled && detectors.symfony.factory_marker.trim().is_empty() {
        anyhow::bail!("detectors.symfony.factory_marker must not be empty");
    }
    if detectors.curl.enabled && detectors.curl.functions.is_empty() {
        anyhow::bail!("detectors.curl.functions must not be empty");
    }

    Ok(())
}
