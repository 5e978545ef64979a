//! Command-line interface for timeoutguard.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{self, Config, CONFIG_TEMPLATE, DEFAULT_CONFIG_NAMES};
use crate::detect::Analyzer;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Find HTTP calls made without a timeout in PHP code.
///
/// timeoutguard scans PHP sources for Guzzle, Symfony HttpClient and cURL
/// requests that do not configure a timeout, and exits non-zero when it
/// finds any so CI can block the merge.
#[derive(Parser)]
#[command(name = "timeoutguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan PHP files for HTTP calls without a timeout
    #[command(visible_alias = "analyze")]
    Check(CheckArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Worker threads; 1 runs sequentially, 0 uses one per core
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Show suppressed issues in output
    #[arg(long)]
    pub show_suppressed: bool,

    /// Exit non-zero when a file could not be parsed
    #[arg(long)]
    pub fail_on_skipped: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "timeoutguard.yaml")]
    pub output: PathBuf,
}

/// Load the explicit config, a discovered one, or the defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(Path::new(".")),
    };

    match path {
        Some(p) => {
            log::debug!("using config {}", p.display());
            Config::parse_file(&p)
                .map_err(|e| anyhow::anyhow!("cannot load config {}: {}", p.display(), e))
        }
        None => {
            log::debug!(
                "no config file found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Ok(Config::default())
        }
    }
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let analyzer = Analyzer::new(&abs_path)
        .with_config(config)
        .jobs(args.jobs);
    let result = analyzer.analyze()?;

    if result.scanned == 0 && result.skipped.is_empty() {
        log::warn!("no PHP files found under {}", abs_path.display());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format.as_str() {
        "json" => report::write_json(&mut out, &result)?,
        _ => {
            let cwd = std::env::current_dir()
                .and_then(|d| d.canonicalize())
                .unwrap_or_default();
            report::write_pretty(&mut out, &result, &cwd, args.show_suppressed)?;
        }
    }
    out.flush()?;

    if result.has_issues() || (args.fail_on_skipped && !result.skipped.is_empty()) {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to match your client variable names", args.output.display());
    println!("  2. Run: timeoutguard check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
