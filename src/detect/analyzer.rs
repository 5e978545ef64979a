//! Orchestrates parsing and detection over a source tree.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::parser::PhpParser;

use super::{
    filter_suppressed, parse_suppressions, AnalysisResult, DetectorSet, Issue, SkippedFile,
};

/// Extension of the files that are analyzed.
const PHP_EXTENSION: &str = "php";

/// Runs every enabled detector over every PHP file under a root path.
///
/// Results are ordered by file (enumeration order), then by detector
/// (registration order), then by position in the file. Parallel runs
/// produce exactly the same order.
pub struct Analyzer {
    root: PathBuf,
    config: Config,
    jobs: usize,
    parser: PhpParser,
}

impl Analyzer {
    /// Create an analyzer for `root` (a directory or a single file).
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: Config::default(),
            jobs: 1,
            parser: PhpParser::new(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Number of worker threads. 1 runs sequentially on the calling thread,
    /// 0 lets rayon pick one per core.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enumerate the PHP files to analyze, sorted by file name.
    ///
    /// Hidden entries below the root are skipped, as are files matching
    /// `excluded_paths`. Unreadable directory entries are logged and skipped.
    pub fn collect_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| anyhow::anyhow!("cannot access path {}: {}", self.root.display(), e))?;

        if metadata.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let excluded = self.config.excluded_matcher()?;
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PHP_EXTENSION) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if excluded.is_match(relative) {
                log::debug!("excluded {}", relative.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    /// Analyze every file under the root.
    pub fn analyze(&self) -> anyhow::Result<AnalysisResult> {
        let files = self.collect_files()?;
        log::debug!("analyzing {} file(s) under {}", files.len(), self.root.display());
        self.analyze_files(&files)
    }

    /// Analyze an explicit list of files, in the given order.
    pub fn analyze_files(&self, files: &[PathBuf]) -> anyhow::Result<AnalysisResult> {
        let mut result = AnalysisResult::new();

        if self.jobs == 1 {
            let mut detectors = DetectorSet::from_config(&self.config.detectors);
            for path in files {
                result.merge(self.analyze_file(path, &mut detectors));
            }
            return Ok(result);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("timeoutguard-worker-{}", i))
            .build()?;

        let per_file: Vec<AnalysisResult> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let mut detectors = DetectorSet::from_config(&self.config.detectors);
                    self.analyze_file(path, &mut detectors)
                })
                .collect()
        });

        for file_result in per_file {
            result.merge(file_result);
        }
        Ok(result)
    }

    /// Parse one file and run each detector over it in turn. Read and parse
    /// failures are recorded as skipped files.
    fn analyze_file(&self, path: &Path, detectors: &mut DetectorSet) -> AnalysisResult {
        let mut result = AnalysisResult::new();
        let file = path.to_string_lossy().to_string();

        let parsed = match self.parser.parse_file(path) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("skipping {}: {}", file, e);
                result.skipped.push(SkippedFile {
                    file,
                    reason: e.to_string(),
                });
                return result;
            }
        };

        let mut issues = Vec::new();
        for detector in detectors.iter_mut() {
            detector.traverse(&parsed);
            issues.extend(
                detector
                    .take_issues()
                    .into_iter()
                    .map(|finding| Issue::new(file.clone(), finding)),
            );
            detector.reset();
        }

        let suppressions = parse_suppressions(&file, &parsed.source_str());
        let (active, suppressed) = filter_suppressed(issues, &suppressions);

        log::debug!(
            "{}: {} issue(s), {} suppressed",
            file,
            active.len(),
            suppressed.len()
        );

        result.issues = active;
        result.suppressed = suppressed;
        result.scanned = 1;
        result
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
