//! The ordered collection of detectors run over every file.

use crate::config::DetectorsConfig;

use super::{CurlDetector, Detector, GuzzleDetector, SymfonyHttpDetector};

/// Detectors in registration order. Order is part of the output contract:
/// issues from one file are reported detector by detector in this order.
pub struct DetectorSet {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorSet {
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// Every built-in detector with default heuristics.
    pub fn with_defaults() -> Self {
        Self::from_config(&DetectorsConfig::default())
    }

    /// Build a fresh set of enabled detectors. Parallel workers call this
    /// once per file so no detector instance is ever shared.
    pub fn from_config(config: &DetectorsConfig) -> Self {
        let mut detectors: Vec<Box<dyn Detector>> = Vec::new();

        if config.symfony.enabled {
            detectors.push(Box::new(SymfonyHttpDetector::with_config(&config.symfony)));
        }
        if config.curl.enabled {
            detectors.push(Box::new(CurlDetector::with_config(&config.curl)));
        }
        if config.guzzle.enabled {
            detectors.push(Box::new(GuzzleDetector::with_config(&config.guzzle)));
        }

        Self::new(detectors)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Detector>> {
        self.detectors.iter_mut()
    }
}
