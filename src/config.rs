use std::path::PathBuf;

use crate::fetch::RetryPolicy;

pub const ANNOTATIONS_DIR: &str = "basketball-jersey-numbers-ocr.v1i.openai";
pub const OUTPUT_DIR: &str = "dataset";
pub const DATASET_DIR: &str = "./dataset";

const ANNOTATIONS_DIR_VAR: &str = "JERSEY_ANNOTATIONS_DIR";
const OUTPUT_DIR_VAR: &str = "JERSEY_OUTPUT_DIR";
const DATASET_DIR_VAR: &str = "JERSEY_DATASET_DIR";

/// Where the downloader reads annotations from and writes images to.
#[derive(Clone, Debug)]
pub struct DownloadConfig {
    pub annotations_dir: PathBuf,
    pub output_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            annotations_dir: PathBuf::from(ANNOTATIONS_DIR),
            output_dir: PathBuf::from(OUTPUT_DIR),
            retry: RetryPolicy::default(),
        }
    }
}

impl DownloadConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults, with any path present in `lookup` taking precedence.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(ANNOTATIONS_DIR_VAR) {
            config.annotations_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(OUTPUT_DIR_VAR) {
            config.output_dir = PathBuf::from(dir);
        }
        config
    }
}

/// Root of the split tree inspected by the auditor.
#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub dataset_dir: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from(DATASET_DIR),
        }
    }
}

impl AuditConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(DATASET_DIR_VAR) {
            Some(dir) => Self {
                dataset_dir: PathBuf::from(dir),
            },
            None => Self::default(),
        }
    }
}
