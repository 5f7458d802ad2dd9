use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::annotation::extract_entry;
use crate::config::DownloadConfig;
use crate::error::DownloadError;
use crate::fetch::{download_with_retry, Fetcher};
use crate::split::Split;

/// Outcome counts for one split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub records: usize,
    pub downloaded: usize,
    pub malformed: usize,
    pub failed: usize,
}

/// `output_dir/{split}/{label}/{idx:06}.jpg`
pub fn image_path(output_dir: &Path, split: Split, label: &str, idx: usize) -> PathBuf {
    output_dir
        .join(split.as_str())
        .join(label)
        .join(format!("{idx:06}.jpg"))
}

fn read_records(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn progress_bar(split: Split, len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{prefix:>5} [{elapsed_precise}] {wide_bar} {pos}/{len}") {
        bar.set_style(style);
    }
    bar.set_prefix(split.as_str());
    bar
}

/// Download every record of one split, in file order.
///
/// Records are numbered from 1 over the non-blank lines of the annotation
/// file, and that number becomes the image file name. Bad lines and failed
/// downloads are logged and skipped.
pub fn process_split<F: Fetcher + ?Sized>(
    fetcher: &F,
    config: &DownloadConfig,
    split: Split,
) -> io::Result<SplitStats> {
    let input_path = config.annotations_dir.join(split.annotation_file());
    info!("=== Processing {split}: {} ===", input_path.display());

    let lines = read_records(&input_path)?;
    let mut stats = SplitStats {
        records: lines.len(),
        ..SplitStats::default()
    };

    let bar = progress_bar(split, lines.len());
    for (idx, line) in (1..).zip(lines.iter()) {
        bar.inc(1);

        let entry = match extract_entry(line) {
            Ok(entry) => entry,
            Err(e) => {
                bar.suspend(|| warn!("Bad JSONL line {idx}: {e}"));
                stats.malformed += 1;
                continue;
            }
        };

        let save_path = image_path(&config.output_dir, split, &entry.label, idx);
        let result = create_parent(&save_path)
            .and_then(|()| download_with_retry(fetcher, &entry.url, &save_path, &config.retry));
        match result {
            Ok(_) => stats.downloaded += 1,
            Err(e) => {
                bar.suspend(|| warn!("Failed download: {} ({e})", entry.url));
                stats.failed += 1;
            }
        }
    }
    bar.finish_and_clear();

    info!(
        split = split.as_str(),
        records = stats.records,
        downloaded = stats.downloaded,
        malformed = stats.malformed,
        failed = stats.failed,
        "split finished"
    );
    Ok(stats)
}

fn create_parent(path: &Path) -> Result<(), DownloadError> {
    match path.parent() {
        Some(dir) => fs::create_dir_all(dir).map_err(|source| DownloadError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

/// Run train, valid and test in order. A split whose annotation file can't
/// be read is logged and skipped.
pub fn download_all<F: Fetcher + ?Sized>(
    fetcher: &F,
    config: &DownloadConfig,
) -> Vec<(Split, SplitStats)> {
    let mut results = Vec::new();
    for split in Split::ALL {
        match process_split(fetcher, config, split) {
            Ok(stats) => results.push((split, stats)),
            Err(e) => error!(
                "Could not read {}: {e}",
                config.annotations_dir.join(split.annotation_file()).display()
            ),
        }
    }
    results
}
