pub mod annotation;
pub mod audit;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod split;

pub use annotation::{extract_entry, Entry};
pub use audit::{audit_dataset, AuditReport, ClassSet};
pub use config::{AuditConfig, DownloadConfig};
pub use dataset::{download_all, image_path, process_split, SplitStats};
pub use error::{AuditError, DownloadError, FetchError, MalformedRecord};
pub use fetch::{download_with_retry, Fetcher, HttpFetcher, RetryPolicy};
pub use split::Split;
