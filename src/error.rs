use std::path::PathBuf;
use thiserror::Error;

/// Why a single annotation line could not be turned into an (url, label) pair.
#[derive(Debug, Error)]
pub enum MalformedRecord {
    #[error("invalid record json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no user message with list content")]
    MissingUserImage,
    #[error("user content[0] has no string image_url.url")]
    MissingImageUrl,
    #[error("no assistant message")]
    MissingAssistant,
    #[error("assistant content is not text")]
    LabelNotText,
}

/// Failure of one HTTP attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("gave up after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: FetchError },
    #[error("could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: class id {token:?} is not an integer")]
    LabelParse {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("cannot compare {left} classes against {right} classes")]
    ModeMismatch {
        left: &'static str,
        right: &'static str,
    },
}

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}
