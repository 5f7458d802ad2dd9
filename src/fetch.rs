use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{DownloadError, FetchError};

/// A single GET of an image url. Only a 200 response counts as success.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self(url)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Blocking client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::from_builder(Client::builder(), timeout)
    }

    fn from_builder(builder: ClientBuilder, timeout: Duration) -> Result<Self, FetchError> {
        let client = builder.timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Bounded retry with linear backoff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            timeout: Duration::from_secs(10),
            backoff_base: Duration::from_secs(1),
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Sleep after the failed 0-based `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff_base + self.backoff_step * attempt
    }
}

/// Fetch `url` and write the body verbatim to `output_path`.
///
/// Returns the number of attempts it took. Every failed attempt, the last one
/// included, is followed by the policy's backoff sleep. Nothing is written
/// unless an attempt succeeds.
pub fn download_with_retry<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    output_path: &Path,
    policy: &RetryPolicy,
) -> Result<u32, DownloadError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let err = match fetcher.fetch(url) {
            Ok(bytes) => {
                fs::write(output_path, &bytes).map_err(|source| DownloadError::Write {
                    path: output_path.to_path_buf(),
                    source,
                })?;
                return Ok(attempt + 1);
            }
            Err(err) => err,
        };

        let delay = policy.delay(attempt);
        debug!(url, attempt = attempt + 1, error = %err, ?delay, "fetch attempt failed");
        thread::sleep(delay);

        attempt += 1;
        if attempt >= attempts {
            return Err(DownloadError::Exhausted { attempts, last: err });
        }
    }
}
