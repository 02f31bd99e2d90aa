//! HTTP client for streaming image downloads with safety checks.
//!
//! The client inspects response headers before any byte is written and
//! enforces the size limit again while streaming, so servers that omit
//! or lie about Content-Length cannot push an oversized payload to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_IMAGE_BYTES, READ_TIMEOUT_SECS};
use super::error::FetchError;

/// HTTP client for fetching images with streaming support.
///
/// Designed to be created once and reused across URLs, taking advantage
/// of connection pooling.
#[derive(Debug, Clone)]
pub struct ImageClient {
    client: Client,
    max_bytes: u64,
}

/// Result of a fetch attempt that did not fail at the transport level.
///
/// Header and size rejections are expected outcomes, not errors; only
/// [`FetchStatus::Complete`] leaves a file on disk.
#[derive(Debug)]
pub enum FetchStatus {
    /// The body was fully streamed to `path`.
    Complete {
        /// Final output path.
        path: PathBuf,
        /// Number of body bytes written.
        bytes: u64,
    },
    /// The declared content type does not identify an image.
    NotAnImage {
        /// The declared Content-Type value (lowercased; empty if absent).
        content_type: String,
    },
    /// The declared Content-Length exceeds the size limit.
    DeclaredTooLarge {
        /// The declared length in bytes.
        declared: u64,
        /// The enforced limit in bytes.
        limit: u64,
    },
    /// The streamed body exceeded the size limit; the partial file has
    /// been removed.
    BodyTooLarge {
        /// The enforced limit in bytes.
        limit: u64,
    },
}

impl Default for ImageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageClient {
    /// Creates a new client with the default size limit and timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::build(MAX_IMAGE_BYTES, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new client with an explicit size limit.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration.
    #[must_use]
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self::build(max_bytes, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        Self::build(MAX_IMAGE_BYTES, connect_timeout_secs, read_timeout_secs)
    }

    #[allow(clippy::expect_used)]
    fn build(max_bytes: u64, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(concat!("imgfetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, max_bytes }
    }

    /// Returns the configured size limit in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Fetches `url` to `dest_path`, enforcing the image content-type and
    /// size policies.
    ///
    /// Header checks run before the destination file is created, so
    /// header-stage rejections never touch the filesystem. A body that
    /// overruns the limit mid-stream is aborted and the partial file
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if:
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_image(
        &self,
        url: &str,
        dest_path: &Path,
    ) -> Result<FetchStatus, FetchError> {
        debug!("starting fetch");
        let response = self.send_request(url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            debug!(content_type = %content_type, "declared content type is not an image");
            return Ok(FetchStatus::NotAnImage { content_type });
        }

        // Fast path: trust a declared length only to reject early. The
        // streaming check below still guards servers that lie or stay silent.
        if let Some(declared) = declared_content_length(&response)
            && declared > self.max_bytes
        {
            debug!(declared, limit = self.max_bytes, "declared content length over limit");
            return Ok(FetchStatus::DeclaredTooLarge {
                declared,
                limit: self.max_bytes,
            });
        }

        let mut file = File::create(dest_path)
            .await
            .map_err(|e| FetchError::io(dest_path.to_path_buf(), e))?;

        match stream_to_file_capped(&mut file, response, url, dest_path, self.max_bytes).await {
            Ok(Streamed::Complete(bytes)) => {
                info!(path = %dest_path.display(), bytes, "fetch complete");
                Ok(FetchStatus::Complete {
                    path: dest_path.to_path_buf(),
                    bytes,
                })
            }
            Ok(Streamed::OverLimit) => {
                debug!(path = %dest_path.display(), "body exceeded size limit, removing partial file");
                drop(file);
                let _ = tokio::fs::remove_file(dest_path).await;
                Ok(FetchStatus::BodyTooLarge {
                    limit: self.max_bytes,
                })
            }
            Err(e) => {
                debug!(path = %dest_path.display(), "cleaning up partial file after error");
                drop(file);
                let _ = tokio::fs::remove_file(dest_path).await;
                Err(e)
            }
        }
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::http_status(url, response.status().as_u16()));
        }

        Ok(response)
    }
}

fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

enum Streamed {
    Complete(u64),
    OverLimit,
}

/// Streams the response body to `file`, stopping the moment the running
/// byte total exceeds `max_bytes`.
///
/// The caller removes the partial file on [`Streamed::OverLimit`] and on
/// error; dropping the stream releases the underlying connection.
async fn stream_to_file_capped(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    max_bytes: u64,
) -> Result<Streamed, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        bytes_written += chunk.len() as u64;
        if bytes_written > max_bytes {
            return Ok(Streamed::OverLimit);
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

    Ok(Streamed::Complete(bytes_written))
}
