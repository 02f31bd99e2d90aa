//! Per-URL intake pipeline: fetch, validate, deduplicate, keep or discard.
//!
//! Each URL moves through the stages independently. A candidate file is
//! created speculatively during the fetch and is either promoted (kept on
//! disk, digest recorded) or destroyed — no rejection path leaves a file
//! behind. The only state shared between URLs is the caller-owned
//! [`DigestStore`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::dedupe::{DigestStore, digest_file};
use crate::fetch::{FetchError, FetchStatus, ImageClient, resolve_filename};
use crate::validate::validate_image;

/// Directory accepted images are written to, relative to the working
/// directory. Created on first use.
pub const DOWNLOAD_DIR: &str = "Fetched_Images";

/// Outcome of processing one URL.
///
/// Everything except [`Outcome::Saved`] means nothing was persisted.
/// These are expected results, not errors; genuinely unexpected faults
/// surface as [`IntakeError`] instead.
#[derive(Debug)]
pub enum Outcome {
    /// The image was validated, found new, and kept on disk.
    Saved {
        /// The resolved filename.
        filename: String,
        /// Full path of the saved file.
        path: PathBuf,
    },
    /// Rejected from response headers: the declared content type is not
    /// an image. No file was written.
    RejectedHeaders {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// Rejected for size, either declared up front or measured while
    /// streaming. Any partial file has been removed.
    RejectedSize {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// The downloaded bytes do not decode as an image. File removed.
    RejectedInvalid {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// Byte-identical content was already accepted this run. File removed.
    RejectedDuplicate {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// The URL could not be retrieved (bad URL, DNS, connect, timeout,
    /// HTTP error status). Nothing was persisted.
    TransportError {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl Outcome {
    /// Returns true if the URL produced a saved file.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Unexpected faults during intake (filesystem trouble, not policy).
///
/// These do not abort the batch: the shell reports them per URL and
/// moves on.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// File system error (create directory, write, read for digest).
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl IntakeError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Sequential image intake pipeline.
///
/// Holds the HTTP client (reused across URLs for connection pooling) and
/// the destination directory.
#[derive(Debug)]
pub struct ImagePipeline {
    client: ImageClient,
    download_dir: PathBuf,
}

impl Default for ImagePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePipeline {
    /// Creates a pipeline writing to the default download directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_download_dir(DOWNLOAD_DIR)
    }

    /// Creates a pipeline writing to `dir`.
    #[must_use]
    pub fn with_download_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_client(ImageClient::new(), dir)
    }

    /// Creates a pipeline with an explicit client (used by tests to
    /// shrink limits and timeouts).
    #[must_use]
    pub fn with_client(client: ImageClient, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: dir.into(),
        }
    }

    /// Returns the destination directory.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Runs one URL through fetch, validation, and deduplication.
    ///
    /// `store` accumulates the digests of accepted files; duplicates
    /// within the same store are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError`] only for unexpected filesystem faults.
    /// Expected rejections — wrong content type, oversized payloads,
    /// undecodable images, duplicates, transport failures — are reported
    /// through [`Outcome`].
    #[instrument(skip(self, store), fields(url = %url))]
    pub async fn process_url(
        &self,
        url: &str,
        store: &mut DigestStore,
    ) -> Result<Outcome, IntakeError> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| IntakeError::io(self.download_dir.clone(), e))?;

        let Ok(parsed) = Url::parse(url) else {
            debug!("input does not parse as a URL");
            return Ok(Outcome::TransportError {
                reason: FetchError::invalid_url(url).to_string(),
            });
        };

        let filename = resolve_filename(&parsed);
        let dest_path = self.download_dir.join(&filename);
        debug!(filename = %filename, path = %dest_path.display(), "resolved destination");

        let fetched = match self.client.fetch_image(url, &dest_path).await {
            Ok(status) => status,
            Err(FetchError::Io { path, source }) => return Err(IntakeError::io(path, source)),
            Err(transport) => {
                return Ok(Outcome::TransportError {
                    reason: transport.to_string(),
                });
            }
        };

        let (path, bytes) = match fetched {
            FetchStatus::Complete { path, bytes } => (path, bytes),
            FetchStatus::NotAnImage { content_type } => {
                return Ok(Outcome::RejectedHeaders {
                    reason: if content_type.is_empty() {
                        "not an image: no content type declared".to_string()
                    } else {
                        format!("not an image: {content_type}")
                    },
                });
            }
            FetchStatus::DeclaredTooLarge { declared, limit } => {
                return Ok(Outcome::RejectedSize {
                    reason: format!("file too large: {declared} bytes declared, limit {limit}"),
                });
            }
            FetchStatus::BodyTooLarge { limit } => {
                return Ok(Outcome::RejectedSize {
                    reason: format!("exceeded size limit of {limit} bytes"),
                });
            }
        };

        let format = match validate_image(&path) {
            Ok(format) => format,
            Err(e) => {
                debug!(error = %e, "validation failed, removing file");
                let _ = tokio::fs::remove_file(&path).await;
                return Ok(Outcome::RejectedInvalid {
                    reason: format!("invalid or corrupted image: {e}"),
                });
            }
        };

        let digest = match digest_file(&path).await {
            Ok(digest) => digest,
            Err(e) => {
                // Unexpected fault; don't leave the candidate behind.
                let _ = tokio::fs::remove_file(&path).await;
                return Err(IntakeError::io(path, e));
            }
        };

        if store.contains(&digest) {
            debug!(digest = %digest, "duplicate content, removing file");
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(Outcome::RejectedDuplicate {
                reason: format!("duplicate image: sha256 {digest}"),
            });
        }
        store.add(digest);

        info!(
            filename = %filename,
            path = %path.display(),
            bytes,
            ?format,
            digest = %digest,
            "image saved"
        );
        Ok(Outcome::Saved { filename, path })
    }
}

/// Counters for one batch run, rendered in the completion line.
#[derive(Debug, Default)]
pub struct RunSummary {
    saved: usize,
    skipped: usize,
    errors: usize,
}

impl RunSummary {
    /// Creates a zeroed summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one URL.
    pub fn record(&mut self, outcome: &Outcome) {
        if outcome.is_saved() {
            self.saved += 1;
        } else {
            self.skipped += 1;
        }
    }

    /// Records an unexpected per-URL failure.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Returns the number of saved images.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Returns the number of skipped URLs (rejections of any kind).
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the number of unexpected failures.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} saved, {} skipped, {} errors",
            self.saved, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_saved() {
        let saved = Outcome::Saved {
            filename: "cat.jpg".to_string(),
            path: PathBuf::from("Fetched_Images/cat.jpg"),
        };
        assert!(saved.is_saved());

        let rejected = Outcome::RejectedHeaders {
            reason: "not an image: text/html".to_string(),
        };
        assert!(!rejected.is_saved());
    }

    #[test]
    fn test_run_summary_counts_outcomes() {
        let mut summary = RunSummary::new();
        summary.record(&Outcome::Saved {
            filename: "a.png".to_string(),
            path: PathBuf::from("a.png"),
        });
        summary.record(&Outcome::RejectedDuplicate {
            reason: "duplicate image".to_string(),
        });
        summary.record(&Outcome::TransportError {
            reason: "timeout".to_string(),
        });
        summary.record_error();

        assert_eq!(summary.saved(), 1);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.errors(), 1);
        assert_eq!(summary.to_string(), "1 saved, 2 skipped, 1 errors");
    }

    #[test]
    fn test_pipeline_default_download_dir() {
        let pipeline = ImagePipeline::new();
        assert_eq!(pipeline.download_dir(), Path::new(DOWNLOAD_DIR));
    }

    #[tokio::test]
    async fn test_process_url_invalid_url_is_transport_outcome() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let pipeline = ImagePipeline::with_download_dir(temp_dir.path().join("out"));
        let mut store = DigestStore::new();

        let outcome = pipeline
            .process_url("not a url at all", &mut store)
            .await
            .unwrap();
        match outcome {
            Outcome::TransportError { reason } => {
                assert!(reason.contains("invalid URL"), "got: {reason}");
            }
            other => panic!("Expected TransportError, got: {other:?}"),
        }
        assert!(store.is_empty());
    }
}
