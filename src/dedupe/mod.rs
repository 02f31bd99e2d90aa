//! Content digests and the per-run seen set.
//!
//! Duplicate detection is content-based: two downloads with identical
//! bytes share a SHA-256 digest regardless of URL or filename. The seen
//! set lives only for the lifetime of the process.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Block size for digest reads; bounds peak memory for large files.
const HASH_BLOCK_SIZE: usize = 4096;

/// SHA-256 digest of a file's complete byte content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Returns the raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Computes the SHA-256 digest of the file at `path`.
///
/// The file is read in fixed-size blocks, so peak memory stays constant
/// regardless of file size.
///
/// # Errors
///
/// Returns the underlying IO error if the file cannot be opened or read.
pub async fn digest_file(path: &Path) -> std::io::Result<ContentDigest> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; HASH_BLOCK_SIZE];

    loop {
        let read = file.read(&mut block).await?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }

    Ok(ContentDigest(hasher.finalize().into()))
}

/// Digests accepted during the current run.
///
/// Created empty at startup, grows monotonically as files are accepted,
/// and is never persisted or reloaded. A parallel pipeline would need to
/// wrap this in a mutex or route all checks through one owning worker;
/// the sequential pipeline needs neither.
#[derive(Debug, Default)]
pub struct DigestStore {
    seen: HashSet<ContentDigest>,
}

impl DigestStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `digest` has already been accepted this run.
    #[must_use]
    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.seen.contains(digest)
    }

    /// Records an accepted digest.
    pub fn add(&mut self, digest: ContentDigest) {
        self.seen.insert(digest);
    }

    /// Returns the number of recorded digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if no digests have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_digest_file_known_vector() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let digest = digest_file(&path).await.unwrap();
        assert_eq!(
            digest.to_string(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_digest_file_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 1000]).unwrap();

        let first = digest_file(&path).await.unwrap();
        let second = digest_file(&path).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_digest_file_spans_multiple_blocks() {
        // Content larger than one read block and not block-aligned
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.bin");
        let content: Vec<u8> = (0..=255u8).cycle().take(3 * HASH_BLOCK_SIZE + 17).collect();
        std::fs::write(&path, &content).unwrap();

        let blockwise = digest_file(&path).await.unwrap();
        let oneshot = {
            let mut hasher = Sha256::new();
            hasher.update(&content);
            ContentDigest(hasher.finalize().into())
        };
        assert_eq!(blockwise, oneshot);
    }

    #[tokio::test]
    async fn test_digest_file_differs_for_different_content() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("b.bin");
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();

        assert_ne!(
            digest_file(&a).await.unwrap(),
            digest_file(&b).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_digest_file_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = digest_file(&temp_dir.path().join("nope.bin")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_store_contains_after_add() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.bin");
        std::fs::write(&path, b"x").unwrap();
        let digest = digest_file(&path).await.unwrap();

        let mut store = DigestStore::new();
        assert!(store.is_empty());
        assert!(!store.contains(&digest));

        store.add(digest);
        assert!(store.contains(&digest));
        assert_eq!(store.len(), 1);

        // Re-adding the same digest does not grow the store
        store.add(digest);
        assert_eq!(store.len(), 1);
    }
}
