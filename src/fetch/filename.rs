//! Filename resolution for downloaded images.
//!
//! Derives a safe local filename from the URL path, with a synthesized
//! fallback for URLs that don't yield a usable basename.

use std::hash::{DefaultHasher, Hash, Hasher};

use tracing::debug;
use url::Url;

/// Extension hints for common image types.
///
/// Advisory only: a basename with an unrecognized extension is kept and
/// logged, never rejected. Whether a download is actually an image is
/// decided by decoding its content.
pub const IMAGE_EXTENSION_HINTS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

/// Resolves a local filename from the URL path component.
///
/// Uses the last path segment (percent-decoded and sanitized). When the
/// URL yields no usable name — empty segment, or no extension left after
/// sanitizing — falls back to `downloaded_<id>.jpg`, where `<id>` is a
/// stable-within-run, non-cryptographic hash of the URL. Two unrelated
/// URLs may collide on the fallback name; that is tolerated.
///
/// Two different URLs resolving to the same filename are not
/// disambiguated: the later download overwrites the earlier one.
#[must_use]
pub fn resolve_filename(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.into()
        });
        let name = sanitize_filename(&decoded);
        if name.contains('.') && !name.trim_matches(['_', '.']).is_empty() {
            if !has_image_extension_hint(&name) {
                debug!(filename = %name, "extension is not a known image type, keeping name");
            }
            return name;
        }
    }

    fallback_filename(url.as_str())
}

/// Synthesized fallback name for URLs without a usable basename.
///
/// The id is derived with a non-cryptographic hasher; it is stable for
/// the lifetime of the process but makes no uniqueness guarantee.
pub(crate) fn fallback_filename(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("downloaded_{:016x}.jpg", hasher.finish())
}

fn has_image_extension_hint(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSION_HINTS.iter().any(|ext| lower.ends_with(ext))
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`. Dot-only
/// segments are rewritten so `.` / `..` cannot escape the download
/// directory.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if matches!(sanitized.as_str(), "." | "..") {
        return sanitized.replace('.', "_");
    }
    sanitized
}
