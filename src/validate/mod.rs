//! Structural image validation.
//!
//! A download is only kept if its bytes decode as a real image. The
//! format is sniffed from content, never from the file extension, and the
//! full decode catches truncated or corrupted data that a header check
//! would miss.

use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use tracing::debug;

/// Reasons a file failed image validation.
///
/// Callers treat every variant the same way: the file is not a usable
/// image and must be discarded.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The file could not be opened or sniffed.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The file that failed to open.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The content does not start with any known image signature.
    #[error("unrecognized image container in {path}")]
    UnknownFormat {
        /// The file with unrecognized content.
        path: PathBuf,
    },

    /// The container was recognized but the data does not decode.
    #[error("undecodable image data in {path}: {source}")]
    Decode {
        /// The file that failed to decode.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: image::ImageError,
    },
}

/// Decodes the file at `path` to confirm it is a structurally valid image.
///
/// Returns the detected format on success.
///
/// # Errors
///
/// Returns [`ValidateError`] for unreadable files, unrecognized
/// containers, and data that fails to decode (truncated bodies, wrong
/// magic bytes, corrupt streams).
pub fn validate_image(path: &Path) -> Result<ImageFormat, ValidateError> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| ValidateError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

    let Some(format) = reader.format() else {
        return Err(ValidateError::UnknownFormat {
            path: path.to_path_buf(),
        });
    };

    reader.decode().map_err(|e| ValidateError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), ?format, "image decoded cleanly");
    Ok(format)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    use super::*;

    fn encoded_image(format: ImageFormat) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(8, 8, Rgb([180u8, 40, 90]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_validate_image_accepts_real_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ok.png");
        std::fs::write(&path, encoded_image(ImageFormat::Png)).unwrap();

        let format = validate_image(&path).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_validate_image_accepts_real_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ok.jpg");
        std::fs::write(&path, encoded_image(ImageFormat::Jpeg)).unwrap();

        let format = validate_image(&path).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_validate_image_ignores_misleading_extension() {
        // PNG bytes under a .jpg name still validate: content decides
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("actually-png.jpg");
        std::fs::write(&path, encoded_image(ImageFormat::Png)).unwrap();

        let format = validate_image(&path).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_validate_image_rejects_garbage_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("garbage.png");
        std::fs::write(&path, b"this is definitely not an image").unwrap();

        let result = validate_image(&path);
        assert!(
            matches!(result, Err(ValidateError::UnknownFormat { .. })),
            "got: {result:?}"
        );
    }

    #[test]
    fn test_validate_image_rejects_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        assert!(validate_image(&path).is_err());
    }

    #[test]
    fn test_validate_image_rejects_truncated_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("truncated.png");
        let full = encoded_image(ImageFormat::Png);
        // Keep the signature and a sliver of data so sniffing succeeds
        // but decoding cannot.
        std::fs::write(&path, &full[..16]).unwrap();

        let result = validate_image(&path);
        assert!(
            matches!(result, Err(ValidateError::Decode { .. })),
            "got: {result:?}"
        );
    }

    #[test]
    fn test_validate_image_rejects_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.png");

        let result = validate_image(&path);
        assert!(matches!(result, Err(ValidateError::Read { .. })), "got: {result:?}");
    }
}
