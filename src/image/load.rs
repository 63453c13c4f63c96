//! Image decoding from bytes, files and base64 payloads.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;

use crate::error::{Error, Result};

use super::encode::strip_data_url;

/// Decode raw image file bytes, guessing the format from the content.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not a supported image.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    decode_with_origin(bytes, "memory")
}

/// Read and decode an image file.
///
/// The format is guessed from the file content, not its extension.
///
/// # Errors
///
/// Returns [`Error::ImageRead`] if the file cannot be read and
/// [`Error::Decode`] if its content is not a supported image.
pub fn decode_path<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let bytes = std::fs::read(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;

    decode_with_origin(&bytes, &path.display().to_string())
}

/// Decode a base64 image payload, with or without a `data:` URL prefix.
///
/// # Errors
///
/// Returns [`Error::Base64`] for malformed base64 and [`Error::Decode`] if the
/// decoded bytes are not a supported image.
pub fn decode_base64(data: &str) -> Result<DynamicImage> {
    let bytes = STANDARD.decode(strip_data_url(data).trim())?;
    decode_with_origin(&bytes, "base64 payload")
}

fn decode_with_origin(bytes: &[u8], origin: &str) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| Error::Decode {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{encode_png_base64, solid_color};

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_path("/nonexistent/screenshot.png").unwrap_err();
        assert!(matches!(err, Error::ImageRead { .. }));
    }

    #[test]
    fn test_decode_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\ntruncated").unwrap();

        let err = decode_path(&path).unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("broken.png"));
    }

    #[test]
    fn test_decode_base64_with_data_url() {
        let encoded = encode_png_base64(&solid_color(4, 3, [0, 0, 255])).unwrap();
        let img = decode_base64(&format!("data:image/png;base64,{encoded}")).unwrap();

        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn test_decode_invalid_base64() {
        let err = decode_base64("###").unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
    }
}
