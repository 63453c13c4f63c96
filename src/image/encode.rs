//! Base64 encoding of images for chat uploads.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// Base64-encode the raw bytes of an image file.
///
/// The file is sent as-is; the service decodes it on its side.
///
/// # Errors
///
/// Returns [`Error::ImageRead`] if the file cannot be read.
pub fn encode_file_base64<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(STANDARD.encode(bytes))
}

/// PNG-encode an in-memory image and base64 the result.
///
/// # Errors
///
/// Returns [`Error::Encode`] if PNG encoding fails.
pub fn encode_png_base64(img: &DynamicImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(Error::Encode)?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

/// Drop a leading `data:<mime>;base64,` prefix, if any.
#[must_use]
pub fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some((_, payload)) = data.split_once(',') {
            return payload;
        }
    }
    data
}
