//! Screenshot normalization into channel-major model input.

use std::path::Path;

use image::{imageops, DynamicImage};
use ndarray::Array3;

use crate::error::Result;

use super::{decode_base64, decode_bytes, decode_path};
use super::{NormalizedTensor, ResampleFilter, TargetSize, RGB_CHANNELS};

/// Converts images into flattened `(C, H, W)` tensors with values in [0, 1].
///
/// Every input goes through:
/// 1. Decoding the source and converting it to 3-channel RGB
/// 2. Stretching it to exactly the target size (aspect ratio is not kept)
/// 3. Scaling every sample from [0, 255] to [0, 1]
/// 4. Laying the result out channel-major
///
/// It holds no state beyond its settings, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageNormalizer {
    target: TargetSize,
    filter: ResampleFilter,
}

impl ImageNormalizer {
    /// Create a normalizer for the given target size and filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the target size has a zero dimension.
    pub fn new(target: TargetSize, filter: ResampleFilter) -> Result<Self> {
        target.validate()?;
        Ok(Self { target, filter })
    }

    #[must_use]
    pub const fn target(&self) -> TargetSize {
        self.target
    }

    #[must_use]
    pub const fn filter(&self) -> ResampleFilter {
        self.filter
    }

    /// Normalize encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] if the bytes are not an image. Nothing
    /// is resized or scaled in that case.
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<NormalizedTensor> {
        let img = decode_bytes(bytes)?;
        Ok(self.normalize_image(&img))
    }

    /// Normalize an image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn normalize_path<P: AsRef<Path>>(&self, path: P) -> Result<NormalizedTensor> {
        let img = decode_path(path)?;
        Ok(self.normalize_image(&img))
    }

    /// Normalize a base64 image payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid base64 or not an image.
    pub fn normalize_base64(&self, data: &str) -> Result<NormalizedTensor> {
        let img = decode_base64(data)?;
        Ok(self.normalize_image(&img))
    }

    /// Normalize an already decoded image.
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalize_image(&self, img: &DynamicImage) -> NormalizedTensor {
        let rgb = img.to_rgb8();
        let TargetSize { height, width } = self.target;

        // Resize unconditionally so every input goes through the same filter
        let resized = imageops::resize(&rgb, width, height, self.filter.into());

        tracing::debug!(
            "Normalizing {}x{} image to {}",
            img.width(),
            img.height(),
            self.target
        );

        let shape = (RGB_CHANNELS, height as usize, width as usize);
        // Safe: x, y are bounded by the target size which is a u32
        let data = Array3::from_shape_fn(shape, |(c, y, x)| {
            f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0
        });

        NormalizedTensor::from_array(data)
    }
}

/// Normalize encoded image bytes to `target` with the default filter.
///
/// # Errors
///
/// Returns an error if the target size is invalid or the bytes are not an image.
pub fn normalize(bytes: &[u8], target: TargetSize) -> Result<NormalizedTensor> {
    ImageNormalizer::new(target, ResampleFilter::default())?.normalize_bytes(bytes)
}
