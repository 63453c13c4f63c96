//! Synthetic sample images and saving utilities.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// JPEG quality used when saving samples with a `.jpg` or `.jpeg` extension.
const JPEG_QUALITY: u8 = 95;

/// Create an image filled with a single RGB colour.
#[must_use]
pub fn solid_color(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Create an image of uniformly random RGB samples.
///
/// With a seed the output is reproducible; without one the OS RNG seeds it.
#[must_use]
pub fn random_noise(width: u32, height: u32, seed: Option<u64>) -> DynamicImage {
    let mut rng = seed.map_or_else(rand::rngs::StdRng::from_os_rng, rand::rngs::StdRng::seed_from_u64);

    let mut img = RgbImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = Rgb(rng.random());
    }

    DynamicImage::ImageRgb8(img)
}

/// Save an image to disk, inferring the format from the extension.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoded.
pub fn save_sample<P: AsRef<Path>>(img: &DynamicImage, path: P) -> Result<()> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Saved {}x{} sample to {}", img.width(), img.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let a = random_noise(32, 32, Some(1));
        let b = random_noise(32, 32, Some(1));
        let c = random_noise(32, 32, Some(2));

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blue.png");
        save_sample(&solid_color(100, 100, [0, 0, 255]), &path).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (100, 100));
        assert_eq!(reloaded.get_pixel(50, 50), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_save_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.jpg");
        save_sample(&random_noise(32, 32, Some(3)), &path).unwrap();

        assert_eq!(image::open(&path).unwrap().width(), 32);
    }

    #[test]
    fn test_save_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_sample(&solid_color(2, 2, [1, 2, 3]), dir.path().join("x.unknownext"))
            .unwrap_err();
        assert!(matches!(err, Error::ImageSave { .. }));
    }
}
