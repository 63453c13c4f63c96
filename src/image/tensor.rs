//! Tensor and sizing types produced by normalization.

use std::fmt;

use image::imageops::FilterType;
use ndarray::{Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

use super::{CLASSIFIER_SIZE, RGB_CHANNELS, SCREENSHOT_SIZE};

/// Target spatial size of a normalized tensor, height first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    pub height: u32,
    pub width: u32,
}

impl TargetSize {
    /// Input size of the OS error model.
    pub const SCREENSHOT: Self = Self::square(SCREENSHOT_SIZE);

    /// Input size of the general classifier.
    pub const CLASSIFIER: Self = Self::square(CLASSIFIER_SIZE);

    /// Create a target size, rejecting zero dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if either dimension is zero.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        let size = Self { height, width };
        size.validate()?;
        Ok(size)
    }

    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self {
            height: side,
            width: side,
        }
    }

    /// Validate that both dimensions are positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the zero dimension.
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 {
            return Err(Error::InvalidParameter {
                name: "height".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.width == 0 {
            return Err(Error::InvalidParameter {
                name: "width".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Number of values in a tensor of this size, `3 * height * width`.
    #[must_use]
    pub const fn tensor_len(&self) -> usize {
        RGB_CHANNELS * self.height as usize * self.width as usize
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::SCREENSHOT
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Resampling filter used when stretching to the target size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    /// Matches what the analysis service applies to uploaded screenshots.
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => Self::Nearest,
            ResampleFilter::Triangle => Self::Triangle,
            ResampleFilter::CatmullRom => Self::CatmullRom,
            ResampleFilter::Gaussian => Self::Gaussian,
            ResampleFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Channel-major image tensor with values in [0, 1].
///
/// Stored as a `(channels, height, width)` array in standard layout, so the
/// flattened order is every red sample, then every green, then every blue,
/// each in row-major pixel order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array3<f32>,
}

impl NormalizedTensor {
    pub(crate) const fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Shape as `[channels, height, width]`.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        let (c, h, w) = self.data.dim();
        [c, h, w]
    }

    /// Spatial size of the tensor.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn size(&self) -> TargetSize {
        let [_, h, w] = self.shape();
        // Safe: built from a TargetSize, so both sides fit in u32
        TargetSize {
            height: h as u32,
            width: w as u32,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values in flattened channel-major order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.data.iter().copied()
    }

    /// One colour plane as a `(height, width)` view.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= 3`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), channel)
    }

    /// Borrow the underlying `(C, H, W)` array.
    #[must_use]
    pub const fn as_array(&self) -> &Array3<f32> {
        &self.data
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.values().collect()
    }

    /// Consume the tensor into its flattened values.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        if self.data.is_standard_layout() {
            let (values, _offset) = self.data.into_raw_vec_and_offset();
            values
        } else {
            self.to_vec()
        }
    }
}

impl Serialize for NormalizedTensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter())
    }
}
