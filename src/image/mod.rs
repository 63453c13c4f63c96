//! Image decoding, normalization, encoding and sample generation.

mod encode;
mod load;
mod normalize;
mod save;
mod tensor;

pub use encode::{encode_file_base64, encode_png_base64, strip_data_url};
pub use load::{decode_base64, decode_bytes, decode_path};
pub use normalize::{normalize, ImageNormalizer};
pub use save::{random_noise, save_sample, solid_color};
pub use tensor::{NormalizedTensor, ResampleFilter, TargetSize};

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Side length of the screenshot input expected by the OS error model.
pub const SCREENSHOT_SIZE: u32 = 128;

/// Side length of the input expected by the general classifier.
pub const CLASSIFIER_SIZE: u32 = 32;
