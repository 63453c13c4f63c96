//! # errshot
//!
//! Turns screenshots of operating system errors into the fixed-size input of
//! an error analysis model, and talks to the service that runs it.
//!
//! Screenshots are converted to RGB, stretched to the model size (128x128 by
//! default), scaled into [0, 1] and flattened channel-major. The resulting
//! tensor is posted to the service over HTTP; the chat assistant is reached
//! over a WebSocket.
//!
//! ## Example
//!
//! ```no_run
//! use errshot::api::InferenceClient;
//! use errshot::{ClientConfig, ImageNormalizer};
//!
//! # fn main() -> errshot::Result<()> {
//! let config = ClientConfig::default();
//! let tensor = ImageNormalizer::default().normalize_path("bsod.png")?;
//!
//! let prediction = InferenceClient::new(&config)?.predict_os_error(&tensor)?;
//! println!("{} on {}", prediction.error_type, prediction.os_type);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod image;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use crate::image::{normalize, ImageNormalizer, NormalizedTensor, ResampleFilter, TargetSize};
