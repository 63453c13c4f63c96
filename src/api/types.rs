//! Request and response envelopes of the analysis service.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::image::NormalizedTensor;

/// Body of `POST /predict` and `POST /predict-os-error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Flattened channel-major tensor.
    pub image: Vec<f32>,
}

impl From<NormalizedTensor> for PredictRequest {
    fn from(tensor: NormalizedTensor) -> Self {
        Self {
            image: tensor.into_vec(),
        }
    }
}

impl From<&NormalizedTensor> for PredictRequest {
    fn from(tensor: &NormalizedTensor) -> Self {
        Self {
            image: tensor.to_vec(),
        }
    }
}

/// Answer of `POST /predict-os-error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsErrorPrediction {
    pub error_type: ErrorType,
    pub os_type: OsType,
    /// Softmax probability of the predicted error type, in [0, 1].
    pub confidence: f32,
    pub description: String,
}

/// Answer of `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub class: i64,
    pub confidence: f32,
}

/// Client frame on the chat socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    /// Base64 image file bytes; serialized as `null` for text-only messages.
    pub image_data: Option<String>,
}

impl ChatMessage {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            image_data: None,
        }
    }

    pub fn with_image(message: impl Into<String>, image_data: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            image_data: Some(image_data.into()),
        }
    }
}

/// Server frame on the chat socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub analysis: Option<ErrorAnalysis>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Screenshot analysis attached to a chat response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub error_type: ErrorType,
    pub os_type: OsType,
    pub confidence: f32,
    pub detailed_description: String,
    #[serde(default)]
    pub possible_causes: Vec<String>,
    #[serde(default)]
    pub solutions: Vec<String>,
}

/// Error categories the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorType {
    BlueScreenOfDeath,
    KernelPanic,
    ApplicationCrash,
    MemoryError,
    DiskError,
    NetworkError,
    PermissionDenied,
    FileNotFound,
    SystemOverload,
    DriverError,
    /// Any label the client does not know.
    Unknown,
}

impl ErrorType {
    pub const ALL: [Self; 10] = [
        Self::BlueScreenOfDeath,
        Self::KernelPanic,
        Self::ApplicationCrash,
        Self::MemoryError,
        Self::DiskError,
        Self::NetworkError,
        Self::PermissionDenied,
        Self::FileNotFound,
        Self::SystemOverload,
        Self::DriverError,
    ];

    /// Wire label of this error type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BlueScreenOfDeath => "blue_screen_of_death",
            Self::KernelPanic => "kernel_panic",
            Self::ApplicationCrash => "application_crash",
            Self::MemoryError => "memory_error",
            Self::DiskError => "disk_error",
            Self::NetworkError => "network_error",
            Self::PermissionDenied => "permission_denied",
            Self::FileNotFound => "file_not_found",
            Self::SystemOverload => "system_overload",
            Self::DriverError => "driver_error",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire label; unrecognised labels become [`ErrorType::Unknown`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .unwrap_or(Self::Unknown)
    }
}

/// Operating systems the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OsType {
    Windows,
    Linux,
    Macos,
    Unknown,
}

impl OsType {
    pub const ALL: [Self; 3] = [Self::Windows, Self::Linux, Self::Macos];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .unwrap_or(Self::Unknown)
    }
}

macro_rules! impl_label {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::from_label(s))
            }
        }

        impl From<String> for $ty {
            fn from(label: String) -> Self {
                Self::from_label(&label)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

impl_label!(ErrorType);
impl_label!(OsType);
