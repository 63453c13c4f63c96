//! Clients and wire types for the OS error analysis service.

mod chat;
mod http;
mod types;

pub use chat::ChatClient;
pub use http::InferenceClient;
pub use types::{
    ChatMessage, ChatResponse, ClassPrediction, ErrorAnalysis, ErrorType, OsErrorPrediction,
    OsType, PredictRequest,
};
