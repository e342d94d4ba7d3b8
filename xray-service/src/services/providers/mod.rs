//! Hosted AI provider abstractions and implementations.
//!
//! Detection and report generation both go to third-party HTTP APIs. Each sits
//! behind a trait so handlers can be exercised against the mocks.

pub mod gemini;
pub mod mock;
pub mod roboflow;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Non-success response; carries status and the raw response body.
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a text generation call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text, if the provider returned any.
    pub text: Option<String>,

    pub input_tokens: i32,

    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

/// Text generation (report writing).
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;
}

/// Object detection on a staged raster image.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run the configured model on the image at `image_path` and return the
    /// service's JSON response untouched.
    async fn infer(&self, image_path: &Path) -> Result<serde_json::Value, ProviderError>;

    fn model_id(&self) -> &str;
}
