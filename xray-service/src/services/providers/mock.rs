//! Mock provider implementations for testing.

use super::{FinishReason, InferenceProvider, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

/// Mock text provider for testing. Echoes the prompt back as the report.
pub struct MockTextProvider {
    enabled: bool,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::ApiError(
                "Mock API error 503: {\"error\": \"mock text provider disabled\"}".to_string(),
            ));
        }

        Ok(ProviderResponse {
            text: Some(format!("Mock response for: {}", prompt)),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    fn model(&self) -> &str {
        "mock-text"
    }
}

/// Mock inference provider for testing. Returns a fixed single-detection payload
/// shaped like a hosted object-detection response.
pub struct MockInferenceProvider {
    enabled: bool,
}

impl MockInferenceProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn infer(&self, image_path: &Path) -> Result<serde_json::Value, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::ApiError(
                "Mock API error 401: {\"message\": \"invalid api key\"}".to_string(),
            ));
        }

        let image = image::open(image_path)
            .map_err(|e| ProviderError::InvalidResponse(format!("unreadable image: {}", e)))?;

        Ok(json!({
            "inference_id": "mock-inference",
            "time": 0.01,
            "image": { "width": image.width(), "height": image.height() },
            "predictions": [{
                "x": 1.0,
                "y": 1.0,
                "width": 2.0,
                "height": 2.0,
                "confidence": 0.92,
                "class": "cavity",
                "class_id": 0,
                "detection_id": "mock-detection"
            }]
        }))
    }

    fn model_id(&self) -> &str {
        "mock/1"
    }
}
