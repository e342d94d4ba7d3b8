//! Roboflow hosted inference provider.
//!
//! Sends the staged PNG, base64 encoded, to `{api_url}/{model_id}` and returns the
//! detection JSON as received.

use super::{InferenceProvider, ProviderError};
use crate::config::InferenceConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use service_core::observability::TracedClientExt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RoboflowConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub model_id: String,
    pub timeout: Duration,
}

impl From<&InferenceConfig> for RoboflowConfig {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model_id: config.model_id.trim_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

pub struct RoboflowProvider {
    config: RoboflowConfig,
    client: Client,
}

impl RoboflowProvider {
    pub fn new(config: RoboflowConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Roboflow API key not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to build client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.config.api_url, self.config.model_id)
    }
}

#[async_trait]
impl InferenceProvider for RoboflowProvider {
    async fn infer(&self, image_path: &Path) -> Result<serde_json::Value, ProviderError> {
        let image = tokio::fs::read(image_path).await?;
        let payload = STANDARD.encode(&image);

        tracing::debug!(
            model_id = %self.config.model_id,
            image_bytes = image.len(),
            "Sending request to Roboflow"
        );

        let response = self
            .client
            .traced_post(&self.model_url())
            .query(&[("api_key", self.config.api_key.expose_secret().as_str())])
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(payload)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited(body));
            }

            return Err(ProviderError::ApiError(format!(
                "Roboflow API error {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}; body: {}", e, body)))
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str, model_id: &str, key: &str) -> InferenceConfig {
        InferenceConfig {
            api_url: api_url.to_string(),
            api_key: Secret::new(key.to_string()),
            model_id: model_id.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn model_url_joins_base_and_model() {
        let provider = RoboflowProvider::new(RoboflowConfig::from(&config(
            "https://serverless.roboflow.com/",
            "adr/6",
            "key",
        )))
        .unwrap();

        assert_eq!(provider.model_url(), "https://serverless.roboflow.com/adr/6");
        assert_eq!(provider.model_id(), "adr/6");
    }

    #[test]
    fn rejects_empty_api_key() {
        let result = RoboflowProvider::new(RoboflowConfig::from(&config(
            "https://serverless.roboflow.com",
            "adr/6",
            "",
        )));
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn unreadable_image_fails_before_any_request() {
        let provider = RoboflowProvider::new(RoboflowConfig::from(&config(
            "http://127.0.0.1:9",
            "adr/6",
            "key",
        )))
        .unwrap();

        let result = provider.infer(Path::new("no/such/image.png")).await;
        assert!(matches!(result, Err(ProviderError::Io(_))));
    }
}
