use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_UPLOAD_MAX_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct XrayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub staging: StagingConfig,
    pub upload: UploadConfig,
    pub inference: InferenceConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagingConfig {
    /// Directory holding uploaded DICOM blobs and converted PNGs.
    pub dir: String,
    /// URL prefix the directory is served under, e.g. `/static/converted`.
    pub url_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub model_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub api_base: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl XrayConfig {
    pub fn load() -> Result<Self, AppError> {
        // Handles .env and the APP__ prefix
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let config = XrayConfig {
            common: common_config,
            staging: StagingConfig {
                dir: get_env("STAGING_DIR", Some("static/converted"), is_prod)?,
                url_prefix: get_env("STAGING_URL_PREFIX", Some("/static/converted"), is_prod)?,
            },
            upload: UploadConfig {
                max_bytes: get_parsed(
                    "UPLOAD_MAX_BYTES",
                    DEFAULT_UPLOAD_MAX_BYTES,
                    is_prod,
                )?,
            },
            inference: InferenceConfig {
                api_url: get_env(
                    "ROBOFLOW_API_URL",
                    Some("https://serverless.roboflow.com"),
                    is_prod,
                )?,
                api_key: Secret::new(get_env("ROBOFLOW_API_KEY", None, is_prod)?),
                model_id: get_env("ROBOFLOW_MODEL_ID", Some("adr/6"), is_prod)?,
                timeout_secs: get_parsed(
                    "INFERENCE_TIMEOUT_SECS",
                    DEFAULT_INFERENCE_TIMEOUT_SECS,
                    is_prod,
                )?,
            },
            generation: GenerationConfig {
                api_base: get_env(
                    "GEMINI_API_BASE",
                    Some("https://generativelanguage.googleapis.com/v1beta"),
                    is_prod,
                )?,
                api_key: Secret::new(get_env("GEMINI_API_KEY", None, is_prod)?),
                model: get_env("GEMINI_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                timeout_secs: get_parsed(
                    "GENERATION_TIMEOUT_SECS",
                    DEFAULT_GENERATION_TIMEOUT_SECS,
                    is_prod,
                )?,
            },
        };

        config.staging.validate()?;
        Ok(config)
    }
}

impl StagingConfig {
    /// The prefix becomes a nested route, so it must be an absolute, non-root path.
    pub fn validate(&self) -> Result<(), AppError> {
        let prefix = self.url_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') || prefix.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STAGING_URL_PREFIX must be an absolute path other than '/', got '{}'",
                self.url_prefix
            )));
        }
        Ok(())
    }

    /// Prefix without a trailing slash.
    pub fn route_prefix(&self) -> &str {
        self.url_prefix.trim_end_matches('/')
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(&default.to_string()), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}
