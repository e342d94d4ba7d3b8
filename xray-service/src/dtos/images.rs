use crate::services::staging::is_safe_filename;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Path under which the converted PNG is served.
    pub image_url: String,
    pub filename: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PredictParams {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 255),
        custom(function = "validate_staged_filename")
    )]
    pub filename: String,
}

fn validate_staged_filename(filename: &str) -> Result<(), ValidationError> {
    if is_safe_filename(filename) {
        Ok(())
    } else {
        Err(ValidationError::new("unsafe_filename"))
    }
}
