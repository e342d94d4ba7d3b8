//! Filesystem staging area shared by the upload, conversion and prediction paths.
//!
//! Files are never removed; every write uses a fresh UUID so concurrent requests
//! cannot collide on names.

use service_core::error::AppError;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Suffixes accepted for uploaded DICOM files (case-sensitive).
pub const DICOM_SUFFIXES: [&str; 2] = [".dcm", ".rvg"];

#[derive(Debug, Clone)]
pub struct StagingArea {
    base_path: PathBuf,
    url_prefix: String,
}

impl StagingArea {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
    ) -> Result<Self, AppError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist an uploaded DICOM blob as `temp_<uuid>.dcm` and return its path.
    pub async fn store_upload(&self, data: &[u8]) -> Result<PathBuf, AppError> {
        let path = self.base_path.join(format!("temp_{}.dcm", Uuid::new_v4()));
        fs::write(&path, data).await.map_err(|e| {
            AppError::InternalError(
                anyhow::Error::new(e).context(format!("Failed to stage upload at {:?}", path)),
            )
        })?;
        Ok(path)
    }

    /// Resolve a client-supplied name to an existing staged file.
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf, AppError> {
        if !is_safe_filename(filename) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid filename: {}",
                filename
            )));
        }

        let path = self.base_path.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(AppError::NotFound(anyhow::anyhow!("Image not found"))),
        }
    }

    /// Public URL of a staged file.
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }

    /// The staging directory must still exist for the service to do anything useful.
    pub async fn health_check(&self) -> Result<(), AppError> {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(AppError::ServiceUnavailable),
        }
    }
}

pub fn has_dicom_suffix(filename: &str) -> bool {
    DICOM_SUFFIXES
        .iter()
        .any(|suffix| filename.ends_with(suffix))
}

/// A bare file name: no separators, no parent/current directory references.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(&['/', '\\', '\0'][..])
}
