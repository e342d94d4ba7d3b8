use crate::dtos::{PredictParams, UploadResponse};
use crate::services::convert_dicom_to_png;
use crate::services::metrics::{outcome, record_provider_call};
use crate::services::staging::{has_dicom_suffix, DICOM_SUFFIXES};
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::time::Instant;
use validator::Validate;

/// Multipart part carrying the DICOM file.
const UPLOAD_FIELD: &str = "file";

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_bytes = state.config.upload.max_bytes;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", max_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file bytes", max_bytes))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    if !has_dicom_suffix(&file_name) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid file format. Use {}",
            DICOM_SUFFIXES.join(" or ")
        )));
    }

    if data.len() > max_bytes {
        return Err(file_too_large(max_bytes));
    }

    let dicom_path = state.staging.store_upload(&data).await?;
    tracing::info!(
        original_name = %file_name,
        size = data.len(),
        staged_as = ?dicom_path,
        "Stored DICOM upload"
    );

    let staging_dir = state.staging.base_path().to_path_buf();
    let result =
        tokio::task::spawn_blocking(move || convert_dicom_to_png(&dicom_path, &staging_dir))
            .await
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Conversion task failed: {}", e))
            })?;

    metrics::counter!("dicom_conversions_total", "outcome" => outcome(&result)).increment(1);

    let filename = result.map_err(|e| {
        tracing::warn!(original_name = %file_name, "DICOM conversion failed: {}", e);
        AppError::DecodeError(e.to_string())
    })?;

    tracing::info!(filename = %filename, "Converted DICOM to PNG");

    Ok(Json(UploadResponse {
        image_url: state.staging.public_url(&filename),
        filename,
    }))
}

fn file_too_large(max_bytes: usize) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("File too large (max {} bytes)", max_bytes))
}

/// A body cut off by the router limit reports the size cause, not a parse failure.
fn multipart_error(err: MultipartError, context: &str, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return file_too_large(max_bytes);
    }
    AppError::BadRequest(anyhow::anyhow!("{}: {}", context, err))
}

pub async fn predict_image(
    State(state): State<AppState>,
    Query(params): Query<PredictParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;

    let image_path = state.staging.resolve(&params.filename).await?;

    let started = Instant::now();
    let result = state.inference.infer(&image_path).await;
    record_provider_call("inference", &result, started);

    let predictions = result.map_err(|e| {
        tracing::error!(
            filename = %params.filename,
            model_id = %state.inference.model_id(),
            "Inference failed: {}",
            e
        );
        AppError::InferenceError(format!("Inference request failed: {}", e))
    })?;

    Ok(Json(predictions))
}
