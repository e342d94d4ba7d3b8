use crate::dtos::ReportResponse;
use crate::services::build_report_prompt;
use crate::services::metrics::record_provider_call;
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use serde_json::Value;
use service_core::error::AppError;
use std::time::Instant;

/// Generate a patient-facing report from detection results.
///
/// The body is parsed as JSON whatever its content type. Only the `predictions`
/// field is read; when it is missing or empty the report is still generated from
/// a no-findings prompt.
pub async fn generate_report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejecting report request body: {}", e);
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON request"))
    })?;
    let request = request
        .as_object()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid JSON request")))?;

    let prompt = build_report_prompt(request.get("predictions"));

    let started = Instant::now();
    let result = state.text_provider.generate(&prompt).await;
    record_provider_call("generation", &result, started);

    let response = result.map_err(|e| {
        tracing::error!(model = %state.text_provider.model(), "Report generation failed: {}", e);
        AppError::GenerationError(format!("Failed to generate report: {}", e))
    })?;

    tracing::info!(
        model = %state.text_provider.model(),
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        finish_reason = ?response.finish_reason,
        "Generated report"
    );

    let report = response.text.ok_or_else(|| {
        AppError::GenerationError("Failed to generate report: no text in response".to_string())
    })?;

    Ok(Json(ReportResponse { report }))
}
