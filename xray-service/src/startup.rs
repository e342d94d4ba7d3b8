use crate::config::XrayConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::roboflow::{RoboflowConfig, RoboflowProvider};
use crate::services::{InferenceProvider, StagingArea, TextProvider};
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: XrayConfig,
    pub staging: StagingArea,
    pub inference: Arc<dyn InferenceProvider>,
    pub text_provider: Arc<dyn TextProvider>,
}

impl AppState {
    /// State wired to the hosted Roboflow and Gemini APIs.
    pub async fn from_config(config: XrayConfig) -> Result<Self, AppError> {
        let inference = RoboflowProvider::new(RoboflowConfig::from(&config.inference))
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Inference provider: {}", e)))?;
        let text_provider = GeminiTextProvider::new(GeminiConfig::from(&config.generation))
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Text provider: {}", e)))?;

        tracing::info!(
            model_id = %inference.model_id(),
            model = %text_provider.model(),
            "Initialized AI providers"
        );

        Self::with_providers(config, Arc::new(inference), Arc::new(text_provider)).await
    }

    pub async fn with_providers(
        config: XrayConfig,
        inference: Arc<dyn InferenceProvider>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let staging = StagingArea::new(&config.staging.dir, config.staging.route_prefix())
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize staging directory at {}: {}",
                    config.staging.dir,
                    e
                );
                e
            })?;

        Ok(Self {
            config,
            staging,
            inference,
            text_provider,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let static_prefix = state.config.staging.route_prefix().to_string();
    let body_limit = state
        .config
        .upload
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/upload", post(handlers::upload_image))
        .route("/predict", get(handlers::predict_image))
        .route("/report", post(handlers::generate_report))
        .nest_service(
            &static_prefix,
            ServeDir::new(state.staging.base_path().to_path_buf()),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .layer(from_fn_with_state(
            static_prefix.clone(),
            security_headers_middleware,
        ))
        // The browser UI is served from a different origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: XrayConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config).await?;
        Self::serve(state).await
    }

    /// Bind the configured address and prepare the server for `state`.
    pub async fn serve(state: AppState) -> Result<Self, AppError> {
        let addr = state.config.common.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, build_router(state.clone()));

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn staging(&self) -> &StagingArea {
        &self.state.staging
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
