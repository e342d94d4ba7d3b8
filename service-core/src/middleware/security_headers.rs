use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};

/// Hardening headers for API responses.
///
/// Requests under `static_prefix` are images embedded by a browser UI served from
/// another origin, so they get `Cross-Origin-Resource-Policy: cross-origin` instead
/// of the same-origin default. Install with `from_fn_with_state(prefix, ...)`.
pub async fn security_headers_middleware(
    State(static_prefix): State<String>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    let is_static_route = req.uri().path().starts_with(&static_prefix);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    let corp = if is_static_route {
        "cross-origin"
    } else {
        "same-origin"
    };
    headers.insert(
        "cross-origin-resource-policy",
        header::HeaderValue::from_static(corp),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http, middleware::from_fn_with_state, routing::get};
    use tower::util::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/report", get(|| async { "ok" }))
            .route("/static/converted/a.png", get(|| async { "png" }))
            .layer(from_fn_with_state(
                "/static/converted".to_string(),
                security_headers_middleware,
            ))
    }

    async fn corp_for(uri: &str) -> String {
        let response = app()
            .oneshot(http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        response.headers()["cross-origin-resource-policy"]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn staged_images_are_embeddable_cross_origin() {
        assert_eq!(corp_for("/static/converted/a.png").await, "cross-origin");
    }

    #[tokio::test]
    async fn api_routes_stay_same_origin() {
        assert_eq!(corp_for("/report").await, "same-origin");
    }
}
