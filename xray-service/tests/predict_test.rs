mod common;

use common::TestApp;
use reqwest::Client;

#[tokio::test]
async fn predict_returns_inference_json_verbatim() {
    let app = TestApp::spawn().await;
    let filename = app.upload_sample().await;

    let response = Client::new()
        .get(format!("{}/predict", app.address))
        .query(&[("filename", filename.as_str())])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["inference_id"], "mock-inference");
    assert_eq!(body["image"]["width"], 4);
    assert_eq!(body["predictions"][0]["class"], "cavity");
    assert_eq!(body["predictions"][0]["detection_id"], "mock-detection");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_image_is_not_found() {
    let app = TestApp::spawn().await;

    let response = Client::new()
        .get(format!("{}/predict", app.address))
        .query(&[("filename", "does-not-exist.png")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Image not found");

    app.cleanup().await;
}

#[tokio::test]
async fn path_traversal_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    for filename in ["../Cargo.toml", "nested/x.png", ""] {
        let response = client
            .get(format!("{}/predict", app.address))
            .query(&[("filename", filename)])
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 400, "{:?} was accepted", filename);
    }

    let response = client
        .get(format!("{}/predict", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn inference_failure_is_reported() {
    let app = TestApp::spawn_with(false, true).await;
    let filename = app.upload_sample().await;

    let response = Client::new()
        .get(format!("{}/predict", app.address))
        .query(&[("filename", filename.as_str())])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Inference request failed"));
    assert!(error.contains("invalid api key"));

    app.cleanup().await;
}
