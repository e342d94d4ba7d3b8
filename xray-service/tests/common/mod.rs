#![allow(dead_code)]

use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::tags;
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use xray_service::config::{
    GenerationConfig, InferenceConfig, StagingConfig, UploadConfig, XrayConfig,
};
use xray_service::services::providers::mock::{MockInferenceProvider, MockTextProvider};
use xray_service::services::{InferenceProvider, TextProvider};
use xray_service::startup::{AppState, Application};

/// Digital intra-oral X-ray image storage.
pub const INTRAORAL_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.1.3";
/// Explicit VR little endian.
pub const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

pub const STATIC_PREFIX: &str = "/static/converted";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub staging_path: PathBuf,
}

impl TestApp {
    /// Spawn the app with mock providers that succeed.
    pub async fn spawn() -> Self {
        Self::spawn_with(true, true).await
    }

    pub async fn spawn_with(inference_enabled: bool, generation_enabled: bool) -> Self {
        Self::spawn_with_providers(
            Arc::new(MockInferenceProvider::new(inference_enabled)),
            Arc::new(MockTextProvider::new(generation_enabled)),
        )
        .await
    }

    pub async fn spawn_with_providers(
        inference: Arc<dyn InferenceProvider>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Self {
        let staging_dir = format!("target/test-staging-{}", Uuid::new_v4());
        let config = test_config(&staging_dir);

        let state = AppState::with_providers(config, inference, text_provider)
            .await
            .expect("Failed to build application state");

        let app = Application::serve(state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let staging_path = app.staging().base_path().to_path_buf();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            staging_path,
        }
    }

    /// Upload `bytes` as `file_name` through the multipart endpoint.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> reqwest::Response {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name.to_string())
                .mime_str("application/dicom")
                .unwrap(),
        );

        reqwest::Client::new()
            .post(format!("{}/upload", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Upload a valid DICOM and return the generated PNG name.
    pub async fn upload_sample(&self) -> String {
        let response = self.upload("sample.dcm", gradient_dicom(4, 4)).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        body["filename"].as_str().unwrap().to_string()
    }

    /// Remove the staging directory.
    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.staging_path).await;
    }
}

pub fn test_config(staging_dir: &str) -> XrayConfig {
    XrayConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        },
        staging: StagingConfig {
            dir: staging_dir.to_string(),
            url_prefix: STATIC_PREFIX.to_string(),
        },
        upload: UploadConfig {
            max_bytes: 1024 * 1024,
        },
        inference: InferenceConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: Secret::new("test-roboflow-key".to_string()),
            model_id: "adr/6".to_string(),
            timeout_secs: 1,
        },
        generation: GenerationConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            api_key: Secret::new("test-gemini-key".to_string()),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 1,
        },
    }
}

/// Serialize a single-frame 16-bit MONOCHROME2 DICOM file with the given pixels.
pub fn monochrome_dicom(rows: u16, columns: u16, pixels: Vec<u16>) -> Vec<u8> {
    multiframe_dicom(rows, columns, 1, pixels)
}

/// Serialize a 16-bit MONOCHROME2 DICOM file; `pixels` holds the frames back to back.
pub fn multiframe_dicom(rows: u16, columns: u16, frames: u32, pixels: Vec<u16>) -> Vec<u8> {
    assert_eq!(
        pixels.len(),
        rows as usize * columns as usize * frames as usize
    );

    let sop_instance_uid = format!("2.25.{}", Uuid::new_v4().as_u128());

    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(INTRAORAL_SOP_CLASS_UID),
    ));
    obj.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(sop_instance_uid.as_str()),
    ));
    obj.put(DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("IO")));
    obj.put(DataElement::new(
        tags::SAMPLES_PER_PIXEL,
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    if frames > 1 {
        obj.put(DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(frames.to_string()),
        ));
    }
    obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)));
    obj.put(DataElement::new(
        tags::COLUMNS,
        VR::US,
        PrimitiveValue::from(columns),
    ));
    obj.put(DataElement::new(
        tags::BITS_ALLOCATED,
        VR::US,
        PrimitiveValue::from(16_u16),
    ));
    obj.put(DataElement::new(
        tags::BITS_STORED,
        VR::US,
        PrimitiveValue::from(16_u16),
    ));
    obj.put(DataElement::new(
        tags::HIGH_BIT,
        VR::US,
        PrimitiveValue::from(15_u16),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(pixels.into()),
    ));

    let file_obj = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LE)
                .media_storage_sop_class_uid(INTRAORAL_SOP_CLASS_UID)
                .media_storage_sop_instance_uid(sop_instance_uid),
        )
        .expect("Failed to build file meta group");

    let mut bytes = Vec::new();
    file_obj
        .write_all(&mut bytes)
        .expect("Failed to serialize DICOM");
    bytes
}

/// 12-bit ramp, brightest in the last pixel.
pub fn gradient_dicom(rows: u16, columns: u16) -> Vec<u8> {
    let count = rows as usize * columns as usize;
    let pixels = (0..count)
        .map(|i| ((i * 4095) / (count - 1).max(1)) as u16)
        .collect();
    monochrome_dicom(rows, columns, pixels)
}
