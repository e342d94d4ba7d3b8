//! DICOM to PNG conversion.
//!
//! Decodes the pixel data of a DICOM file, normalizes it to 8-bit grayscale and
//! writes the result into the staging directory under a generated name.

use dicom_object::open_file;
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to read DICOM file: {0}")]
    Open(String),

    #[error("Failed to decode pixel data: {0}")]
    Decode(String),

    #[error("Unsupported pixel layout: {0}")]
    Layout(String),

    #[error("Failed to write PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Convert the DICOM file at `dicom_path` into `<uuid>.png` inside `staging_dir`
/// and return the generated file name.
///
/// Only the first frame of multi-frame objects is rendered. Stored values are used
/// as-is (no modality LUT). Blocking; call from `spawn_blocking`.
pub fn convert_dicom_to_png(
    dicom_path: &Path,
    staging_dir: &Path,
) -> Result<String, ConversionError> {
    let obj = open_file(dicom_path).map_err(|e| ConversionError::Open(e.to_string()))?;
    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let array = decoded
        .to_ndarray_with_options::<f32>(&options)
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    // (frames, rows, columns, samples)
    let shape = array.shape().to_vec();
    let [frames, rows, columns, samples] = shape[..] else {
        return Err(ConversionError::Layout(format!(
            "expected a 4-dimensional pixel array, got shape {:?}",
            shape
        )));
    };
    if frames == 0 || rows == 0 || columns == 0 {
        return Err(ConversionError::Layout(format!(
            "empty pixel array with shape {:?}",
            shape
        )));
    }

    let frame: Vec<f32> = array
        .iter()
        .take(rows * columns * samples)
        .copied()
        .collect();

    tracing::debug!(
        path = ?dicom_path,
        frames,
        rows,
        columns,
        samples,
        "Decoded DICOM pixel data"
    );

    let pixels = normalize_to_u8(&frame);
    let image = to_grayscale(columns as u32, rows as u32, samples, pixels)?;

    let filename = format!("{}.png", Uuid::new_v4());
    image.save_with_format(staging_dir.join(&filename), ImageFormat::Png)?;

    Ok(filename)
}

/// Map raw intensities onto `0..=255`.
///
/// Negatives clamp to zero, values scale by `255 / max` and truncate. A zero
/// maximum (blank image) uses a divisor of 1, giving an all-black result.
/// Multiplying before dividing keeps an input already spanning exactly `0..=255`
/// unchanged.
pub fn normalize_to_u8(values: &[f32]) -> Vec<u8> {
    let max = values
        .iter()
        .map(|&v| f64::from(v.max(0.0)))
        .fold(0.0_f64, f64::max);
    let divisor = if max > 0.0 { max } else { 1.0 };

    values
        .iter()
        .map(|&v| ((f64::from(v.max(0.0)) * 255.0) / divisor) as u8)
        .collect()
}

fn to_grayscale(
    columns: u32,
    rows: u32,
    samples: usize,
    pixels: Vec<u8>,
) -> Result<GrayImage, ConversionError> {
    let size_mismatch = || {
        ConversionError::Layout(format!(
            "pixel count does not match {}x{}x{}",
            columns, rows, samples
        ))
    };

    match samples {
        1 => GrayImage::from_raw(columns, rows, pixels).ok_or_else(size_mismatch),
        3 => RgbImage::from_raw(columns, rows, pixels)
            .map(|rgb| DynamicImage::ImageRgb8(rgb).to_luma8())
            .ok_or_else(size_mismatch),
        n => Err(ConversionError::Layout(format!(
            "{} samples per pixel is not supported",
            n
        ))),
    }
}
