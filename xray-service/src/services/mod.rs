pub mod dicom;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod staging;

pub use dicom::{convert_dicom_to_png, ConversionError};
pub use metrics::{get_metrics, init_metrics};
pub use prompt::build_report_prompt;
pub use providers::{InferenceProvider, ProviderError, TextProvider};
pub use staging::StagingArea;
