pub mod images;
pub mod reports;

pub use images::{PredictParams, UploadResponse};
pub use reports::ReportResponse;
