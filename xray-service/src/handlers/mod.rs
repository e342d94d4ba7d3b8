pub mod health;
pub mod images;
pub mod reports;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use images::{predict_image, upload_image};
pub use reports::generate_report;
