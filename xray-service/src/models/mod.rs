pub mod prediction;

pub use prediction::{Prediction, UNKNOWN_LABEL};
