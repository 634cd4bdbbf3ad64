//! Pure image analysis: no I/O beyond the bytes handed in, no shared state.

mod digits;
pub mod features;
pub mod meter;

pub use features::{extract_features, FeatureVector};
pub use meter::{recognize_meter, MeterRecognition, RecognitionTier};
