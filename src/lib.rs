pub mod analysis;
pub mod classify;
pub mod db;
pub mod decision;
pub mod error;
pub mod export;
pub mod metrics;
mod utils;
pub mod vision;

pub use analysis::{
    AnalysisController, MeterOutcome, MeterPhotoContext, MeterReport, QualityReport,
    QualitySampleContext,
};
pub use classify::{QualityClassifier, QualityVerdict, SafetyStatus};
pub use db::Database;
pub use error::{Error, Result};
