//! Crate error type.
//!
//! Recognition rejection ("retake photo") and degraded classification are
//! deliberate non-errors: they are ordinary values on the result types of
//! `vision::meter` and `classify`, so they never travel this channel.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("could not extract features: {0}")]
    FeatureExtraction(String),

    #[error("digit recognition failed: {0}")]
    Recognition(String),

    #[error("classifier artifact error: {0}")]
    Model(String),

    #[error("storage error: {0}")]
    Persistence(anyhow::Error),

    #[error("excel export error: {0}")]
    Export(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// anyhow is the store's internal error currency; it converts at the store
// boundary. Not derivable because anyhow::Error is not std::error::Error.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Persistence(err)
    }
}
