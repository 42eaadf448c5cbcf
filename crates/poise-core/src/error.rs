//! Error types for the Poise system.

use thiserror::Error;

use crate::types::Modality;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No {modality} detected in frame")]
    DetectionAbsent { modality: Modality },

    #[error("Malformed {modality} landmark set: expected {expected} points, got {actual}")]
    MalformedLandmarkSet {
        modality: Modality,
        expected: usize,
        actual: usize,
    },

    #[error("Landmark provider error: {0}")]
    Provider(String),

    #[error("Frame source error: {0}")]
    Source(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the error only concerns one modality of one frame
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Error::DetectionAbsent { .. } | Error::MalformedLandmarkSet { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
