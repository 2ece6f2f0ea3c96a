//! Request-time causality inference: encode, predict, decode.

pub mod artifacts;
pub mod classifier;
pub mod encoders;
pub mod pipeline;

use polars::prelude::PolarsError;
use thiserror::Error;

pub use artifacts::{ArtifactPaths, ArtifactSource};
pub use classifier::{LinearClassifier, ModelArtifact};
pub use encoders::{FittedField, OneHotEncoder, OrdinalEncoder};
pub use pipeline::{InferenceEngine, Prediction, PREDICTION_COLUMNS};

/// Failures of the inference pipeline. None of them are retried.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Input value never seen when the encoder was fitted.
    #[error("unknown category {value:?} for field {field:?}")]
    UnknownCategory { field: String, value: String },
    /// Columns handed to a stage differ from what it was fitted on.
    #[error("feature schema mismatch: expected {expected:?}, found {found:?}")]
    FeatureSchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("class code {0} has no label in the ordinal encoder")]
    UnknownClassCode(usize),
    #[error("classifier returned no prediction")]
    EmptyPrediction,
    #[error("artifact {path} unavailable: {reason}")]
    ArtifactUnavailable { path: String, reason: String },
    #[error("artifact {artifact} is invalid: {reason}")]
    ArtifactInvalid { artifact: String, reason: String },
    #[error("feature frame error: {0}")]
    Frame(#[from] PolarsError),
}

impl InferenceError {
    /// Whether the failure is caused by the submitted record rather than the service.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCategory { .. } | Self::FeatureSchemaMismatch { .. }
        )
    }
}
