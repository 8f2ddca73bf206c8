//! Error types for the capacity forecaster

use thiserror::Error;

/// Failures of the per-VM forecasting pipeline and the batch listing step
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Fewer historical records than the training and test windows require
    #[error("Not enough data for VM: {vm}")]
    InsufficientData {
        vm: String,
        found: usize,
        required: usize,
    },

    /// A model variant failed to fit or to produce a usable prediction
    #[error("{model} failed: {reason}")]
    ModelFit { model: String, reason: String },

    /// The set of known identifiers could not be listed
    #[error("Failed to list VMs: {0}")]
    Lookup(String),

    /// Any other data-store failure
    #[error("Data store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl ForecastError {
    pub fn model_fit(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelFit {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

/// Rejected evaluator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("history_start {start} is after history_end {end}")]
    InvertedWindow {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("min_train_days ({min_train_days}) must be at least test_days + 2 * season_period ({required})")]
    TrainingTooShort {
        min_train_days: usize,
        required: usize,
    },

    #[error("{field} is too large")]
    Overflow { field: &'static str },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Failures loading or applying a cluster model
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Failed to read cluster model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse cluster model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cluster model expects {expected} features, input has {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Cluster model has no centroids")]
    NoCentroids,
}

/// Failures loading or running a sentence embedding model
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Failed to read embedding model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load tokenizer: {0}")]
    Tokenizer(String),

    #[error("ONNX model error: {0}")]
    Model(#[from] anyhow::Error),

    #[error("Unsupported model input: {0}")]
    UnsupportedInput(String),

    #[error("Unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),

    #[error("Text produced no tokens")]
    EmptyInput,
}
