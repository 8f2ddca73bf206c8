//! Capacity forecasting library for VM memory usage
//!
//! This crate provides the core functionality for:
//! - Daily usage series preparation
//! - Multi-model forecast comparison and best-model selection
//! - Capacity risk and cut-date classification
//! - Historical data access and batch orchestration
//! - VM profile clustering
//! - Sentence embeddings from exported ONNX models

pub mod cluster;
pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod risk;
pub mod series;
pub mod store;

pub use config::ForecastConfig;
pub use embedding::SentenceEmbedder;
pub use error::{ClusterError, ConfigError, EmbeddingError, ForecastError};
pub use evaluator::CapacityEvaluator;
pub use models::*;
pub use observability::StructuredLogger;
pub use series::UsageSeries;
pub use store::{MemoryStore, PgUsageStore, UsageStore};
