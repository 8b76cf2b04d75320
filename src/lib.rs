// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod labels;
pub mod report;
pub mod vision;

// Re-export main types
pub use classifier::{classify, classify_with_backend, run};
pub use config::{ClassifierConfig, ConfigError, FileConfig};
pub use error::ClassifyError;
pub use inference::{BackendError, BackendKind, InferenceBackend};
pub use report::{ClassificationReport, OutputFormat, Prediction};
pub use vision::{InputShape, NormalizationParams, TensorLayout};
