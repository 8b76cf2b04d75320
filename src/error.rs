// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Failure categories of a classification run and their exit codes

use thiserror::Error;

use crate::config::ConfigError;
use crate::inference::BackendError;
use crate::labels::LabelsError;
use crate::vision::ImageError;

/// Exit code for errors that have no category of their own
pub const EXIT_UNEXPECTED: i32 = 1;

/// Exit code clap uses for usage errors
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Error decoding image: {0}")]
    ImageDecode(#[source] ImageError),

    #[error("Error loading model: {0}")]
    ModelLoad(#[source] BackendError),

    #[error("Error allocating tensors: {0}")]
    TensorAllocation(#[source] BackendError),

    #[error("Error allocating tensors after resize: {0}")]
    TensorAllocationAfterResize(#[source] BackendError),

    #[error("Error resizing tensor: {0}")]
    TensorResize(#[source] BackendError),

    #[error("Error copying input from buffer: {0}")]
    InputCopy(#[source] BackendError),

    #[error("Error invoking interpreter: {0}")]
    Invoke(#[source] BackendError),

    #[error("Error copying output to buffer: {0}")]
    OutputCopy(#[source] BackendError),

    #[error("Error reading labels: {0}")]
    Labels(#[source] LabelsError),

    #[error("Labels file has {labels} labels but the model produced {scores} scores")]
    LabelCountMismatch { labels: usize, scores: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error writing output: {0}")]
    Output(String),
}

impl ClassifyError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ClassifyError::ImageDecode(_) => 3,
            ClassifyError::ModelLoad(_) => 4,
            ClassifyError::TensorAllocation(_) | ClassifyError::TensorAllocationAfterResize(_) => 5,
            ClassifyError::TensorResize(_) => 6,
            ClassifyError::InputCopy(_) | ClassifyError::OutputCopy(_) => 7,
            ClassifyError::Invoke(_) => 8,
            ClassifyError::Labels(_) => 9,
            ClassifyError::LabelCountMismatch { .. } => 10,
            ClassifyError::Config(_) => 11,
            ClassifyError::Output(_) => 12,
        }
    }
}
