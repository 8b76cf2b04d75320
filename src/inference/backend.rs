// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime-agnostic interpreter interface
//!
//! Backends expose the same step-by-step lifecycle as an interpreter:
//! allocate, resize the input, allocate again, copy the input in, invoke,
//! then read the output back. Each step fails independently so callers can
//! report exactly where a run stopped.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to load model from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Model has no {0} tensors")]
    NoTensors(&'static str),

    #[error("Tensor index {index} out of range (model has {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Invalid tensor dimensions {0:?}")]
    InvalidDims(Vec<usize>),

    #[error("Requested input dimensions {requested:?} do not fit the model input {declared}")]
    IncompatibleDims { requested: Vec<usize>, declared: String },

    #[error("Input tensor has not been allocated")]
    NotAllocated,

    #[error("Buffer holds {actual} elements but tensor expects {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Interpreter has not been invoked")]
    NotInvoked,

    #[error("Unsupported output element type: {0}")]
    UnsupportedOutputType(String),

    #[error("{0} support not compiled in (rebuild with --features {1})")]
    FeatureDisabled(&'static str, &'static str),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// The inference runtime used to execute a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ONNX Runtime
    Onnx,
    /// TensorFlow Lite flatbuffers, executed by tract
    Tflite,
}

impl BackendKind {
    /// Pick a backend from the model file extension; anything that is not
    /// `.tflite` goes to ONNX Runtime.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tflite") => BackendKind::Tflite,
            _ => BackendKind::Onnx,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Onnx => "onnx",
            BackendKind::Tflite => "tflite",
        }
    }
}

/// Step-wise interpreter over a single loaded model
pub trait InferenceBackend {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Allocate (or reallocate after a resize) the model's tensors
    fn allocate_tensors(&mut self) -> Result<(), BackendError>;

    /// Change the shape of input tensor `index`; takes effect on the next
    /// [`allocate_tensors`](Self::allocate_tensors)
    fn resize_input_tensor(&mut self, index: usize, dims: &[usize]) -> Result<(), BackendError>;

    /// Copy `data` into the allocated input tensor `index`
    fn copy_input_from_buffer(&mut self, index: usize, data: &[f32]) -> Result<(), BackendError>;

    /// Run the graph
    fn invoke(&mut self) -> Result<(), BackendError>;

    /// Copy output tensor `index` of the last invocation out as `f32`
    fn copy_output(&self, index: usize) -> Result<Vec<f32>, BackendError>;
}

/// Validate requested dimensions: non-empty and no zero-sized axis
pub(crate) fn check_dims(dims: &[usize]) -> Result<(), BackendError> {
    if dims.is_empty() || dims.contains(&0) {
        return Err(BackendError::InvalidDims(dims.to_vec()));
    }
    Ok(())
}

/// Check requested dimensions against a model's declared input shape
///
/// `None` marks a dynamic axis that accepts any size.
pub(crate) fn check_declared_dims(
    declared: &[Option<usize>],
    dims: &[usize],
) -> Result<(), BackendError> {
    let fits = declared.len() == dims.len()
        && declared
            .iter()
            .zip(dims)
            .all(|(axis, &dim)| axis.map_or(true, |fixed| fixed == dim));
    if fits {
        return Ok(());
    }

    let axes = declared
        .iter()
        .map(|axis| axis.map_or_else(|| "?".to_string(), |d| d.to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    Err(BackendError::IncompatibleDims {
        requested: dims.to_vec(),
        declared: format!("[{}]", axes),
    })
}
