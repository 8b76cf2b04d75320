// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model execution backends

pub mod backend;
pub mod onnx;
#[cfg(feature = "tflite")]
pub mod tflite;

pub use backend::{BackendError, BackendKind, InferenceBackend};
pub use onnx::OnnxBackend;
#[cfg(feature = "tflite")]
pub use tflite::TfliteBackend;

use std::path::Path;

/// Load `model_path` on the requested runtime
pub fn load_backend(
    kind: BackendKind,
    model_path: &Path,
    intra_threads: usize,
) -> Result<Box<dyn InferenceBackend>, BackendError> {
    match kind {
        BackendKind::Onnx => Ok(Box::new(OnnxBackend::load(model_path, intra_threads)?)),
        #[cfg(feature = "tflite")]
        BackendKind::Tflite => Ok(Box::new(TfliteBackend::load(model_path)?)),
        #[cfg(not(feature = "tflite"))]
        BackendKind::Tflite => Err(BackendError::FeatureDisabled("TFLite", "tflite")),
    }
}
