// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Runtime backend
//!
//! Wraps an `ort` session behind the step-wise [`InferenceBackend`]
//! lifecycle. ONNX Runtime sizes tensors at `run` time, so allocation here
//! means materialising a zeroed input array of the configured shape; the
//! copy step checks the buffer against it before anything reaches the
//! runtime.

use ndarray::{ArrayD, IxDyn};
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info};
#[cfg(feature = "cuda")]
use tracing::warn;

use super::backend::{check_declared_dims, check_dims, BackendError, InferenceBackend};

/// ONNX model executed on ONNX Runtime
pub struct OnnxBackend {
    session: Session,
    model_path: String,
    input_count: usize,
    output_count: usize,
    /// Declared shape of each input; `None` axes are dynamic, `None` entries are not tensors
    input_shapes: Vec<Option<Vec<Option<usize>>>>,
    /// Shape requested through `resize_input_tensor`
    input_dims: Option<Vec<usize>>,
    /// Allocated input tensor; `None` until `allocate_tensors` succeeds
    input: Option<ArrayD<f32>>,
    outputs: Option<Vec<Vec<f32>>>,
}

impl std::fmt::Debug for OnnxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxBackend")
            .field("model_path", &self.model_path)
            .field("input_count", &self.input_count)
            .field("output_count", &self.output_count)
            .field("input_dims", &self.input_dims)
            .finish_non_exhaustive()
    }
}

fn load_failed(path: &Path, e: impl Display) -> BackendError {
    BackendError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn runtime(e: impl Display) -> BackendError {
    BackendError::Runtime(e.to_string())
}

impl OnnxBackend {
    /// Load an ONNX model from disk
    ///
    /// # Arguments
    /// - `model_path`: Path to the `.onnx` file
    /// - `intra_threads`: Intra-op thread count for ONNX Runtime
    pub fn load<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self, BackendError> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(load_failed(model_path, "file not found"));
        }

        info!(model = %model_path.display(), threads = intra_threads, "Loading ONNX model");
        let session = Self::create_session(model_path, intra_threads.max(1))?;

        let input_count = session.inputs.len();
        let output_count = session.outputs.len();
        let input_shapes: Vec<Option<Vec<Option<usize>>>> = session
            .inputs
            .iter()
            .map(|input| {
                input.input_type.tensor_shape().map(|shape| {
                    shape
                        .iter()
                        .map(|&d| usize::try_from(d).ok())
                        .collect()
                })
            })
            .collect();
        debug!(shapes = ?input_shapes, "Declared ONNX input shapes");
        info!(
            model = %model_path.display(),
            inputs = input_count,
            outputs = output_count,
            "ONNX model loaded"
        );

        Ok(Self {
            session,
            model_path: model_path.display().to_string(),
            input_count,
            output_count,
            input_shapes,
            input_dims: None,
            input: None,
            outputs: None,
        })
    }

    #[cfg(feature = "cuda")]
    fn create_session(path: &Path, threads: usize) -> Result<Session, BackendError> {
        let cuda_result = Session::builder()
            .map_err(|e| load_failed(path, e))?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .map_err(|e| load_failed(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_failed(path, e))?
            .with_intra_threads(threads)
            .map_err(|e| load_failed(path, e))?
            .commit_from_file(path);

        match cuda_result {
            Ok(session) => {
                info!("CUDA execution provider initialized");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "CUDA execution provider failed, falling back to CPU");
                Self::cpu_session(path, threads)
            }
        }
    }

    #[cfg(not(feature = "cuda"))]
    fn create_session(path: &Path, threads: usize) -> Result<Session, BackendError> {
        Self::cpu_session(path, threads)
    }

    fn cpu_session(path: &Path, threads: usize) -> Result<Session, BackendError> {
        Session::builder()
            .map_err(|e| load_failed(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_failed(path, e))?
            .with_intra_threads(threads)
            .map_err(|e| load_failed(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_failed(path, e))
    }

    fn check_input_index(&self, index: usize) -> Result<(), BackendError> {
        if index >= self.input_count {
            return Err(BackendError::IndexOutOfRange {
                index,
                count: self.input_count,
            });
        }
        Ok(())
    }
}

impl InferenceBackend for OnnxBackend {
    fn name(&self) -> &str {
        "onnx"
    }

    fn allocate_tensors(&mut self) -> Result<(), BackendError> {
        if self.input_count == 0 {
            return Err(BackendError::NoTensors("input"));
        }
        if self.output_count == 0 {
            return Err(BackendError::NoTensors("output"));
        }

        // Before any resize there is nothing to materialise; the runtime
        // keeps the model's declared shapes.
        if let Some(dims) = &self.input_dims {
            self.input = Some(ArrayD::zeros(IxDyn(dims)));
            debug!(dims = ?dims, "Allocated ONNX input tensor");
        }
        self.outputs = None;
        Ok(())
    }

    fn resize_input_tensor(&mut self, index: usize, dims: &[usize]) -> Result<(), BackendError> {
        self.check_input_index(index)?;
        check_dims(dims)?;
        if let Some(Some(declared)) = self.input_shapes.get(index) {
            check_declared_dims(declared, dims)?;
        }
        self.input_dims = Some(dims.to_vec());
        self.input = None;
        Ok(())
    }

    fn copy_input_from_buffer(&mut self, index: usize, data: &[f32]) -> Result<(), BackendError> {
        self.check_input_index(index)?;
        let input = self.input.as_mut().ok_or(BackendError::NotAllocated)?;
        if input.len() != data.len() {
            return Err(BackendError::SizeMismatch {
                expected: input.len(),
                actual: data.len(),
            });
        }
        input
            .iter_mut()
            .zip(data.iter())
            .for_each(|(dst, src)| *dst = *src);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), BackendError> {
        let input = self.input.clone().ok_or(BackendError::NotAllocated)?;
        let value = Value::from_array(input).map_err(runtime)?;

        let outputs = self.session.run(ort::inputs![value]).map_err(runtime)?;

        let mut collected = Vec::with_capacity(self.output_count);
        for index in 0..self.output_count {
            let values: Vec<f32> = match outputs[index].try_extract_array::<f32>() {
                Ok(array) => array.iter().copied().collect(),
                // Quantized classifiers commonly emit uint8 scores
                Err(f32_err) => match outputs[index].try_extract_array::<u8>() {
                    Ok(array) => array.iter().map(|&v| v as f32 / 255.0).collect(),
                    Err(_) => return Err(BackendError::UnsupportedOutputType(f32_err.to_string())),
                },
            };
            collected.push(values);
        }
        drop(outputs);

        debug!(outputs = collected.len(), "ONNX invocation finished");
        self.outputs = Some(collected);
        Ok(())
    }

    fn copy_output(&self, index: usize) -> Result<Vec<f32>, BackendError> {
        let outputs = self.outputs.as_ref().ok_or(BackendError::NotInvoked)?;
        outputs
            .get(index)
            .cloned()
            .ok_or(BackendError::IndexOutOfRange {
                index,
                count: outputs.len(),
            })
    }
}
