// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TFLite backend executed by tract
//!
//! The flatbuffer is decoded once into a typed model. A resize pins the
//! input fact; allocation optimises a copy of the model into a runnable plan
//! for that shape.

use std::path::Path;
use tract_core::prelude::*;
use tracing::{debug, info};

use super::backend::{check_declared_dims, check_dims, BackendError, InferenceBackend};

pub struct TfliteBackend {
    model: TypedModel,
    model_path: String,
    plan: Option<TypedRunnableModel<TypedModel>>,
    input_dims: Option<Vec<usize>>,
    input: Option<Tensor>,
    outputs: Option<TVec<TValue>>,
}

fn runtime(e: impl std::fmt::Display) -> BackendError {
    BackendError::Runtime(e.to_string())
}

impl TfliteBackend {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self, BackendError> {
        let model_path = model_path.as_ref();
        info!(model = %model_path.display(), "Loading TFLite model");

        let model = tract_tflite::tflite()
            .model_for_path(model_path)
            .map_err(|e| BackendError::LoadFailed {
                path: model_path.display().to_string(),
                reason: format!("{:#}", e),
            })?;

        info!(
            model = %model_path.display(),
            inputs = model.inputs.len(),
            outputs = model.outputs.len(),
            "TFLite model loaded"
        );

        Ok(Self {
            model,
            model_path: model_path.display().to_string(),
            plan: None,
            input_dims: None,
            input: None,
            outputs: None,
        })
    }

    fn check_input_index(&self, index: usize) -> Result<(), BackendError> {
        let count = self.model.inputs.len();
        if index >= count {
            return Err(BackendError::IndexOutOfRange { index, count });
        }
        Ok(())
    }
}

impl std::fmt::Debug for TfliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfliteBackend")
            .field("model_path", &self.model_path)
            .field("input_dims", &self.input_dims)
            .field("planned", &self.plan.is_some())
            .finish_non_exhaustive()
    }
}

impl InferenceBackend for TfliteBackend {
    fn name(&self) -> &str {
        "tflite"
    }

    fn allocate_tensors(&mut self) -> Result<(), BackendError> {
        if self.model.inputs.is_empty() {
            return Err(BackendError::NoTensors("input"));
        }
        if self.model.outputs.is_empty() {
            return Err(BackendError::NoTensors("output"));
        }

        let plan = self
            .model
            .clone()
            .into_optimized()
            .and_then(|m| m.into_runnable())
            .map_err(runtime)?;
        self.plan = Some(plan);

        if let Some(dims) = &self.input_dims {
            self.input = Some(Tensor::zero::<f32>(dims).map_err(runtime)?);
            debug!(dims = ?dims, "Allocated TFLite input tensor");
        }
        self.outputs = None;
        Ok(())
    }

    fn resize_input_tensor(&mut self, index: usize, dims: &[usize]) -> Result<(), BackendError> {
        self.check_input_index(index)?;
        check_dims(dims)?;
        // TFLite inputs resize freely along every axis, but not across ranks
        let rank = self.model.input_fact(index).map_err(runtime)?.shape.rank();
        check_declared_dims(&vec![None; rank], dims)?;
        self.model
            .set_input_fact(index, f32::fact(dims.to_vec()))
            .map_err(runtime)?;
        self.input_dims = Some(dims.to_vec());
        self.plan = None;
        self.input = None;
        Ok(())
    }

    fn copy_input_from_buffer(&mut self, index: usize, data: &[f32]) -> Result<(), BackendError> {
        self.check_input_index(index)?;
        let dims = self.input_dims.as_ref().ok_or(BackendError::NotAllocated)?;
        let input = self.input.as_ref().ok_or(BackendError::NotAllocated)?;
        if input.len() != data.len() {
            return Err(BackendError::SizeMismatch {
                expected: input.len(),
                actual: data.len(),
            });
        }
        self.input = Some(Tensor::from_shape(dims, data).map_err(runtime)?);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), BackendError> {
        let plan = self.plan.as_ref().ok_or(BackendError::NotAllocated)?;
        let input = self.input.clone().ok_or(BackendError::NotAllocated)?;
        let outputs = plan.run(tvec!(input.into())).map_err(runtime)?;
        debug!(outputs = outputs.len(), "TFLite invocation finished");
        self.outputs = Some(outputs);
        Ok(())
    }

    fn copy_output(&self, index: usize) -> Result<Vec<f32>, BackendError> {
        let outputs = self.outputs.as_ref().ok_or(BackendError::NotInvoked)?;
        let value = outputs.get(index).ok_or(BackendError::IndexOutOfRange {
            index,
            count: outputs.len(),
        })?;
        let scores = value
            .cast_to::<f32>()
            .map_err(|e| BackendError::UnsupportedOutputType(e.to_string()))?;
        let slice = scores.as_slice::<f32>().map_err(runtime)?;
        Ok(slice.to_vec())
    }
}
