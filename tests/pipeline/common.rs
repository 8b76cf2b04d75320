// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures: a fake interpreter and image/labels files on disk

use image::{ImageFormat, Rgb, RgbImage};
use image_classifier::{BackendError, InferenceBackend};
use std::path::{Path, PathBuf};

/// In-memory interpreter that returns fixed scores and keeps what it was fed
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub scores: Vec<f32>,
    pub input_dims: Option<Vec<usize>>,
    pub allocated: Option<usize>,
    pub received: Vec<f32>,
    pub invocations: usize,
}

impl FakeBackend {
    pub fn with_scores(scores: &[f32]) -> Self {
        Self {
            scores: scores.to_vec(),
            ..Default::default()
        }
    }
}

impl InferenceBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn allocate_tensors(&mut self) -> Result<(), BackendError> {
        self.allocated = self.input_dims.as_ref().map(|dims| dims.iter().product());
        Ok(())
    }

    fn resize_input_tensor(&mut self, index: usize, dims: &[usize]) -> Result<(), BackendError> {
        if index != 0 {
            return Err(BackendError::IndexOutOfRange { index, count: 1 });
        }
        self.input_dims = Some(dims.to_vec());
        self.allocated = None;
        Ok(())
    }

    fn copy_input_from_buffer(&mut self, _index: usize, data: &[f32]) -> Result<(), BackendError> {
        let expected = self.allocated.ok_or(BackendError::NotAllocated)?;
        if expected != data.len() {
            return Err(BackendError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.received = data.to_vec();
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), BackendError> {
        self.invocations += 1;
        Ok(())
    }

    fn copy_output(&self, index: usize) -> Result<Vec<f32>, BackendError> {
        if self.invocations == 0 {
            return Err(BackendError::NotInvoked);
        }
        if index != 0 {
            return Err(BackendError::IndexOutOfRange { index, count: 1 });
        }
        Ok(self.scores.clone())
    }
}

/// Deterministic test pattern
pub fn pattern(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 40) as u8, (y * 40) as u8, ((x + y) * 20) as u8])
    })
}

pub fn write_image(dir: &Path, name: &str, img: &RgbImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, format).unwrap();
    path
}

pub fn write_labels(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("labels.txt");
    std::fs::write(&path, contents).unwrap();
    path
}
