// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for classification models
//!
//! Turns decoded RGB8 pixels into the flat `f32` buffer copied into the
//! model's input tensor:
//! 1. Resize to the model input size when the image does not already match
//! 2. Normalize every channel value: (pixel - mean) / std
//! 3. Lay the values out as NHWC or NCHW

use clap::ValueEnum;
use image::{imageops::FilterType, RgbImage};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGB input, always three channels
pub const CHANNELS: usize = 3;

/// Default model input height/width (MobileNet-style classifiers)
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Default mean; together with [`DEFAULT_STD`] maps 0..=255 onto 0.0..=1.0
pub const DEFAULT_MEAN: f32 = 0.0;

/// Default standard deviation
pub const DEFAULT_STD: f32 = 255.0;

/// Largest input tensor accepted, in `f32` elements (4096x4096 RGB fits)
pub const MAX_INPUT_ELEMENTS: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum PreprocessError {
    #[error("Normalization std must be finite and nonzero, got {0}")]
    InvalidStd(f32),

    #[error("Normalization mean must be finite, got {0}")]
    InvalidMean(f32),

    #[error("Input dimensions must be nonzero, got {height}x{width}")]
    ZeroDimension { height: u32, width: u32 },

    #[error("Input size {height}x{width} exceeds {max} tensor elements")]
    TooLarge { height: u32, width: u32, max: u64 },
}

/// Memory layout of the input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[1, height, width, 3]`, the TFLite convention
    #[default]
    Nhwc,
    /// `[1, 3, height, width]`, common for ONNX exports
    Nchw,
}

/// Affine pixel normalization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: f32,
    pub std: f32,
}

impl NormalizationParams {
    pub fn new(mean: f32, std: f32) -> Result<Self, PreprocessError> {
        if !mean.is_finite() {
            return Err(PreprocessError::InvalidMean(mean));
        }
        if !std.is_finite() || std == 0.0 {
            return Err(PreprocessError::InvalidStd(std));
        }
        Ok(Self { mean, std })
    }

    #[inline]
    pub fn normalize(&self, pixel: u8) -> f32 {
        (pixel as f32 - self.mean) / self.std
    }

    /// Inverse of [`normalize`](Self::normalize)
    #[inline]
    pub fn denormalize(&self, value: f32) -> f32 {
        value * self.std + self.mean
    }
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self {
            mean: DEFAULT_MEAN,
            std: DEFAULT_STD,
        }
    }
}

/// Spatial input size plus layout of the model input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub height: u32,
    pub width: u32,
    pub layout: TensorLayout,
}

impl InputShape {
    pub fn new(height: u32, width: u32, layout: TensorLayout) -> Result<Self, PreprocessError> {
        if height == 0 || width == 0 {
            return Err(PreprocessError::ZeroDimension { height, width });
        }
        let elements = u64::from(height)
            .checked_mul(u64::from(width))
            .and_then(|n| n.checked_mul(CHANNELS as u64));
        if !matches!(elements, Some(n) if n <= MAX_INPUT_ELEMENTS) {
            return Err(PreprocessError::TooLarge {
                height,
                width,
                max: MAX_INPUT_ELEMENTS,
            });
        }
        Ok(Self {
            height,
            width,
            layout,
        })
    }

    /// Tensor dimensions including the batch axis
    pub fn dims(&self) -> [usize; 4] {
        let (h, w) = (self.height as usize, self.width as usize);
        match self.layout {
            TensorLayout::Nhwc => [1, h, w, CHANNELS],
            TensorLayout::Nchw => [1, CHANNELS, h, w],
        }
    }

    /// Number of `f32` elements in the input tensor
    pub fn element_count(&self) -> usize {
        self.height as usize * self.width as usize * CHANNELS
    }
}

impl Default for InputShape {
    fn default() -> Self {
        Self {
            height: DEFAULT_INPUT_SIZE,
            width: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Resize, normalize and lay out an RGB image for the model input tensor
pub fn preprocess(image: &RgbImage, shape: &InputShape, params: &NormalizationParams) -> Vec<f32> {
    if image.dimensions() == (shape.width, shape.height) {
        return to_tensor_data(image, shape.layout, params);
    }

    tracing::debug!(
        from_width = image.width(),
        from_height = image.height(),
        to_width = shape.width,
        to_height = shape.height,
        "Resizing image to model input size"
    );
    let resized = image::imageops::resize(image, shape.width, shape.height, FilterType::Triangle);
    to_tensor_data(&resized, shape.layout, params)
}

/// Normalize an RGB image without resizing it
pub fn to_tensor_data(image: &RgbImage, layout: TensorLayout, params: &NormalizationParams) -> Vec<f32> {
    match layout {
        TensorLayout::Nhwc => image.as_raw().iter().map(|&p| params.normalize(p)).collect(),
        TensorLayout::Nchw => {
            let (width, height) = image.dimensions();
            let chw = Array3::from_shape_fn((CHANNELS, height as usize, width as usize), |(c, y, x)| {
                params.normalize(image.get_pixel(x as u32, y as u32)[c])
            });
            chw.iter().copied().collect()
        }
    }
}
