// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image input handling for classification
//!
//! This module provides:
//! - Image file decoding to RGB8 (JPEG first, other common formats accepted)
//! - Preprocessing into a normalized model input buffer

pub mod image_utils;
pub mod preprocessing;

pub use image_utils::{basename, decode_image_bytes, decode_image_file, detect_format, ImageError, ImageInfo};
pub use preprocessing::{
    preprocess, to_tensor_data, InputShape, NormalizationParams, PreprocessError, TensorLayout,
};
