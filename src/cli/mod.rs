// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

use crate::inference::BackendKind;
use crate::report::OutputFormat;
use crate::vision::TensorLayout;

/// Classify an image with a quantized classification model
#[derive(Parser, Debug, Clone)]
#[command(name = "image-classifier")]
#[command(version)]
#[command(about = "Classify an image and print label confidences", long_about = None)]
pub struct Cli {
    /// Image to classify (JPEG; PNG, GIF, WebP, BMP and TIFF also accepted)
    pub image: PathBuf,

    /// Model file (.onnx, or .tflite with the `tflite` feature)
    pub model: PathBuf,

    /// Labels file, one label per line in model output order
    pub labels: PathBuf,

    /// Model input height in pixels [default: 224]
    pub height: Option<u32>,

    /// Model input width in pixels [default: 224]
    pub width: Option<u32>,

    /// Normalization mean subtracted from every pixel value [default: 0.0]
    #[arg(allow_negative_numbers = true)]
    pub mean: Option<f32>,

    /// Normalization standard deviation dividing every pixel value [default: 255.0]
    #[arg(allow_negative_numbers = true)]
    pub std: Option<f32>,

    /// TOML file with defaults for any value not given on the command line
    #[arg(long, env = "CLASSIFIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input tensor layout [default: nhwc]
    #[arg(long, value_enum)]
    pub layout: Option<TensorLayout>,

    /// Inference runtime (defaults to the one matching the model extension)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Intra-op threads for ONNX Runtime [default: 1]
    #[arg(long, env = "CLASSIFIER_THREADS")]
    pub threads: Option<usize>,

    /// Output format [default: json]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Print JSON on a single line
    #[arg(long, overrides_with = "no_compact")]
    pub compact: bool,

    /// Pretty-print JSON even if the config file asks for compact output
    #[arg(long, overrides_with = "compact")]
    pub no_compact: bool,
}

impl Cli {
    /// Compact setting given on the command line, if any; the last flag wins
    pub fn compact_flag(&self) -> Option<bool> {
        match (self.compact, self.no_compact) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
