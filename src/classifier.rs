// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification pipeline
//!
//! decode → normalize → shape tensors → invoke → format output. Every step
//! stops the run on failure with its own [`ClassifyError`] category.

use std::io::Write;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::inference::{load_backend, InferenceBackend};
use crate::labels::load_labels;
use crate::report::{ClassificationReport, ReportError};
use crate::vision::{basename, decode_image_file, preprocess, InputShape};

/// Model input and output tensors used by the pipeline
const INPUT_INDEX: usize = 0;
const OUTPUT_INDEX: usize = 0;

/// Normalized input tensor data for one image
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// File name of the source image
    pub image_name: String,
    pub data: Vec<f32>,
}

/// Decode the configured image and turn it into input tensor data
pub fn prepare_input(config: &ClassifierConfig) -> Result<PreparedInput, ClassifyError> {
    let (rgb, image_info) =
        decode_image_file(&config.image_path).map_err(ClassifyError::ImageDecode)?;
    info!(
        image = %config.image_path.display(),
        width = image_info.width,
        height = image_info.height,
        format = ?image_info.format,
        "Image decoded"
    );

    let data = preprocess(&rgb, &config.input_shape, &config.normalization);
    debug!(
        elements = data.len(),
        mean = config.normalization.mean,
        std = config.normalization.std,
        "Input normalized"
    );

    Ok(PreparedInput {
        image_name: basename(&config.image_path),
        data,
    })
}

/// Shape the input tensor, copy `data` in, invoke, and copy the scores out
pub fn run_inference(
    backend: &mut dyn InferenceBackend,
    shape: &InputShape,
    data: &[f32],
) -> Result<Vec<f32>, ClassifyError> {
    backend
        .allocate_tensors()
        .map_err(ClassifyError::TensorAllocation)?;

    let dims = shape.dims();
    backend
        .resize_input_tensor(INPUT_INDEX, &dims)
        .map_err(ClassifyError::TensorResize)?;

    backend
        .allocate_tensors()
        .map_err(ClassifyError::TensorAllocationAfterResize)?;

    backend
        .copy_input_from_buffer(INPUT_INDEX, data)
        .map_err(ClassifyError::InputCopy)?;

    let started = Instant::now();
    backend.invoke().map_err(ClassifyError::Invoke)?;
    info!(
        backend = backend.name(),
        dims = ?dims,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Inference complete"
    );

    backend
        .copy_output(OUTPUT_INDEX)
        .map_err(ClassifyError::OutputCopy)
}

/// Pair the scores with the configured labels file
pub fn build_report(
    config: &ClassifierConfig,
    image_name: String,
    scores: &[f32],
) -> Result<ClassificationReport, ClassifyError> {
    let labels = load_labels(&config.labels_path).map_err(ClassifyError::Labels)?;
    let report = ClassificationReport::new(image_name, labels, scores).map_err(report_error)?;

    if let Some(best) = report.best() {
        info!(label = %best.label, confidence = best.confidence, "Top prediction");
    }
    Ok(report)
}

/// Classify with a backend that already holds the model
pub fn classify_with_backend(
    config: &ClassifierConfig,
    backend: &mut dyn InferenceBackend,
) -> Result<ClassificationReport, ClassifyError> {
    let input = prepare_input(config)?;
    let scores = run_inference(backend, &config.input_shape, &input.data)?;
    build_report(config, input.image_name, &scores)
}

/// Decode the image, load the configured model, and classify
pub fn classify(config: &ClassifierConfig) -> Result<ClassificationReport, ClassifyError> {
    let input = prepare_input(config)?;

    let mut backend = load_backend(config.backend, &config.model_path, config.threads)
        .map_err(ClassifyError::ModelLoad)?;

    let scores = run_inference(backend.as_mut(), &config.input_shape, &input.data)?;
    build_report(config, input.image_name, &scores)
}

/// Classify and write the report to `writer` in the configured format
pub fn run<W: Write>(
    config: &ClassifierConfig,
    writer: &mut W,
) -> Result<ClassificationReport, ClassifyError> {
    let report = classify(config)?;
    write_report(&report, config, writer)?;
    Ok(report)
}

/// Write `report` in the configured format
pub fn write_report<W: Write>(
    report: &ClassificationReport,
    config: &ClassifierConfig,
    writer: &mut W,
) -> Result<(), ClassifyError> {
    report
        .write(writer, config.format, config.compact)
        .map_err(report_error)?;
    writer
        .flush()
        .map_err(|e| ClassifyError::Output(e.to_string()))
}

fn report_error(err: ReportError) -> ClassifyError {
    match err {
        ReportError::LabelCountMismatch { labels, scores } => {
            ClassifyError::LabelCountMismatch { labels, scores }
        }
        other => ClassifyError::Output(other.to_string()),
    }
}
