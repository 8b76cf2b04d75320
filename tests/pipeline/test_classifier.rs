// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end pipeline tests against the fake interpreter
//!
//! These verify that:
//! - Decoded pixels reach the input tensor normalized as (pixel - mean) / std
//! - The input tensor is shaped from the configured height/width/layout
//! - Each failure point surfaces its own exit code

use super::common::{pattern, write_image, write_labels, FakeBackend};
use image::ImageFormat;
use image_classifier::classifier::{classify_with_backend, prepare_input, write_report};
use image_classifier::{
    classify, ClassifierConfig, InputShape, NormalizationParams, OutputFormat, TensorLayout,
};
use tempfile::TempDir;

fn config_for(dir: &TempDir, image: &str, height: u32, width: u32) -> ClassifierConfig {
    let mut config = ClassifierConfig::new(
        dir.path().join(image),
        dir.path().join("model.onnx"),
        dir.path().join("labels.txt"),
    );
    config.input_shape = InputShape::new(height, width, TensorLayout::Nhwc).unwrap();
    config
}

#[test]
fn test_normalized_pixels_reach_input_tensor() {
    let dir = TempDir::new().unwrap();
    let img = pattern(4, 3);
    write_image(dir.path(), "input.png", &img, ImageFormat::Png);
    write_labels(dir.path(), "bad\nearth\nedge\n");

    let mut config = config_for(&dir, "input.png", 3, 4);
    config.normalization = NormalizationParams::new(127.5, 127.5).unwrap();

    let mut backend = FakeBackend::with_scores(&[0.1, 0.7, 0.2]);
    let report = classify_with_backend(&config, &mut backend).unwrap();

    assert_eq!(backend.input_dims, Some(vec![1, 3, 4, 3]));
    let expected: Vec<f32> = img
        .as_raw()
        .iter()
        .map(|&p| (p as f32 - 127.5) / 127.5)
        .collect();
    assert_eq!(backend.received, expected);
    assert_eq!(backend.invocations, 1);

    assert_eq!(report.image_name, "input.png");
    let labels: Vec<&str> = report.predictions.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["bad", "earth", "edge"]);
    assert_eq!(report.best().unwrap().label, "earth");
}

#[test]
fn test_nchw_layout_shapes_input_tensor() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "input.png", &pattern(5, 5), ImageFormat::Png);
    write_labels(dir.path(), "a\nb\n");

    let mut config = config_for(&dir, "input.png", 5, 5);
    config.input_shape = InputShape::new(5, 5, TensorLayout::Nchw).unwrap();

    let mut backend = FakeBackend::with_scores(&[0.5, 0.5]);
    classify_with_backend(&config, &mut backend).unwrap();

    assert_eq!(backend.input_dims, Some(vec![1, 3, 5, 5]));
    assert_eq!(backend.received.len(), 75);
}

#[test]
fn test_jpeg_input_is_resized_to_model_size() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "photo.jpg", &pattern(16, 12), ImageFormat::Jpeg);
    write_labels(dir.path(), "cat\ndog\n");

    let config = config_for(&dir, "photo.jpg", 8, 8);
    let prepared = prepare_input(&config).unwrap();
    assert_eq!(prepared.image_name, "photo.jpg");
    assert_eq!(prepared.data.len(), 8 * 8 * 3);
    assert!(prepared.data.iter().all(|v| (0.0..=1.0).contains(v)));

    let mut backend = FakeBackend::with_scores(&[0.9, 0.1]);
    let report = classify_with_backend(&config, &mut backend).unwrap();
    assert_eq!(report.predictions[0].confidence, 0.9);
}

#[test]
fn test_undecodable_image_exits_with_decode_code() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.jpg"), [0xFF, 0xD8, 0xFF, 0x00, 0x01]).unwrap();
    write_labels(dir.path(), "a\n");

    let config = config_for(&dir, "broken.jpg", 2, 2);
    let mut backend = FakeBackend::with_scores(&[1.0]);
    let err = classify_with_backend(&config, &mut backend).unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert_eq!(backend.invocations, 0);
}

#[test]
fn test_missing_image_exits_with_decode_code() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "missing.jpg", 2, 2);
    let err = classify(&config).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_missing_model_exits_with_model_load_code() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "input.png", &pattern(2, 2), ImageFormat::Png);
    write_labels(dir.path(), "a\n");

    let config = config_for(&dir, "input.png", 2, 2);
    let err = classify(&config).unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[cfg(not(feature = "tflite"))]
#[test]
fn test_tflite_model_without_feature_exits_with_model_load_code() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "input.png", &pattern(2, 2), ImageFormat::Png);

    let config = ClassifierConfig::new(
        dir.path().join("input.png"),
        dir.path().join("mobilenet.tflite"),
        dir.path().join("labels.txt"),
    );
    let err = classify(&config).unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("--features tflite"));
}

#[test]
fn test_missing_labels_exits_with_labels_code() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "input.png", &pattern(2, 2), ImageFormat::Png);

    let config = config_for(&dir, "input.png", 2, 2);
    let mut backend = FakeBackend::with_scores(&[1.0]);
    let err = classify_with_backend(&config, &mut backend).unwrap_err();
    assert_eq!(err.exit_code(), 9);
}

#[test]
fn test_more_labels_than_scores_exits_with_mismatch_code() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "input.png", &pattern(2, 2), ImageFormat::Png);
    write_labels(dir.path(), "a\nb\nc\n");

    let config = config_for(&dir, "input.png", 2, 2);
    let mut backend = FakeBackend::with_scores(&[0.5, 0.5]);
    let err = classify_with_backend(&config, &mut backend).unwrap_err();
    assert_eq!(err.exit_code(), 10);
}

#[test]
fn test_write_report_uses_configured_format() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "sample.png", &pattern(2, 2), ImageFormat::Png);
    write_labels(dir.path(), "bad\nearth\nedge\n");

    let mut config = config_for(&dir, "sample.png", 2, 2);
    let mut backend = FakeBackend::with_scores(&[0.25, 0.5, 0.25]);
    let report = classify_with_backend(&config, &mut backend).unwrap();

    config.format = OutputFormat::Text;
    let mut out = Vec::new();
    write_report(&report, &config, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Predictions for sample.png - [bad: 0.250000, earth: 0.500000, edge: 0.250000]\n"
    );

    config.format = OutputFormat::Json;
    config.compact = true;
    let mut out = Vec::new();
    write_report(&report, &config, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"bad\":0.25,\"earth\":0.5,\"edge\":0.25}\n"
    );
}
