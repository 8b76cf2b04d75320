// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Report rendering: one entry per label line, paired by index

use image_classifier::report::{ClassificationReport, OutputFormat};

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_one_entry_per_label_paired_by_index() {
    let names = ["n01", "n02", "n03", "n04", "n05"];
    let scores = [0.05, 0.4, 0.15, 0.3, 0.1];
    let report = ClassificationReport::new("x.jpg", labels(&names), &scores).unwrap();

    assert_eq!(report.predictions.len(), names.len());
    for (i, prediction) in report.predictions.iter().enumerate() {
        assert_eq!(prediction.label, names[i]);
        assert_eq!(prediction.confidence, scores[i]);
    }
}

#[test]
fn test_json_entries_follow_label_order() {
    let report = ClassificationReport::new(
        "x.jpg",
        labels(&["edge", "bad", "earth"]),
        &[0.5, 0.25, 0.25],
    )
    .unwrap();

    let mut out = Vec::new();
    report.write(&mut out, OutputFormat::Json, false).unwrap();
    let text = String::from_utf8(out).unwrap();

    let edge = text.find("\"edge\"").unwrap();
    let bad = text.find("\"bad\"").unwrap();
    let earth = text.find("\"earth\"").unwrap();
    assert!(edge < bad && bad < earth);
    assert!(text.trim_start().starts_with('{'));
    assert!(text.trim_end().ends_with('}'));
}
