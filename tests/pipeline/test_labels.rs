// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Labels file loading: one label per newline, file order preserved

use super::common::write_labels;
use image_classifier::labels::{load_labels, LabelsError};
use tempfile::TempDir;

#[test]
fn test_label_count_equals_newline_count() {
    let dir = TempDir::new().unwrap();
    for contents in [
        "bad\nearth\nedge\n",
        "bad\nearth\nedge",
        "\n\n",
        "single\r\n",
        "",
    ] {
        let path = write_labels(dir.path(), contents);
        let labels = load_labels(&path).unwrap();
        assert_eq!(
            labels.len(),
            contents.bytes().filter(|&b| b == b'\n').count(),
            "contents: {:?}",
            contents
        );
    }
}

#[test]
fn test_labels_keep_file_order() {
    let dir = TempDir::new().unwrap();
    let path = write_labels(dir.path(), "zebra\napple\nmango\n");
    assert_eq!(load_labels(&path).unwrap(), vec!["zebra", "apple", "mango"]);
}

#[test]
fn test_directory_is_not_a_labels_file() {
    let dir = TempDir::new().unwrap();
    let err = load_labels(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        LabelsError::Open { .. } | LabelsError::Read { .. }
    ));
}
