// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class labels file: one label per line, in model output order

use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LabelsError {
    #[error("Failed to open labels file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read labels file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read labels from `path`
///
/// Every `\n` terminates one label, so the label count always equals the
/// newline count. A trailing `\r` is stripped. Text after the last newline
/// is not a label and is reported at `warn`.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>, LabelsError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| LabelsError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| LabelsError::Read {
            path: path.display().to_string(),
            source,
        })?;

    let labels = parse_labels(&contents);
    debug!(path = %path.display(), count = labels.len(), "Loaded labels");
    Ok(labels)
}

/// Split labels file contents into newline-terminated labels
pub fn parse_labels(contents: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut rest = contents;

    while let Some(end) = rest.find('\n') {
        let line = &rest[..end];
        labels.push(line.strip_suffix('\r').unwrap_or(line).to_string());
        rest = &rest[end + 1..];
    }

    if !rest.is_empty() {
        warn!(
            fragment = %rest,
            "Labels file does not end with a newline; ignoring the unterminated last line"
        );
    }

    labels
}
