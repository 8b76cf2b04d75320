// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification output: labels paired with scores, and their renderings

use clap::ValueEnum;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Labels file has {labels} labels but the model produced {scores} scores")]
    LabelCountMismatch { labels: usize, scores: usize },

    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{"label": score, ...}`
    #[default]
    Json,
    /// `Predictions for <image> - [label: score, ...]`
    Text,
}

/// Confidence for one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// All class confidences for one image, in labels-file order
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// File name of the classified image
    pub image_name: String,
    pub predictions: Vec<Prediction>,
}

impl ClassificationReport {
    /// Pair `labels[i]` with `scores[i]`
    ///
    /// Fails when there are more labels than scores. Extra scores beyond
    /// the last label are dropped.
    pub fn new(
        image_name: impl Into<String>,
        labels: Vec<String>,
        scores: &[f32],
    ) -> Result<Self, ReportError> {
        if labels.len() > scores.len() {
            return Err(ReportError::LabelCountMismatch {
                labels: labels.len(),
                scores: scores.len(),
            });
        }
        if scores.len() > labels.len() {
            warn!(
                labels = labels.len(),
                scores = scores.len(),
                "Model produced more scores than labels; extra scores are not reported"
            );
        }

        let predictions: Vec<Prediction> = labels
            .into_iter()
            .zip(scores.iter().copied())
            .map(|(label, confidence)| Prediction { label, confidence })
            .collect();

        for p in predictions.iter().filter(|p| !p.confidence.is_finite()) {
            warn!(
                label = %p.label,
                confidence = %p.confidence,
                "Non-finite confidence; JSON output writes it as null"
            );
        }

        Ok(Self {
            image_name: image_name.into(),
            predictions,
        })
    }

    /// Highest-confidence prediction; the first one wins ties
    pub fn best(&self) -> Option<&Prediction> {
        self.predictions.iter().fold(None, |best, p| match best {
            Some(b) if b.confidence >= p.confidence => Some(b),
            _ => Some(p),
        })
    }

    /// Write the report in `format`, followed by a newline
    pub fn write<W: Write>(
        &self,
        writer: &mut W,
        format: OutputFormat,
        compact: bool,
    ) -> Result<(), ReportError> {
        match format {
            OutputFormat::Json => self.write_json(writer, compact),
            OutputFormat::Text => self.write_text(writer),
        }
    }

    /// Write a JSON object mapping each label to its confidence
    ///
    /// The map is streamed entry by entry, so label order and duplicate
    /// labels survive. NaN and infinite confidences are written as `null`.
    pub fn write_json<W: Write>(&self, writer: &mut W, compact: bool) -> Result<(), ReportError> {
        if compact {
            let mut ser = serde_json::Serializer::new(&mut *writer);
            self.serialize_map(&mut ser)?;
        } else {
            let mut ser = serde_json::Serializer::pretty(&mut *writer);
            self.serialize_map(&mut ser)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn serialize_map<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.predictions.len()))?;
        for prediction in &self.predictions {
            map.serialize_entry(&prediction.label, &prediction.confidence)?;
        }
        map.end()
    }

    /// Write the single-line text form
    pub fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
        let entries = self
            .predictions
            .iter()
            .map(|p| format!("{}: {:.6}", p.label, p.confidence))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(writer, "Predictions for {} - [{}]", self.image_name, entries)?;
        Ok(())
    }
}
