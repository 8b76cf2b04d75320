// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Run configuration
//!
//! Values are resolved in order: command line, then the optional TOML
//! config file, then built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::Cli;
use crate::inference::BackendKind;
use crate::report::OutputFormat;
use crate::vision::preprocessing::{
    InputShape, NormalizationParams, PreprocessError, TensorLayout, DEFAULT_INPUT_SIZE,
    DEFAULT_MEAN, DEFAULT_STD,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] PreprocessError),

    #[error("Thread count must be at least 1")]
    ZeroThreads,
}

/// `[input]` table of the config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub mean: Option<f32>,
    pub std: Option<f32>,
    pub layout: Option<TensorLayout>,
}

/// `[runtime]` table of the config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    pub backend: Option<BackendKind>,
    pub threads: Option<usize>,
}

/// `[output]` table of the config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub format: Option<OutputFormat>,
    pub compact: Option<bool>,
}

/// Contents of a TOML config file; every field is optional
///
/// ```toml
/// [input]
/// height = 224
/// width = 224
/// mean = 127.5
/// std = 127.5
/// layout = "nchw"
///
/// [runtime]
/// backend = "onnx"
/// threads = 2
///
/// [output]
/// format = "text"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl FileConfig {
    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Fully resolved settings for one classification run
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub image_path: PathBuf,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_shape: InputShape,
    pub normalization: NormalizationParams,
    pub backend: BackendKind,
    pub threads: usize,
    pub format: OutputFormat,
    pub compact: bool,
}

impl ClassifierConfig {
    /// Settings for the given files with every other value at its default
    pub fn new(
        image_path: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        labels_path: impl Into<PathBuf>,
    ) -> Self {
        let model_path = model_path.into();
        Self {
            image_path: image_path.into(),
            backend: BackendKind::from_path(&model_path),
            model_path,
            labels_path: labels_path.into(),
            input_shape: InputShape::default(),
            normalization: NormalizationParams::default(),
            threads: 1,
            format: OutputFormat::default(),
            compact: false,
        }
    }

    /// Resolve settings from the command line, loading `--config` if given
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load_from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, &file)
    }

    /// Merge command-line values over `file` over defaults, then validate
    pub fn resolve(cli: &Cli, file: &FileConfig) -> Result<Self, ConfigError> {
        let layout = cli.layout.or(file.input.layout).unwrap_or_default();
        let input_shape = InputShape::new(
            cli.height.or(file.input.height).unwrap_or(DEFAULT_INPUT_SIZE),
            cli.width.or(file.input.width).unwrap_or(DEFAULT_INPUT_SIZE),
            layout,
        )?;
        let normalization = NormalizationParams::new(
            cli.mean.or(file.input.mean).unwrap_or(DEFAULT_MEAN),
            cli.std.or(file.input.std).unwrap_or(DEFAULT_STD),
        )?;

        let threads = cli.threads.or(file.runtime.threads).unwrap_or(1);
        if threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        let backend = cli
            .backend
            .or(file.runtime.backend)
            .unwrap_or_else(|| BackendKind::from_path(&cli.model));

        Ok(Self {
            image_path: cli.image.clone(),
            model_path: cli.model.clone(),
            labels_path: cli.labels.clone(),
            input_shape,
            normalization,
            backend,
            threads,
            format: cli.format.or(file.output.format).unwrap_or_default(),
            compact: cli
                .compact_flag()
                .or(file.output.compact)
                .unwrap_or(false),
        })
    }
}
