//! Pipeline configuration
//!
//! Every path and parameter a pipeline needs lives in these structs. They are
//! plain serde types so a run can be described by one JSON file; omitted
//! fields take the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{LabelColumns, MissingFilePolicy, SplitConfig};
use crate::error::{PrepError, Result};
use crate::loader::DEFAULT_ANNOTATION_EXTENSION;
use crate::resize::DEFAULT_SIZE;
use crate::signal::DEFAULT_FILTER_ORDER;

/// ECG loading, preprocessing and feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcgConfig {
    /// Record path without extension (`.hea` / `.dat` / annotation are appended)
    pub record_base: PathBuf,

    /// Optional reference table loaded alongside the record
    #[serde(default)]
    pub reference_csv: Option<PathBuf>,

    /// Annotation file extension; `None` skips annotations
    #[serde(default = "default_annotation_extension")]
    pub annotation_extension: Option<String>,

    /// Channel the features are computed on
    #[serde(default)]
    pub channel: usize,

    /// High-pass cutoff (Hz) removing baseline wander
    #[serde(default = "default_highpass")]
    pub highpass_hz: Option<f64>,

    /// Low-pass cutoff (Hz) removing muscle and mains noise
    #[serde(default = "default_lowpass")]
    pub lowpass_hz: Option<f64>,

    #[serde(default = "default_filter_order")]
    pub filter_order: usize,

    /// Resample to this rate before normalization
    #[serde(default)]
    pub target_fs: Option<f64>,

    /// Scale the preprocessed channel to [-1, 1]
    #[serde(default = "default_true")]
    pub normalize: bool,
}

fn default_annotation_extension() -> Option<String> {
    Some(DEFAULT_ANNOTATION_EXTENSION.to_string())
}
fn default_highpass() -> Option<f64> {
    Some(0.5)
}
fn default_lowpass() -> Option<f64> {
    Some(40.0)
}
fn default_filter_order() -> usize {
    DEFAULT_FILTER_ORDER
}
fn default_true() -> bool {
    true
}

impl EcgConfig {
    pub fn new(record_base: impl Into<PathBuf>) -> Self {
        Self {
            record_base: record_base.into(),
            reference_csv: None,
            annotation_extension: default_annotation_extension(),
            channel: 0,
            highpass_hz: default_highpass(),
            lowpass_hz: default_lowpass(),
            filter_order: default_filter_order(),
            target_fs: None,
            normalize: true,
        }
    }
}

/// Optional resize stage of the image pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeStage {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    DEFAULT_SIZE.0
}
fn default_height() -> u32 {
    DEFAULT_SIZE.1
}

/// Image grouping, splitting and (optionally) resizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Label table, e.g. the NIH `Data_Entry_2017.csv`
    pub labels_csv: PathBuf,

    #[serde(default)]
    pub columns: LabelColumns,

    /// Flat folder of raw images named in the table
    pub source_folder: PathBuf,

    /// Root receiving one folder per label
    pub organized_folder: PathBuf,

    pub train_folder: PathBuf,
    pub val_folder: PathBuf,
    pub test_folder: PathBuf,

    #[serde(default)]
    pub missing_files: MissingFilePolicy,

    #[serde(default)]
    pub split: SplitConfig,

    /// Runs before grouping when present
    #[serde(default)]
    pub resize: Option<ResizeStage>,
}

/// Top-level run description; either half may be omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub ecg: Option<EcgConfig>,
    #[serde(default)]
    pub images: Option<ImageConfig>,
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| PrepError::ParseError(format!("Invalid pipeline config: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::from_open(e, path))?;
        serde_json::from_str(&text)
            .map_err(|e| PrepError::ParseError(format!("{}: {}", path.display(), e)))
    }

    pub fn is_empty(&self) -> bool {
        self.ecg.is_none() && self.images.is_none()
    }
}
