//! Preprocessing for medical ML datasets: WFDB ECG records (loading,
//! filtering, resampling, features) and labelled chest X-ray images
//! (grouping, stratified splitting, resizing).

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod loader;
pub mod pipeline;
pub mod profiling;
pub mod resize;
pub mod signal;
pub mod table;
pub mod types;
pub mod wfdb;

pub use config::{EcgConfig, ImageConfig, PipelineConfig, ResizeStage};
pub use error::{PrepError, Result};
pub use features::{detect_r_peaks, extract_features, extract_rr_intervals, heart_rate};
pub use loader::{load_datasets, load_ecg_files, load_reference_table};
pub use pipeline::{preprocess_signal, run_ecg, run_images, EcgOutcome, ImageOutcome};
pub use resize::{resize_folder, resize_image, FailureKind, ResizeFailure, ResizeOptions, ResizeReport};
pub use table::ReferenceTable;
pub use types::*;
