//! End-to-end pipelines
//!
//! ECG: load record -> high-pass -> low-pass -> resample -> normalize ->
//! features. Images: resize (optional) -> group by label -> stratified split.

use serde::Serialize;

use crate::config::{EcgConfig, ImageConfig};
use crate::dataset::{
    organize_images_by_label, split_dataset, OrganizeSummary, SplitFolders, SplitSummary,
};
use crate::error::{PrepError, Result};
use crate::features::extract_features;
use crate::profile_scope;
use crate::resize::{resize_folder, ResizeOptions, ResizeReport};
use crate::signal::{highpass_filter, lowpass_filter, normalize, resample};
use crate::table::read_csv;
use crate::types::FeatureRecord;
use crate::wfdb;

#[derive(Debug, Clone, Serialize)]
pub struct EcgOutcome {
    pub record_name: String,
    /// Sampling frequency after resampling
    pub fs: f64,
    /// Length of the preprocessed channel
    pub samples: usize,
    pub annotation_count: usize,
    pub reference_rows: Option<usize>,
    pub features: FeatureRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    pub resize: Option<ResizeReport>,
    pub organize: OrganizeSummary,
    pub split: SplitSummary,
}

/// Filter, resample and normalize one channel sampled at `fs`.
///
/// Returns the processed samples and their sampling frequency.
pub fn preprocess_signal(signal: &[f64], fs: f64, config: &EcgConfig) -> Result<(Vec<f64>, f64)> {
    let mut data = fill_invalid(signal)?;

    if let Some(cutoff) = config.highpass_hz {
        profile_scope!("highpass");
        data = highpass_filter(&data, cutoff, fs, config.filter_order)?;
    }
    if let Some(cutoff) = config.lowpass_hz {
        profile_scope!("lowpass");
        data = lowpass_filter(&data, cutoff, fs, config.filter_order)?;
    }

    let mut out_fs = fs;
    if let Some(target) = config.target_fs {
        profile_scope!("resample");
        data = resample(&data, Some(fs), target)?;
        out_fs = target;
    }

    if config.normalize {
        data = normalize(&data)?;
    }
    Ok((data, out_fs))
}

/// Carry the last valid sample over NaN gaps; leading gaps take the first
/// valid sample.
fn fill_invalid(signal: &[f64]) -> Result<Vec<f64>> {
    let first_valid = signal
        .iter()
        .copied()
        .find(|x| !x.is_nan())
        .ok_or_else(|| {
            PrepError::DegenerateInput("Channel has no valid samples".to_string())
        })?;

    let mut last = first_valid;
    let mut filled = 0usize;
    let data: Vec<f64> = signal
        .iter()
        .map(|&x| {
            if x.is_nan() {
                filled += 1;
                last
            } else {
                last = x;
                x
            }
        })
        .collect();

    if filled > 0 {
        log::warn!("Filled {} invalid samples", filled);
    }
    Ok(data)
}

/// Load, preprocess and extract features for the configured record.
pub fn run_ecg(config: &EcgConfig) -> Result<EcgOutcome> {
    profile_scope!(format!("ecg {}", config.record_base.display()));

    let record = wfdb::read_record(&config.record_base)?;
    let annotations = match &config.annotation_extension {
        Some(ext) => wfdb::read_annotations(&config.record_base, ext)?,
        None => Vec::new(),
    };
    let reference_rows = match &config.reference_csv {
        Some(path) => Some(read_csv(path)?.len()),
        None => None,
    };

    log::info!(
        "Preprocessing channel {} of {} ({} annotations)",
        config.channel,
        record.record_name,
        annotations.len()
    );

    let channel = record.channel(config.channel)?;
    let (processed, fs) = preprocess_signal(channel, record.fs, config)?;
    let features = {
        profile_scope!("features");
        extract_features(&processed, fs)?
    };

    Ok(EcgOutcome {
        record_name: record.record_name.clone(),
        fs,
        samples: processed.len(),
        annotation_count: annotations.len(),
        reference_rows,
        features,
    })
}

/// Resize (if configured), group by label, then split into partitions.
pub fn run_images(config: &ImageConfig) -> Result<ImageOutcome> {
    profile_scope!("images");

    let resize = match &config.resize {
        Some(stage) => {
            profile_scope!("resize");
            let options = ResizeOptions {
                width: stage.width,
                height: stage.height,
            };
            Some(resize_folder(&stage.input_folder, &stage.output_folder, options)?)
        }
        None => None,
    };

    let table = read_csv(&config.labels_csv)?;
    let organize = {
        profile_scope!("organize");
        organize_images_by_label(
            &table,
            &config.columns,
            &config.source_folder,
            &config.organized_folder,
            config.missing_files,
        )?
    };

    let folders = SplitFolders {
        train: config.train_folder.clone(),
        validation: config.val_folder.clone(),
        test: config.test_folder.clone(),
    };
    let split = {
        profile_scope!("split");
        split_dataset(&config.organized_folder, &folders, &config.split)?
    };

    Ok(ImageOutcome {
        resize,
        organize,
        split,
    })
}
