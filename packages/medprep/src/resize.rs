//! Batch image resizing to a fixed resolution.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::ImageReader;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

pub const DEFAULT_SIZE: (u32, u32) = (512, 512);

/// Extensions treated as images, compared case-insensitively
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
        }
    }
}

/// Broad cause of a per-file resize failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Decode,
    Io,
    Other,
}

impl From<&PrepError> for FailureKind {
    fn from(err: &PrepError) -> Self {
        match err {
            PrepError::NotFound(_) => FailureKind::NotFound,
            PrepError::DecodeFailure { .. } => FailureKind::Decode,
            PrepError::IoError(_) => FailureKind::Io,
            _ => FailureKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeFailure {
    pub file_name: String,
    pub kind: FailureKind,
    pub error: String,
}

/// Outcome of a folder resize; one bad file never aborts the batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResizeReport {
    pub resized: Vec<String>,
    pub failures: Vec<ResizeFailure>,
}

impl ResizeReport {
    pub fn succeeded(&self) -> usize {
        self.resized.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Resize one image to exactly `options.width` x `options.height`, ignoring
/// its aspect ratio, and write it to `output` in the format its extension
/// names.
pub fn resize_image(input: &Path, output: &Path, options: ResizeOptions) -> Result<()> {
    validate_options(options)?;

    let decode_failure = |reason: String| PrepError::DecodeFailure {
        file: input.display().to_string(),
        reason,
    };

    let img = ImageReader::open(input)
        .map_err(|e| PrepError::from_open(e, input))?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_failure(e.to_string()))?;

    let resized = img.resize_exact(options.width, options.height, FilterType::Triangle);
    resized
        .save(output)
        .map_err(|e| PrepError::IoError(std::io::Error::other(e)))?;
    Ok(())
}

/// Resize every image directly inside `input_folder` into `output_folder`,
/// keeping file names. Files are processed in parallel; failures are
/// collected per file.
pub fn resize_folder(
    input_folder: &Path,
    output_folder: &Path,
    options: ResizeOptions,
) -> Result<ResizeReport> {
    validate_options(options)?;
    let images = list_images(input_folder)?;
    std::fs::create_dir_all(output_folder)?;

    log::info!(
        "Resizing {} images from {} to {}x{}",
        images.len(),
        input_folder.display(),
        options.width,
        options.height
    );

    let outcomes: Vec<(String, Result<()>)> = images
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let result = resize_image(path, &output_folder.join(&name), options);
            (name, result)
        })
        .collect();

    let mut report = ResizeReport::default();
    for (file_name, result) in outcomes {
        match result {
            Ok(()) => report.resized.push(file_name),
            Err(e) => {
                log::warn!("Skipping {}: {}", file_name, e);
                report.failures.push(ResizeFailure {
                    file_name,
                    kind: FailureKind::from(&e),
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Resized {} images, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|e| PrepError::from_open(e, folder))?;
    let mut images = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

fn validate_options(options: ResizeOptions) -> Result<()> {
    if options.width == 0 || options.height == 0 {
        return Err(PrepError::InvalidParameter(format!(
            "Target size must be non-zero, got {}x{}",
            options.width, options.height
        )));
    }
    Ok(())
}
