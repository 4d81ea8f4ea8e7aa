use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Whether a planned operation relocates or duplicates its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOpKind {
    Move,
    Copy,
}

/// One file-system operation computed by a planner and run by [`execute_plan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOp {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: FileOpKind,
}

impl FileOp {
    pub fn moving(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            kind: FileOpKind::Move,
        }
    }

    pub fn copying(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            kind: FileOpKind::Copy,
        }
    }
}

/// Run planned operations in order, creating destination folders as needed.
///
/// Returns the number of files moved or copied. Stops at the first failure.
pub fn execute_plan(ops: &[FileOp]) -> Result<usize> {
    for op in ops {
        if let Some(parent) = op.destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match op.kind {
            FileOpKind::Copy => {
                std::fs::copy(&op.source, &op.destination)
                    .map_err(|e| PrepError::from_open(e, &op.source))?;
            }
            FileOpKind::Move => move_file(&op.source, &op.destination)?,
        }
        log::debug!(
            "{:?} {} -> {}",
            op.kind,
            op.source.display(),
            op.destination.display()
        );
    }
    Ok(ops.len())
}

fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if !source.exists() {
        return Err(PrepError::NotFound(source.display().to_string()));
    }
    if std::fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    // rename cannot cross file systems
    std::fs::copy(source, destination).map_err(|e| PrepError::from_open(e, source))?;
    std::fs::remove_file(source)?;
    Ok(())
}

/// Reject labels that would not map to exactly one folder name.
pub fn validate_label(label: &str) -> Result<()> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(PrepError::ParseError("Empty label".to_string()));
    }
    if trimmed == "." || trimmed == ".." || label.contains(['/', '\\']) {
        return Err(PrepError::ParseError(format!(
            "Label '{}' is not a valid folder name",
            label
        )));
    }
    Ok(())
}
