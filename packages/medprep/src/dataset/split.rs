use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::plan::{execute_plan, FileOp};
use crate::error::{PrepError, Result};

/// An image file and the label folder it was found in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledFile {
    pub path: PathBuf,
    pub label: String,
}

/// Split proportions and RNG seed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of all files held out for testing
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Fraction of the remaining training files held out for validation
    #[serde(default = "default_val_size")]
    pub val_size: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_test_size() -> f64 {
    0.2
}
fn default_val_size() -> f64 {
    0.1
}
fn default_seed() -> u64 {
    42
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            val_size: default_val_size(),
            seed: default_seed(),
        }
    }
}

/// Destination roots of the three partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitFolders {
    pub train: PathBuf,
    pub validation: PathBuf,
    pub test: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<LabeledFile>,
    pub validation: Vec<LabeledFile>,
    pub test: Vec<LabeledFile>,
}

impl SplitAssignment {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

/// List `(file, label)` pairs from an organized tree: one entry per regular
/// file inside each label folder of `root`, sorted for reproducibility.
pub fn gather_labeled_files(root: &Path) -> Result<Vec<LabeledFile>> {
    let entries = std::fs::read_dir(root).map_err(|e| PrepError::from_open(e, root))?;

    let mut label_dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            label_dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    label_dirs.sort();

    let mut files = Vec::new();
    for (label, dir) in label_dirs {
        let mut members = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                members.push(entry.path());
            }
        }
        members.sort();
        log::debug!("Label {}: {} files", label, members.len());
        files.extend(members.into_iter().map(|path| LabeledFile {
            path,
            label: label.clone(),
        }));
    }

    Ok(files)
}

/// Stratified test / train / validation split.
///
/// `test_size` of all files go to test, then `val_size` of what remains goes
/// to validation. Each label keeps its share of every partition up to
/// rounding.
pub fn stratified_split(items: Vec<LabeledFile>, config: &SplitConfig) -> Result<SplitAssignment> {
    for (name, value) in [("test_size", config.test_size), ("val_size", config.val_size)] {
        if !(value > 0.0 && value < 1.0) {
            return Err(PrepError::InvalidParameter(format!(
                "{} must be in (0, 1), got {}",
                name, value
            )));
        }
    }
    if items.is_empty() {
        return Err(PrepError::InsufficientData(
            "No labeled files to split".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train_val, test) = hold_out(items, config.test_size, "test", &mut rng)?;
    let (train, validation) = hold_out(train_val, config.val_size, "validation", &mut rng)?;

    log::info!(
        "Split into {} train / {} validation / {} test",
        train.len(),
        validation.len(),
        test.len()
    );

    Ok(SplitAssignment {
        train,
        validation,
        test,
    })
}

/// Number of items a `fraction` of `n` rounds up to.
pub fn held_out_count(n: usize, fraction: f64) -> usize {
    // tolerance keeps products like 0.2 * 150 from rounding up to 31
    ((fraction * n as f64 - 1e-9).ceil().max(0.0) as usize).min(n)
}

/// Split off `ceil(fraction * n)` items, distributing them over labels by
/// largest remainder and picking members per label at random.
///
/// Both sides must keep at least one item.
fn hold_out(
    items: Vec<LabeledFile>,
    fraction: f64,
    partition: &str,
    rng: &mut StdRng,
) -> Result<(Vec<LabeledFile>, Vec<LabeledFile>)> {
    let n = items.len();
    let n_held = held_out_count(n, fraction);
    if n_held == 0 || n_held == n {
        return Err(PrepError::InsufficientData(format!(
            "Holding out {} of {} files for {} leaves one side empty",
            n_held, n, partition
        )));
    }

    let mut by_label: BTreeMap<String, Vec<LabeledFile>> = BTreeMap::new();
    for item in items {
        by_label.entry(item.label.clone()).or_default().push(item);
    }

    let mut quotas: Vec<(String, usize, usize, f64)> = by_label
        .iter()
        .map(|(label, members)| {
            let exact = n_held as f64 * members.len() as f64 / n as f64;
            let base = (exact.floor() as usize).min(members.len());
            (label.clone(), members.len(), base, exact - base as f64)
        })
        .collect();

    let mut remaining = n_held - quotas.iter().map(|q| q.2).sum::<usize>();
    quotas.sort_by(|a, b| {
        b.3.total_cmp(&a.3)
            .then(b.1.cmp(&a.1))
            .then(a.0.cmp(&b.0))
    });
    for quota in quotas.iter_mut() {
        if remaining == 0 {
            break;
        }
        if quota.2 < quota.1 {
            quota.2 += 1;
            remaining -= 1;
        }
    }
    let allocation: BTreeMap<String, usize> =
        quotas.into_iter().map(|(label, _, held, _)| (label, held)).collect();

    let mut kept = Vec::with_capacity(n - n_held);
    let mut held = Vec::with_capacity(n_held);
    for (label, mut members) in by_label {
        members.shuffle(rng);
        let take = allocation.get(&label).copied().unwrap_or(0);
        let rest = members.split_off(take);
        held.extend(members);
        kept.extend(rest);
    }

    Ok((kept, held))
}

/// Plan copies into `<partition root>/<label>/<file name>`.
pub fn plan_split_copies(assignment: &SplitAssignment, folders: &SplitFolders) -> Vec<FileOp> {
    let partitions = [
        (&assignment.train, &folders.train),
        (&assignment.validation, &folders.validation),
        (&assignment.test, &folders.test),
    ];

    partitions
        .into_iter()
        .flat_map(|(files, root)| {
            files.iter().filter_map(move |file| {
                let name = file.path.file_name()?;
                Some(FileOp::copying(
                    file.path.clone(),
                    root.join(&file.label).join(name),
                ))
            })
        })
        .collect()
}

/// Gather an organized tree, split it and copy each partition into place.
pub fn split_dataset(
    organized_root: &Path,
    folders: &SplitFolders,
    config: &SplitConfig,
) -> Result<SplitSummary> {
    for root in [&folders.train, &folders.validation, &folders.test] {
        std::fs::create_dir_all(root)?;
    }

    let files = gather_labeled_files(organized_root)?;
    log::info!(
        "Gathered {} labeled files from {}",
        files.len(),
        organized_root.display()
    );

    let assignment = stratified_split(files, config)?;
    let ops = plan_split_copies(&assignment, folders);
    execute_plan(&ops)?;

    Ok(SplitSummary {
        train: assignment.train.len(),
        validation: assignment.validation.len(),
        test: assignment.test.len(),
    })
}
