use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::plan::{execute_plan, validate_label, FileOp};
use crate::error::{PrepError, Result};
use crate::table::ReferenceTable;

/// What to do with a table row whose image is not in the source folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFilePolicy {
    /// Leave the row out silently (the NIH metadata lists more images than
    /// any single download batch contains)
    #[default]
    Skip,
    /// Abort with `NotFound`
    Fail,
}

/// Table columns holding the image file name and its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelColumns {
    #[serde(default = "default_image_column")]
    pub image: String,
    #[serde(default = "default_label_column")]
    pub label: String,
}

fn default_image_column() -> String {
    "Image Index".to_string()
}

fn default_label_column() -> String {
    "Finding Labels".to_string()
}

impl Default for LabelColumns {
    fn default() -> Self {
        Self {
            image: default_image_column(),
            label: default_label_column(),
        }
    }
}

/// Planned moves plus the rows that were left out
#[derive(Debug, Clone, Default)]
pub struct GroupingPlan {
    pub ops: Vec<FileOp>,
    /// Image names listed in the table but absent from the source folder
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub skipped_missing: usize,
}

/// Names of the regular files directly inside `folder`.
pub fn list_file_names(folder: &Path) -> Result<HashSet<String>> {
    let entries = std::fs::read_dir(folder).map_err(|e| PrepError::from_open(e, folder))?;
    let mut names = HashSet::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Plan moving each listed image into `<output_root>/<label>/<image>`.
///
/// `present` is the listing of `source_folder`; nothing touches the disk here.
pub fn plan_grouping(
    table: &ReferenceTable,
    columns: &LabelColumns,
    present: &HashSet<String>,
    source_folder: &Path,
    output_root: &Path,
    policy: MissingFilePolicy,
) -> Result<GroupingPlan> {
    let image_idx = table.column_index(&columns.image)?;
    let label_idx = table.column_index(&columns.label)?;

    let mut plan = GroupingPlan::default();
    let mut planned: HashSet<&str> = HashSet::new();
    let mut missing: HashSet<&str> = HashSet::new();

    for (row_no, row) in table.rows().enumerate() {
        let image = row[image_idx].trim();
        let label = row[label_idx].trim();

        if !present.contains(image) {
            match policy {
                MissingFilePolicy::Skip => {
                    log::debug!("Row {}: {} not in source folder, skipping", row_no, image);
                    if missing.insert(image) {
                        plan.missing.push(image.to_string());
                    }
                    continue;
                }
                MissingFilePolicy::Fail => {
                    return Err(PrepError::NotFound(
                        source_folder.join(image).display().to_string(),
                    ));
                }
            }
        }

        validate_label(label)
            .map_err(|e| PrepError::ParseError(format!("Row {}: {}", row_no, e)))?;

        if !planned.insert(image) {
            log::warn!("Row {}: {} is listed more than once, keeping first label", row_no, image);
            continue;
        }

        plan.ops.push(FileOp::moving(
            source_folder.join(image),
            grouped_path(output_root, label, image),
        ));
    }

    Ok(plan)
}

/// Move images from `source_folder` into label folders under `output_root`.
pub fn organize_images_by_label(
    table: &ReferenceTable,
    columns: &LabelColumns,
    source_folder: &Path,
    output_root: &Path,
    policy: MissingFilePolicy,
) -> Result<OrganizeSummary> {
    std::fs::create_dir_all(output_root)?;
    let present = list_file_names(source_folder)?;
    let plan = plan_grouping(table, columns, &present, source_folder, output_root, policy)?;
    let moved = execute_plan(&plan.ops)?;

    if !plan.missing.is_empty() {
        log::warn!(
            "{} table rows had no image in {}",
            plan.missing.len(),
            source_folder.display()
        );
    }
    log::info!("Moved {} images into {}", moved, output_root.display());

    Ok(OrganizeSummary {
        moved,
        skipped_missing: plan.missing.len(),
    })
}

/// Destination of `image` once grouped under `output_root`.
pub fn grouped_path(output_root: &Path, label: &str, image: &str) -> PathBuf {
    output_root.join(label).join(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_csv;

    fn table() -> ReferenceTable {
        parse_csv(
            "Image Index,Finding Labels\n\
             a.png,Effusion\n\
             b.png,No Finding\n\
             gone.png,Effusion\n\
             a.png,Mass\n\
             gone.png,Mass\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn present() -> HashSet<String> {
        ["a.png", "b.png", "unlisted.png"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_plan_skips_missing_and_duplicates() {
        let plan = plan_grouping(
            &table(),
            &LabelColumns::default(),
            &present(),
            Path::new("/src"),
            Path::new("/out"),
            MissingFilePolicy::Skip,
        )
        .unwrap();

        assert_eq!(
            plan.ops,
            vec![
                FileOp::moving("/src/a.png".into(), grouped_path(Path::new("/out"), "Effusion", "a.png")),
                FileOp::moving("/src/b.png".into(), "/out/No Finding/b.png".into()),
            ]
        );
        assert_eq!(plan.missing, vec!["gone.png".to_string()]);
    }

    #[test]
    fn test_missing_image_counted_once() {
        let table = parse_csv(
            "Image Index,Finding Labels\n\
             gone.png,Effusion\n\
             gone.png,Effusion\n\
             gone.png,Mass\n\
             lost.png,Mass\n"
                .as_bytes(),
        )
        .unwrap();
        let plan = plan_grouping(
            &table,
            &LabelColumns::default(),
            &present(),
            Path::new("/src"),
            Path::new("/out"),
            MissingFilePolicy::Skip,
        )
        .unwrap();

        assert!(plan.ops.is_empty());
        assert_eq!(plan.missing, vec!["gone.png".to_string(), "lost.png".to_string()]);
    }

    #[test]
    fn test_plan_strict_fails_on_missing() {
        let result = plan_grouping(
            &table(),
            &LabelColumns::default(),
            &present(),
            Path::new("/src"),
            Path::new("/out"),
            MissingFilePolicy::Fail,
        );
        match result {
            Err(PrepError::NotFound(path)) => assert!(path.ends_with("gone.png")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_unknown_column() {
        let columns = LabelColumns {
            image: "file".to_string(),
            label: "Finding Labels".to_string(),
        };
        let result = plan_grouping(
            &table(),
            &columns,
            &present(),
            Path::new("/src"),
            Path::new("/out"),
            MissingFilePolicy::Skip,
        );
        assert!(matches!(result, Err(PrepError::InvalidParameter(_))));
    }
}
