//! Image dataset organization: grouping files into label folders and
//! splitting the grouped tree into train / validation / test partitions.
//!
//! Planners compute [`FileOp`] lists without touching the disk;
//! [`execute_plan`] carries them out.

mod organize;
mod plan;
mod split;

pub use organize::{
    grouped_path, list_file_names, organize_images_by_label, plan_grouping, GroupingPlan,
    LabelColumns, MissingFilePolicy, OrganizeSummary,
};
pub use plan::{execute_plan, validate_label, FileOp, FileOpKind};
pub use split::{
    gather_labeled_files, held_out_count, plan_split_copies, split_dataset, stratified_split,
    LabeledFile, SplitAssignment, SplitConfig, SplitFolders, SplitSummary,
};
