use std::path::Path;

use medprep::dataset::{
    list_file_names, organize_images_by_label, plan_grouping, LabelColumns, MissingFilePolicy,
};
use medprep::table::read_csv;
use serde::Serialize;

use crate::cli::OrganizeArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct DryRun<'a> {
    ops: &'a [medprep::dataset::FileOp],
    missing: &'a [String],
}

pub fn execute(args: OrganizeArgs) -> i32 {
    let table = match read_csv(Path::new(&args.labels)) {
        Ok(t) => t,
        Err(e) => return exit_codes::report(&e),
    };

    let columns = LabelColumns {
        image: args.image_column.clone(),
        label: args.label_column.clone(),
    };
    let policy = if args.strict {
        MissingFilePolicy::Fail
    } else {
        MissingFilePolicy::Skip
    };
    let images = Path::new(&args.images);
    let output_root = Path::new(&args.output);

    if args.dry_run {
        let plan = list_file_names(images)
            .and_then(|present| plan_grouping(&table, &columns, &present, images, output_root, policy));
        return match plan {
            Ok(plan) => output::emit(
                &DryRun {
                    ops: &plan.ops,
                    missing: &plan.missing,
                },
                false,
                None,
            ),
            Err(e) => exit_codes::report(&e),
        };
    }

    match organize_images_by_label(&table, &columns, images, output_root, policy) {
        Ok(summary) => output::emit(&summary, false, None),
        Err(e) => exit_codes::report(&e),
    }
}
