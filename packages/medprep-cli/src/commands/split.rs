use std::path::{Path, PathBuf};

use medprep::dataset::{
    gather_labeled_files, plan_split_copies, split_dataset, stratified_split, SplitConfig,
    SplitFolders,
};

use crate::cli::SplitArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: SplitArgs) -> i32 {
    let config = SplitConfig {
        test_size: args.test_size,
        val_size: args.val_size,
        seed: args.seed,
    };
    let folders = SplitFolders {
        train: PathBuf::from(&args.train),
        validation: PathBuf::from(&args.val),
        test: PathBuf::from(&args.test),
    };
    let organized = Path::new(&args.organized);

    if args.dry_run {
        let ops = gather_labeled_files(organized)
            .and_then(|files| stratified_split(files, &config))
            .map(|assignment| plan_split_copies(&assignment, &folders));
        return match ops {
            Ok(ops) => output::emit(&ops, false, None),
            Err(e) => exit_codes::report(&e),
        };
    }

    match split_dataset(organized, &folders, &config) {
        Ok(summary) => output::emit(&summary, false, None),
        Err(e) => exit_codes::report(&e),
    }
}
