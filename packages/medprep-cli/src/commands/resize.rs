use std::path::Path;

use medprep::{resize_folder, ResizeOptions};

use crate::cli::ResizeArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: ResizeArgs) -> i32 {
    let options = ResizeOptions {
        width: args.width,
        height: args.height,
    };

    let report = match resize_folder(Path::new(&args.input), Path::new(&args.output), options) {
        Ok(r) => r,
        Err(e) => return exit_codes::report(&e),
    };

    for failure in &report.failures {
        eprintln!("  Failed: {}: {}", failure.file_name, failure.error);
    }
    eprintln!(
        "Resize complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );

    let code = output::emit(&report, args.compact, None);
    if code != exit_codes::SUCCESS {
        return code;
    }
    match (report.succeeded(), report.failed()) {
        (_, 0) => exit_codes::SUCCESS,
        (0, _) => exit_codes::EXECUTION_ERROR,
        _ => exit_codes::PARTIAL_FAILURE,
    }
}
