use std::path::Path;

use medprep::{run_ecg, run_images, EcgOutcome, ImageOutcome, PipelineConfig};
use serde::Serialize;

use crate::cli::RunArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct RunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    ecg: Option<EcgOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<ImageOutcome>,
}

pub fn execute(args: RunArgs) -> i32 {
    let config = match PipelineConfig::from_json_file(Path::new(&args.config)) {
        Ok(c) => c,
        Err(e) => return exit_codes::report(&e),
    };
    if config.is_empty() {
        eprintln!("Error: Config '{}' enables neither 'ecg' nor 'images'", args.config);
        return exit_codes::INPUT_ERROR;
    }

    let ecg = match config.ecg.as_ref().map(run_ecg).transpose() {
        Ok(outcome) => outcome,
        Err(e) => return exit_codes::report(&e),
    };
    let images = match config.images.as_ref().map(run_images).transpose() {
        Ok(outcome) => outcome,
        Err(e) => return exit_codes::report(&e),
    };

    let resize_failures = images
        .as_ref()
        .and_then(|i| i.resize.as_ref())
        .map(|r| r.failed())
        .unwrap_or(0);

    let summary = RunSummary { ecg, images };
    let code = output::emit(&summary, args.compact, args.output.as_deref().map(Path::new));
    if code == exit_codes::SUCCESS && resize_failures > 0 {
        eprintln!("Warning: {} images failed to resize", resize_failures);
        return exit_codes::PARTIAL_FAILURE;
    }
    code
}
