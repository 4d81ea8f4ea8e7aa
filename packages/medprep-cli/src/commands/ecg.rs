use std::path::PathBuf;

use medprep::{run_ecg, EcgConfig};

use crate::cli::EcgArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: EcgArgs) -> i32 {
    let records = match resolve_records(&args) {
        Ok(r) => r,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if records.is_empty() {
        eprintln!("Error: No matching records found");
        return exit_codes::INPUT_ERROR;
    }

    let total = records.len();
    let mut succeeded = 0usize;
    let mut last_error = exit_codes::SUCCESS;

    for (i, record) in records.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, total, record.display());

        let config = build_config(&args, record.clone());
        let code = match run_ecg(&config) {
            Ok(outcome) => output::emit(&outcome, args.compact, None),
            Err(e) => {
                eprintln!("Error: {}: {}", record.display(), e);
                exit_codes::for_error(&e)
            }
        };

        if code == exit_codes::SUCCESS {
            succeeded += 1;
        } else {
            last_error = code;
            if !args.continue_on_error {
                break;
            }
        }
    }

    if succeeded == total {
        exit_codes::SUCCESS
    } else if succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        last_error
    }
}

fn build_config(args: &EcgArgs, record_base: PathBuf) -> EcgConfig {
    let cutoff = |hz: f64| (hz > 0.0).then_some(hz);
    EcgConfig {
        annotation_extension: (!args.no_annotations).then(|| args.annotations.clone()),
        channel: args.channel,
        highpass_hz: cutoff(args.highpass),
        lowpass_hz: cutoff(args.lowpass),
        filter_order: args.order,
        target_fs: args.target_fs,
        normalize: !args.no_normalize,
        ..EcgConfig::new(record_base)
    }
}

fn resolve_records(args: &EcgArgs) -> Result<Vec<PathBuf>, String> {
    if let Some(ref pattern) = args.glob {
        resolve_glob(pattern)
    } else if let Some(ref records) = args.record {
        Ok(records.iter().map(PathBuf::from).collect())
    } else {
        Err("One of --record or --glob must be specified".to_string())
    }
}

/// Record bases of every `.hea` file the pattern matches.
fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>, String> {
    let paths =
        glob::glob(pattern).map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut records = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && path.extension().is_some_and(|ext| ext == "hea") {
                    records.push(path.with_extension(""));
                }
            }
            Err(e) => log::warn!("glob error: {}", e),
        }
    }
    records.sort();
    records.dedup();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_args() -> EcgArgs {
        EcgArgs {
            record: None,
            glob: None,
            annotations: "atr".to_string(),
            no_annotations: false,
            channel: 0,
            highpass: 0.5,
            lowpass: 40.0,
            order: 5,
            target_fs: None,
            no_normalize: false,
            continue_on_error: false,
            compact: false,
        }
    }

    #[test]
    fn test_resolve_records_no_input() {
        let result = resolve_records(&make_args());
        assert!(result.unwrap_err().contains("must be specified"));
    }

    #[test]
    fn test_resolve_glob_strips_header_extension() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("101.hea"), "").unwrap();
        fs::write(tmp.path().join("100.hea"), "").unwrap();
        fs::write(tmp.path().join("100.dat"), "").unwrap();

        let pattern = format!("{}/*", tmp.path().display());
        let records = resolve_glob(&pattern).unwrap();
        assert_eq!(
            records,
            vec![tmp.path().join("100"), tmp.path().join("101")]
        );
    }

    #[test]
    fn test_resolve_glob_invalid_pattern() {
        assert!(resolve_glob("[invalid").is_err());
    }

    #[test]
    fn test_zero_cutoff_disables_filter() {
        let mut args = make_args();
        args.highpass = 0.0;
        args.no_annotations = true;
        let config = build_config(&args, PathBuf::from("data/100"));
        assert_eq!(config.highpass_hz, None);
        assert_eq!(config.lowpass_hz, Some(40.0));
        assert_eq!(config.annotation_extension, None);
    }
}
