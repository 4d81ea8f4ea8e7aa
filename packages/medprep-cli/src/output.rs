use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::exit_codes;

/// Write JSON string to stdout or a file.
pub fn write_output(json: &str, output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(path, format!("{}\n", json))
            .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.map_err(|e| format!("JSON serialization failed: {}", e))
}

/// Serialize and write `value`, returning the exit code for the outcome.
pub fn emit<T: Serialize>(value: &T, compact: bool, output_path: Option<&Path>) -> i32 {
    match to_json(value, compact).and_then(|json| write_output(&json, output_path)) {
        Ok(()) => exit_codes::SUCCESS,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            exit_codes::EXECUTION_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_compact_and_pretty() {
        let value = serde_json::json!({"moved": 3});
        assert_eq!(to_json(&value, true).unwrap(), r#"{"moved":3}"#);
        assert!(to_json(&value, false).unwrap().contains("\n"));
    }

    #[test]
    fn test_write_output_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_output("{}", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
