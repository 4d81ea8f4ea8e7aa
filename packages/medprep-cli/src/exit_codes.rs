use medprep::PrepError;

pub const SUCCESS: i32 = 0;
pub const EXECUTION_ERROR: i32 = 1;
pub const INPUT_ERROR: i32 = 2;
/// Some files of a batch failed, the rest succeeded
pub const PARTIAL_FAILURE: i32 = 3;

/// Exit code for a failed library call: bad paths, files and arguments are
/// input errors, everything else failed while executing.
pub fn for_error(err: &PrepError) -> i32 {
    match err {
        PrepError::NotFound(_) | PrepError::ParseError(_) | PrepError::InvalidParameter(_) => {
            INPUT_ERROR
        }
        PrepError::DegenerateInput(_)
        | PrepError::InsufficientData(_)
        | PrepError::DecodeFailure { .. }
        | PrepError::IoError(_) => EXECUTION_ERROR,
    }
}

/// Print the error and return its exit code.
pub fn report(err: &PrepError) -> i32 {
    eprintln!("Error: {}", err);
    for_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(for_error(&PrepError::NotFound("x".into())), INPUT_ERROR);
        assert_eq!(for_error(&PrepError::ParseError("x".into())), INPUT_ERROR);
        assert_eq!(
            for_error(&PrepError::InsufficientData("x".into())),
            EXECUTION_ERROR
        );
        assert_eq!(
            for_error(&PrepError::IoError(std::io::Error::other("disk"))),
            EXECUTION_ERROR
        );
    }
}
