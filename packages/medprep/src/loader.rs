use std::path::Path;

use crate::error::Result;
use crate::table::{read_csv, ReferenceTable};
use crate::types::{Annotation, SignalRecord};
use crate::wfdb;

/// Annotation extension used by the MIT-BIH style datasets
pub const DEFAULT_ANNOTATION_EXTENSION: &str = "atr";

/// Load a WFDB record and its reference annotations from `base` (no extension).
pub fn load_ecg_files(base: &Path) -> Result<(SignalRecord, Vec<Annotation>)> {
    let record = wfdb::read_record(base)?;
    let annotations = wfdb::read_annotations(base, DEFAULT_ANNOTATION_EXTENSION)?;
    Ok((record, annotations))
}

/// Load the tabular reference dataset (e.g. healthy-subject ECG features).
pub fn load_reference_table(csv_path: &Path) -> Result<ReferenceTable> {
    read_csv(csv_path)
}

/// Load record, annotations and reference table together.
///
/// There is no partial result: the first failing sub-load fails the call.
pub fn load_datasets(
    record_base: &Path,
    csv_path: &Path,
) -> Result<(SignalRecord, Vec<Annotation>, ReferenceTable)> {
    let (record, annotations) = load_ecg_files(record_base)?;
    let table = load_reference_table(csv_path)?;
    Ok((record, annotations, table))
}
