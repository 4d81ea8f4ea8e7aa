use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PrepError, Result};

/// A delimited reference table held as strings, keyed by header name.
///
/// Rows are never modified after loading; filtering produces a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReferenceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(PrepError::ParseError(format!(
                "Row {} has {} fields, expected {}",
                i,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PrepError::InvalidParameter(format!("Table has no column '{}'", name)))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn value(&self, row: usize, column: &str) -> Result<&str> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)
            .map(|r| r[idx].as_str())
            .ok_or_else(|| PrepError::InvalidParameter(format!("Row {} out of range", row)))
    }

    /// Keep rows whose `column` value satisfies `predicate`.
    pub fn filter_rows<F>(&self, column: &str, predicate: F) -> Result<ReferenceTable>
    where
        F: Fn(&str) -> bool,
    {
        let idx = self.column_index(column)?;
        Ok(ReferenceTable {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| predicate(&r[idx]))
                .cloned()
                .collect(),
        })
    }

    /// Row indices grouped by the value of `column`, in key order.
    pub fn group_by(&self, column: &str) -> Result<BTreeMap<String, Vec<usize>>> {
        let idx = self.column_index(column)?;
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            groups.entry(row[idx].clone()).or_default().push(i);
        }
        Ok(groups)
    }
}

/// Read a comma-separated file with a header row.
pub fn read_csv(path: &Path) -> Result<ReferenceTable> {
    let file = std::fs::File::open(path).map_err(|e| PrepError::from_open(e, path))?;
    let table = parse_csv(file)
        .map_err(|e| PrepError::ParseError(format!("{}: {}", path.display(), e)))?;
    log::info!(
        "Loaded table {}: {} rows × {} columns",
        path.display(),
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

/// Parse CSV content from any reader. Errors are returned as display strings
/// so callers can attach the source name.
pub fn parse_csv<R: std::io::Read>(reader: R) -> std::result::Result<ReferenceTable, String> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("reading headers: {}", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err("missing header row".to_string());
    }

    let mut rows = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("row {}: {}", row_no, e))?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(ReferenceTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Image Index,Finding Labels,Patient ID\n\
                          a.png,Effusion,1\n\
                          b.png,No Finding,2\n\
                          c.png,Effusion,3\n";

    #[test]
    fn test_parse_and_query() {
        let table = parse_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.column("Image Index").unwrap(),
            vec!["a.png", "b.png", "c.png"]
        );
        assert_eq!(table.value(1, "Finding Labels").unwrap(), "No Finding");
        assert!(matches!(
            table.column("Missing"),
            Err(PrepError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_group_and_filter() {
        let table = parse_csv(SAMPLE.as_bytes()).unwrap();
        let groups = table.group_by("Finding Labels").unwrap();
        assert_eq!(groups["Effusion"], vec![0, 2]);
        assert_eq!(groups["No Finding"], vec![1]);

        let filtered = table
            .filter_rows("Finding Labels", |v| v == "Effusion")
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let content = "id,label\n1,a\n2,b,extra\n";
        let err = parse_csv(content.as_bytes()).unwrap_err();
        assert!(err.contains("row 1"));
    }

    #[test]
    fn test_read_csv_missing_file() {
        let result = read_csv(Path::new("/nonexistent_dir_12345/table.csv"));
        assert!(matches!(result, Err(PrepError::NotFound(_))));
    }
}
