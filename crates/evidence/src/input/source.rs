//! Data source abstraction and metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EvidenceError, Result};

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// In-memory tabular dataset shared by every engine.
///
/// Cells are kept as the strings they were read as; typed access goes through
/// [`DataTable::numeric_cell`] and [`DataTable::text_cell`], which both treat
/// NA-like tokens as missing.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// The delimiter used.
    pub delimiter: u8,
}

impl DataTable {
    /// Create a new data table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
        }
    }

    /// Build a table from in-memory records, checking that every row has one
    /// cell per header.
    pub fn from_records<H, R, C>(headers: H, records: R) -> Result<Self>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        if headers.is_empty() {
            return Err(EvidenceError::EmptyData("No columns found".to_string()));
        }

        let mut rows = Vec::new();
        for (row_idx, record) in records.into_iter().enumerate() {
            let row: Vec<String> = record.into_iter().map(Into::into).collect();
            if row.len() != headers.len() {
                return Err(EvidenceError::Parse {
                    row: row_idx + 1,
                    column: row.len().min(headers.len()),
                    message: format!(
                        "expected {} cells, found {}",
                        headers.len(),
                        row.len()
                    ),
                });
            }
            rows.push(row);
        }

        Ok(Self::new(headers, rows, b','))
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| EvidenceError::missing_column(name))
    }

    /// Whether the table has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| {
            row.get(index)
                .map(|s| s.as_str())
                .unwrap_or("")
        })
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Non-missing cell text, trimmed.
    pub fn text_cell(&self, row: usize, col: usize) -> Option<&str> {
        self.get(row, col)
            .filter(|v| !Self::is_null_value(v))
            .map(str::trim)
    }

    /// Cell coerced to a finite number; missing or non-numeric cells are `None`.
    pub fn numeric_cell(&self, row: usize, col: usize) -> Option<f64> {
        self.text_cell(row, col)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// True when every non-missing value of the column parses as a number.
    pub fn is_numeric_column(&self, col: usize) -> bool {
        (0..self.row_count())
            .filter_map(|row| self.text_cell(row, col))
            .all(|v| v.parse::<f64>().is_ok())
    }

    /// Grouping key for a cell: canonical number text in numeric columns,
    /// so "1" and "1.0" coincide.
    pub fn level_key(value: &str, numeric: bool) -> String {
        if numeric {
            value
                .parse::<f64>()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        DataTable::from_records(
            ["id", "age", "arm"],
            vec![
                vec!["1", "34", "a"],
                vec!["2", "NA", "b"],
                vec!["3", "41.5", ""],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_records_rejects_ragged_rows() {
        let err = DataTable::from_records(["a", "b"], vec![vec!["1"]]).unwrap_err();
        assert!(matches!(err, EvidenceError::Parse { row: 1, .. }));
    }

    #[test]
    fn test_column_index_missing() {
        let table = sample();
        let err = table.column_index("weight").unwrap_err();
        assert!(matches!(err, EvidenceError::MissingColumn { ref column } if column == "weight"));
    }

    #[test]
    fn test_numeric_cell_treats_na_as_missing() {
        let table = sample();
        let age = table.column_index("age").unwrap();
        assert_eq!(table.numeric_cell(0, age), Some(34.0));
        assert_eq!(table.numeric_cell(1, age), None);
        assert_eq!(table.numeric_cell(2, age), Some(41.5));
    }

    #[test]
    fn test_numeric_column_detection() {
        let table = sample();
        assert!(table.is_numeric_column(1));
        assert!(!table.is_numeric_column(2));
    }

    #[test]
    fn test_level_key_canonicalizes_numbers() {
        assert_eq!(DataTable::level_key("1.0", true), "1");
        assert_eq!(DataTable::level_key("2.50", true), "2.5");
        assert_eq!(DataTable::level_key("1.0", false), "1.0");
    }
}
