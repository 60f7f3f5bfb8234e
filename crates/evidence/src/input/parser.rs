//! CSV/TSV loader with delimiter detection.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::source::{DataTable, SourceMetadata};
use crate::error::{EvidenceError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
        }
    }
}

/// Loads delimited files into a [`DataTable`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| EvidenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };
        let table = self.parse_slice(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        tracing::debug!(
            "loaded {} ({} rows, {} columns, {})",
            path.display(),
            table.row_count(),
            table.column_count(),
            format
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse delimited text already held in memory.
    pub fn parse_str(&self, text: &str) -> Result<DataTable> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(text.as_bytes())?,
        };
        self.parse_slice(text.as_bytes(), delimiter)
    }

    fn parse_slice(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let headers: Vec<String> = match records.next() {
            Some(Ok(first)) if self.config.has_header => {
                first.iter().map(|s| s.trim().to_string()).collect()
            }
            Some(Ok(first)) => {
                // Synthesize names and keep the first record as data
                let names = (0..first.len()).map(|i| format!("column_{}", i + 1)).collect();
                return self.collect_rows(names, Some(first), records, delimiter);
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Err(EvidenceError::EmptyData("No data rows found".to_string())),
        };

        self.collect_rows(headers, None, records, delimiter)
    }

    fn collect_rows<R: std::io::Read>(
        &self,
        headers: Vec<String>,
        first: Option<csv::StringRecord>,
        records: csv::StringRecordsIter<'_, R>,
        delimiter: u8,
    ) -> Result<DataTable> {
        if headers.is_empty() {
            return Err(EvidenceError::EmptyData("No columns found".to_string()));
        }

        let width = headers.len();
        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let mut rows = Vec::new();

        for record in first.into_iter().map(Ok).chain(records) {
            if rows.len() >= limit {
                break;
            }
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            // Ragged rows are padded or cut to the header width
            row.resize(width, String::new());
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(EvidenceError::EmptyData("No data rows found".to_string()));
        }

        Ok(DataTable::new(headers, rows, delimiter))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the delimiter that splits the first lines most consistently.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    if lines.is_empty() {
        return Err(EvidenceError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Consistent splits dominate; tabs win ties since they rarely occur in values
        let score = if counts.iter().all(|&c| c == first_count) {
            first_count * 1000 + usize::from(delim == b'\t') * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut in_quotes = false;

    line.chars()
        .filter(|&ch| {
            if ch == '"' {
                in_quotes = !in_quotes;
            }
            ch == delim_char && !in_quotes
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detects_tab_delimiter() {
        let table = Parser::new()
            .parse_str("time\tevent\n5\t1\n8\t0\n")
            .unwrap();
        assert_eq!(table.delimiter, b'\t');
        assert_eq!(table.headers, vec!["time", "event"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_quoted_commas_do_not_split() {
        let table = Parser::new()
            .parse_str("name,effect\n\"Smith, 2019\",0.4\n\"Lee, 2021\",0.2\n")
            .unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.get(0, 0), Some("Smith, 2019"));
    }

    #[test]
    fn test_headerless_input_keeps_first_row() {
        let parser = Parser::with_config(ParserConfig {
            has_header: false,
            ..ParserConfig::default()
        });
        let table = parser.parse_str("1,2\n3,4\n").unwrap();
        assert_eq!(table.headers, vec!["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_parse_file_records_metadata() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"id,age\n1,30\n2,41\n3,NA\n").unwrap();

        let (table, metadata) = Parser::new().parse_file(file.path()).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(metadata.format, "csv");
        assert_eq!(metadata.row_count, 3);
        assert!(metadata.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = Parser::new().parse_str("a,b\n").unwrap_err();
        assert!(matches!(err, EvidenceError::EmptyData(_)));
    }
}
