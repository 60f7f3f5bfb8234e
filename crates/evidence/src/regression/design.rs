//! Turning table columns into a numeric design matrix.

use std::cmp::Ordering;

use indexmap::IndexSet;

use crate::input::DataTable;

/// When a covariate is expanded into indicator columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalRule {
    /// Only columns holding non-numeric values.
    NonNumeric,
    /// Non-numeric columns and numeric columns with at most this many levels.
    AtMostLevels(usize),
}

/// Encoded feature matrix aligned with a set of source rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    /// Feature names: raw column names or `{column}_{level}` indicators.
    pub names: Vec<String>,
    /// Row-major features; `rows[i]` belongs to `source_rows[i]`.
    pub rows: Vec<Vec<f64>>,
    pub source_rows: Vec<usize>,
}

impl DesignMatrix {
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Values of one feature across all rows.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Rescale every feature to zero mean and unit (population) variance.
    ///
    /// Constant features are only centred.
    pub fn standardize(&mut self) {
        let n = self.rows.len() as f64;
        if n == 0.0 {
            return;
        }
        for j in 0..self.width() {
            let mean = self.rows.iter().map(|r| r[j]).sum::<f64>() / n;
            let var = self.rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            let scale = if var > 0.0 { var.sqrt() } else { 1.0 };
            for row in &mut self.rows {
                row[j] = (row[j] - mean) / scale;
            }
        }
    }
}


/// Encode `columns` over `source_rows`, one-hot expanding categorical
/// columns and dropping their first (sorted) level.
///
/// Every listed cell must be non-missing; callers filter to complete cases
/// first. A missing cell encodes as 0.0.
pub fn encode_columns(
    table: &DataTable,
    source_rows: &[usize],
    columns: &[usize],
    rule: CategoricalRule,
) -> DesignMatrix {
    let mut names = Vec::new();
    let mut features: Vec<Vec<f64>> = Vec::new();

    for &col in columns {
        let header = &table.headers[col];
        let texts: Vec<&str> = source_rows
            .iter()
            .map(|&row| table.text_cell(row, col).unwrap_or(""))
            .collect();
        let numeric = texts.iter().all(|t| t.parse::<f64>().is_ok());

        let levels: IndexSet<String> = texts
            .iter()
            .map(|t| DataTable::level_key(t, numeric))
            .collect();
        let categorical = match rule {
            CategoricalRule::NonNumeric => !numeric,
            CategoricalRule::AtMostLevels(max) => !numeric || levels.len() <= max,
        };

        if !categorical {
            names.push(header.clone());
            features.push(texts.iter().map(|t| t.parse::<f64>().unwrap_or(0.0)).collect());
            continue;
        }

        let mut sorted: Vec<String> = levels.into_iter().collect();
        if numeric {
            sorted.sort_by(|a, b| {
                let (a, b) = (a.parse::<f64>().unwrap_or(0.0), b.parse::<f64>().unwrap_or(0.0));
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            });
        } else {
            sorted.sort();
        }

        let keys: Vec<String> = texts.iter().map(|t| DataTable::level_key(t, numeric)).collect();
        for level in sorted.iter().skip(1) {
            names.push(format!("{header}_{level}"));
            features.push(
                keys.iter()
                    .map(|k| if k == level { 1.0 } else { 0.0 })
                    .collect(),
            );
        }
    }

    let rows = (0..source_rows.len())
        .map(|i| features.iter().map(|f| f[i]).collect())
        .collect();

    DesignMatrix {
        names,
        rows,
        source_rows: source_rows.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::from_records(
            ["age", "sex", "site", "stage"],
            vec![
                vec!["30", "F", "north", "1"],
                vec!["45", "M", "south", "2"],
                vec!["51", "F", "east", "2.0"],
                vec!["62", "M", "north", "3"],
                vec!["38", "F", "south", "1"],
                vec!["70", "M", "east", "3"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_low_cardinality_numeric_is_expanded() {
        let t = table();
        let rows: Vec<usize> = (0..6).collect();
        let design = encode_columns(&t, &rows, &[0, 3], CategoricalRule::AtMostLevels(5));
        // age has 6 levels and stays continuous; stage has 3 levels
        assert_eq!(design.names, vec!["age", "stage_2", "stage_3"]);
        assert_eq!(design.rows[2], vec![51.0, 1.0, 0.0]);
        assert_eq!(design.rows[3], vec![62.0, 0.0, 1.0]);
    }

    #[test]
    fn test_non_numeric_rule_keeps_numeric_columns() {
        let t = table();
        let rows: Vec<usize> = (0..6).collect();
        let design = encode_columns(&t, &rows, &[1, 2, 3], CategoricalRule::NonNumeric);
        assert_eq!(design.names, vec!["sex_M", "site_north", "site_south", "stage"]);
        assert_eq!(design.rows[0], vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_standardize_centres_and_scales() {
        let t = table();
        let rows: Vec<usize> = (0..6).collect();
        let mut design = encode_columns(&t, &rows, &[0], CategoricalRule::NonNumeric);
        design.standardize();
        let col = design.column(0);
        let mean = col.iter().sum::<f64>() / 6.0;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 6.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_level_category_adds_no_columns() {
        let t = DataTable::from_records(["g"], vec![vec!["a"], vec!["a"]]).unwrap();
        let design = encode_columns(&t, &[0, 1], &[0], CategoricalRule::NonNumeric);
        assert_eq!(design.width(), 0);
        assert_eq!(design.rows, vec![Vec::<f64>::new(), Vec::new()]);
    }
}
