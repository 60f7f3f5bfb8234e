//! Profile command - data-quality report for a file.

use std::path::{Path, PathBuf};

use colored::Colorize;
use evidence::rigor::IssueSeverity;

pub fn run(
    file: PathBuf,
    json_output: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine(config)?;
    let (table, metadata) = engine.load(&file)?;
    tracing::info!(
        "Loaded {} ({} rows, {} columns, {})",
        metadata.file,
        metadata.row_count,
        metadata.column_count,
        metadata.format
    );

    let report = engine.profile(&table);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Data quality:".cyan().bold(), metadata.file);
    println!(
        "  {} rows, {} columns, {} duplicate rows",
        report.row_count, report.column_count, report.duplicate_rows
    );
    println!();

    println!("{}", "Columns:".yellow().bold());
    for (column, kind) in &report.column_types {
        let missing = report.missing_percentage.get(column).copied().unwrap_or(0.0);
        let missing_text = format!("{:.1}% missing", missing);
        let missing_text = if missing > 20.0 {
            missing_text.red()
        } else if missing > 0.0 {
            missing_text.yellow()
        } else {
            missing_text.dimmed()
        };
        println!("  {:<24} {:<12} {}", column, kind, missing_text);
        if let Some(summary) = report.numeric_summary.get(column) {
            println!(
                "  {:<24} mean {:.3}, median {:.3}, range [{}, {}]",
                "", summary.mean, summary.median, summary.min, summary.max
            );
        }
    }

    if !report.issues.is_empty() {
        println!();
        println!("{}", "Issues:".yellow().bold());
        for issue in &report.issues {
            let marker = match issue.severity {
                IssueSeverity::Critical => "✗".red(),
                IssueSeverity::Warning => "⚠".yellow(),
                IssueSeverity::Info => "ℹ".cyan(),
            };
            println!("  {} {}", marker, issue.message);
            if let Some(rec) = &issue.recommendation {
                println!("    {}", rec.dimmed());
            }
        }
    }

    Ok(())
}
