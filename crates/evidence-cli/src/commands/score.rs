//! Score command - rigor score from saved quality and analysis reports.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use evidence::rigor::CategoryScore;
use evidence::{AnalysisResult, QualityReport, RigorScoringEngine};

pub fn run(
    quality: PathBuf,
    analysis: PathBuf,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let quality: QualityReport = read_json(&quality)?;
    let analysis: AnalysisResult = read_json(&analysis)?;

    let result = RigorScoringEngine::new().score(&quality, &analysis);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Rigor score:".cyan().bold(),
        super::color_score(result.overall_score),
        result.grade
    );
    println!();

    let breakdown = &result.breakdown;
    print_category("Data quality", &breakdown.data_quality);
    print_category("Methodology", &breakdown.methodology);
    print_category("Assumptions", &breakdown.assumptions);
    print_category("Reporting", &breakdown.reporting);

    if !result.recommendations.is_empty() {
        println!("{}", "Recommendations:".yellow().bold());
        for rec in &result.recommendations {
            println!("  • {}", rec);
        }
    }

    Ok(())
}

fn print_category(label: &str, category: &CategoryScore) {
    println!(
        "{} {}/{}",
        format!("{}:", label).yellow().bold(),
        category.score,
        category.max
    );
    for finding in &category.findings {
        println!("  {}", finding.dimmed());
    }
    println!();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&contents)?)
}
