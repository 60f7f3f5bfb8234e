//! Logistic command - binary outcome regression with optional rigor score.

use std::path::{Path, PathBuf};

use colored::Colorize;
use evidence::AnalysisResult;

use super::format_p;

pub fn run(
    file: PathBuf,
    outcome: String,
    predictors: Vec<String>,
    score: bool,
    json_output: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine(config)?;
    let (table, metadata) = engine.load(&file)?;
    tracing::info!("Loaded {} ({} rows)", metadata.file, metadata.row_count);

    let analysis = engine.logistic_regression(&table, &outcome, &predictors)?;
    let rigor = score.then(|| {
        let quality = engine.profile(&table);
        engine.score_rigor(&quality, &analysis)
    });

    if json_output {
        let output = match &rigor {
            Some(rigor) => serde_json::json!({ "analysis": analysis, "rigor": rigor }),
            None => serde_json::to_value(&analysis)?,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_analysis(&analysis);

    if let Some(rigor) = rigor {
        println!();
        println!(
            "{} {} ({})",
            "Rigor score:".yellow().bold(),
            super::color_score(rigor.overall_score),
            rigor.grade
        );
    }

    Ok(())
}

fn print_analysis(analysis: &AnalysisResult) {
    if let Some(error) = &analysis.error {
        println!("{} {}", "Analysis failed:".red().bold(), error);
        return;
    }

    println!(
        "{} {} (n = {})",
        "Logistic regression:".cyan().bold(),
        analysis.outcome.as_deref().unwrap_or("outcome"),
        analysis.sample_size()
    );
    println!();

    println!("{}", "Odds ratios:".yellow().bold());
    for (name, or) in &analysis.odds_ratios {
        let line = format!(
            "  {:<24} {:>8.3} [{:.3}, {:.3}]  p = {}",
            name,
            or.odds_ratio,
            or.ci_low,
            or.ci_high,
            format_p(or.p_value)
        );
        if or.significant {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }

    if !analysis.model_fit.is_empty() {
        println!();
        println!("{}", "Model fit:".yellow().bold());
        for (name, value) in &analysis.model_fit {
            println!("  {:<16} {:.3}", name, value);
        }
    }

    if !analysis.assumptions.is_empty() {
        println!();
        println!("{}", "Assumptions:".yellow().bold());
        for (name, check) in &analysis.assumptions {
            let marker = match check.passed {
                Some(true) => "✓".green(),
                Some(false) => "✗".red(),
                None => "?".yellow(),
            };
            println!("  {} {}: {}", marker, name, check.detail);
        }
    }

    if let Some(text) = &analysis.interpretation {
        println!();
        println!("{}", text);
    }
}
