//! Survival command - Kaplan-Meier curves and log-rank test.

use std::path::{Path, PathBuf};

use colored::Colorize;

use super::format_p;

pub fn run(
    file: PathBuf,
    duration: String,
    event: String,
    group: Option<String>,
    json_output: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine(config)?;
    let (table, metadata) = engine.load(&file)?;
    tracing::info!("Loaded {} ({} rows)", metadata.file, metadata.row_count);

    let result = engine.estimate_survival(&table, &duration, &event, group.as_deref())?;

    if json_output {
        let output = serde_json::json!({
            "result": result,
            "interpretation": result.interpretation(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Survival analysis:".cyan().bold(), metadata.file);
    println!(
        "  {} subjects, {} events",
        result.n, result.events
    );
    if result.n_excluded > 0 {
        println!(
            "  {}",
            format!("{} rows excluded for missing values", result.n_excluded).dimmed()
        );
    }
    println!();

    println!("{}", "Groups:".yellow().bold());
    for summary in &result.groups {
        let median = summary
            .median_survival
            .map(|m| format!("{}", m))
            .unwrap_or_else(|| "not reached".to_string());
        println!(
            "  {:<20} n = {:<5} events = {:<5} median = {}",
            summary.group, summary.n, summary.events, median
        );
        for point in &summary.points {
            println!(
                "    t = {:<8} at risk {:<5} S = {:.3} [{:.3}, {:.3}]",
                point.time,
                point.at_risk,
                point.survival_probability,
                point.ci_lower,
                point.ci_upper
            );
        }
    }

    if let Some(test) = &result.log_rank {
        println!();
        println!("{}", "Log-rank test:".yellow().bold());
        let p = format!("p = {}", format_p(test.p_value));
        let p = if test.significant { p.green() } else { p.normal() };
        println!(
            "  {} vs {}: chi² = {:.3}, {}",
            test.groups[0], test.groups[1], test.statistic, p
        );
    }

    println!();
    println!("{}", result.interpretation());

    Ok(())
}
