//! Synthesize command - meta-analysis of study effects.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use evidence::{EvidenceSynthesisEngine, StudyEffect};

use super::format_p;

pub fn run(file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let studies = read_studies(&file)?;
    tracing::info!("Read {} studies from {}", studies.len(), file.display());

    let result = EvidenceSynthesisEngine::new().synthesize(&studies)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} studies",
        "Evidence synthesis:".cyan().bold(),
        result.n_studies
    );
    println!();

    println!("{}", "Pooled effects:".yellow().bold());
    for (label, pooled) in [("Fixed", &result.fixed), ("Random", &result.random)] {
        println!(
            "  {:<8} {:>8.4}  95% CI [{:.4}, {:.4}]  p = {}",
            label,
            pooled.point,
            pooled.ci_low,
            pooled.ci_high,
            format_p(pooled.p_value)
        );
    }
    println!();

    let het = &result.heterogeneity;
    println!("{}", "Heterogeneity:".yellow().bold());
    println!(
        "  Q = {:.3} (df {}), p = {}",
        het.q,
        het.degrees_of_freedom,
        format_p(het.p_value)
    );
    println!(
        "  I² = {:.1}% ({}), tau² = {:.4}",
        het.i_squared,
        het.level.label(),
        het.tau_squared
    );

    match &result.egger {
        Some(egger) => println!(
            "  Egger intercept {:.3}, p = {}",
            egger.intercept,
            format_p(egger.p_value)
        ),
        None => println!("  {}", "Egger test needs at least 3 studies".dimmed()),
    }
    println!();

    println!("{}", "Studies:".yellow().bold());
    for study in &result.studies {
        println!(
            "  {:<24} {:>8.4} [{:.4}, {:.4}]  w {:.1}% / {:.1}%",
            study.name,
            study.effect_size,
            study.ci_low,
            study.ci_high,
            study.weight_fixed,
            study.weight_random
        );
    }

    Ok(())
}

/// Studies from a JSON array, or from CSV with `effect_size` and `se` columns.
fn read_studies(file: &PathBuf) -> Result<Vec<StudyEffect>, Box<dyn std::error::Error>> {
    let is_json = file.extension().map(|e| e == "json").unwrap_or(false);
    if is_json {
        let contents = fs::read_to_string(file)?;
        return Ok(serde_json::from_str(&contents)?);
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(file)?;
    let mut studies = Vec::new();
    for (i, record) in reader.deserialize::<StudyEffect>().enumerate() {
        let mut study = record.map_err(|e| format!("Study row {}: {}", i + 1, e))?;
        if study.name.is_empty() {
            study.name = format!("Study {}", i + 1);
        }
        studies.push(study);
    }
    Ok(studies)
}
