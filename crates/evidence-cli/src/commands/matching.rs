//! Match command - propensity-score matching of treated and control units.

use std::path::{Path, PathBuf};

use colored::Colorize;
use evidence::EvidenceEngine;
use evidence::matching::BalanceRow;

use crate::cli::OrderChoice;

/// Matching options that override the config file.
pub struct MatchArgs {
    pub treatment: String,
    pub covariates: Vec<String>,
    pub caliper: Option<f64>,
    pub ratio: Option<usize>,
    pub order: Option<OrderChoice>,
}

pub fn run(
    file: PathBuf,
    args: MatchArgs,
    json_output: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config)?;
    if let Some(caliper) = args.caliper {
        config.matching.caliper = caliper;
    }
    if let Some(ratio) = args.ratio {
        config.matching.ratio = ratio;
    }
    if let Some(order) = args.order {
        config.matching.treated_order = order.into();
    }
    let engine = EvidenceEngine::with_config(config);

    let (table, metadata) = engine.load(&file)?;
    tracing::info!("Loaded {} ({} rows)", metadata.file, metadata.row_count);

    let result = engine.match_cohorts(&table, &args.treatment, &args.covariates)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} on {}",
        "Propensity matching:".cyan().bold(),
        args.treatment,
        args.covariates.join(", ")
    );
    println!();

    println!("{}", "Samples:".yellow().bold());
    println!(
        "  Treated: {} matched of {}",
        result.n_treated_matched, result.n_treated_original
    );
    println!(
        "  Control: {} matched of {}",
        result.n_control_matched, result.n_control_original
    );
    let rate = format!("{:.1}%", result.match_rate);
    let rate = if result.match_rate >= 80.0 {
        rate.green()
    } else if result.match_rate >= 50.0 {
        rate.yellow()
    } else {
        rate.red()
    };
    println!("  Match rate: {} ({} unmatched)", rate, result.n_unmatched);
    if result.n_excluded > 0 {
        println!(
            "  {}",
            format!("{} rows excluded for missing values", result.n_excluded).dimmed()
        );
    }
    println!("  Caliper: {:.4}", result.caliper);
    if let Some(auc) = result.model_auc {
        println!("  Propensity model AUC: {:.3}", auc);
    }
    println!();

    println!("{}", "Balance (SMD before -> after):".yellow().bold());
    for (before, after) in result.balance_before.iter().zip(&result.balance_after) {
        println!(
            "  {:<24} {:>7.3} -> {}",
            before.covariate,
            before.smd,
            balance_marker(after)
        );
    }
    println!(
        "  Imbalanced covariates: {} -> {}",
        result.imbalanced_before, result.imbalanced_after
    );

    Ok(())
}

fn balance_marker(row: &BalanceRow) -> String {
    let text = format!("{:>7.3}", row.smd);
    if row.balanced {
        format!("{} {}", text.green(), "✓".green())
    } else {
        format!("{} {}", text.red(), "✗".red())
    }
}
