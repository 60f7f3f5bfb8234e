//! CLI command implementations.

pub mod logistic;
pub mod matching;
pub mod profile;
pub mod score;
pub mod survival;
pub mod synthesize;

use std::path::Path;

use colored::{ColoredString, Colorize};
use evidence::{EngineConfig, EvidenceEngine};

/// Read an optional JSON config file; defaults when absent.
pub(crate) fn load_config(config: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match config {
        Some(path) => {
            tracing::debug!("Loading engine config from {}", path.display());
            Ok(EngineConfig::from_path(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Build an engine from an optional JSON config file.
pub(crate) fn engine(config: Option<&Path>) -> Result<EvidenceEngine, Box<dyn std::error::Error>> {
    Ok(EvidenceEngine::with_config(load_config(config)?))
}

/// Color a 0-100 score: green from 80, yellow from 50, red below.
pub(crate) fn color_score(score: u32) -> ColoredString {
    let text = format!("{}/100", score);
    if score >= 80 {
        text.green().bold()
    } else if score >= 50 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

pub(crate) fn format_p(p: f64) -> String {
    if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{:.3}", p)
    }
}
