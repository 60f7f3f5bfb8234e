//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use evidence::TreatedOrder;

/// Evidence: statistical evidence from tabular research data
#[derive(Parser)]
#[command(name = "evidence")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file overriding engine settings
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile data quality of a file
    Profile {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pool study effects (meta-analysis)
    Synthesize {
        /// JSON array of studies, or CSV with effect_size and se columns
        #[arg(value_name = "STUDIES")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Propensity-score match treated and control units
    Match {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Binary (0/1) treatment column
        #[arg(short, long)]
        treatment: String,

        /// Covariate columns (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        covariates: Vec<String>,

        /// Caliper as a fraction of the propensity score standard deviation
        #[arg(long)]
        caliper: Option<f64>,

        /// Controls matched per treated unit
        #[arg(long)]
        ratio: Option<usize>,

        /// Processing order of treated units (input, descending)
        #[arg(long)]
        order: Option<OrderChoice>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Kaplan-Meier survival curves and log-rank test
    Survival {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Duration column
        #[arg(short, long)]
        duration: String,

        /// Event indicator column (non-zero = event)
        #[arg(short, long)]
        event: String,

        /// Optional grouping column
        #[arg(short, long)]
        group: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Logistic regression of a binary outcome
    Logistic {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Binary (0/1) outcome column
        #[arg(short, long)]
        outcome: String,

        /// Predictor columns (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        predictors: Vec<String>,

        /// Also score the rigor of the fitted model
        #[arg(long)]
        score: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the rigor of an analysis
    Score {
        /// Quality report JSON (from `evidence profile --json`)
        #[arg(long, value_name = "QUALITY_JSON")]
        quality: PathBuf,

        /// Analysis result JSON
        #[arg(long, value_name = "ANALYSIS_JSON")]
        analysis: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Treated-unit processing order for matching
#[derive(Clone, Copy, Debug, Default)]
pub enum OrderChoice {
    /// Source row order
    #[default]
    Input,
    /// Highest propensity first
    Descending,
}

impl std::str::FromStr for OrderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "input" | "row" => Ok(OrderChoice::Input),
            "descending" | "descending_propensity" | "desc" => Ok(OrderChoice::Descending),
            _ => Err(format!("Unknown order: {}. Use input or descending.", s)),
        }
    }
}

impl std::fmt::Display for OrderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderChoice::Input => write!(f, "input"),
            OrderChoice::Descending => write!(f, "descending"),
        }
    }
}

impl From<OrderChoice> for TreatedOrder {
    fn from(choice: OrderChoice) -> Self {
        match choice {
            OrderChoice::Input => TreatedOrder::Input,
            OrderChoice::Descending => TreatedOrder::DescendingPropensity,
        }
    }
}
