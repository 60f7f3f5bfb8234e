//! Evidence CLI - statistical evidence from tabular research data.

mod cli;
mod commands;
mod logger;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Profile { file, json } => commands::profile::run(file, json, config),

        Commands::Synthesize { file, json } => commands::synthesize::run(file, json),

        Commands::Match {
            file,
            treatment,
            covariates,
            caliper,
            ratio,
            order,
            json,
        } => commands::matching::run(
            file,
            commands::matching::MatchArgs {
                treatment,
                covariates,
                caliper,
                ratio,
                order,
            },
            json,
            config,
        ),

        Commands::Survival {
            file,
            duration,
            event,
            group,
            json,
        } => commands::survival::run(file, duration, event, group, json, config),

        Commands::Logistic {
            file,
            outcome,
            predictors,
            score,
            json,
        } => commands::logistic::run(file, outcome, predictors, score, json, config),

        Commands::Score {
            quality,
            analysis,
            json,
        } => commands::score::run(quality, analysis, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
