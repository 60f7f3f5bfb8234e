//! Stderr tracing subscriber.

use tracing_subscriber::EnvFilter;

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,evidence=debug,evidence_cli=debug"
    } else {
        "warn"
    }
}

/// Install the subscriber. `RUST_LOG` wins; otherwise warnings only, or
/// debug output for the library and CLI when `verbose`.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // A subscriber may already be installed; keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
