// Tracing setup for the binary. Diagnostics go to stderr so they never mix
// with the per-file lines printed on stdout.

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "spira_attach=info";
const VERBOSE_LOG_FILTER: &str = "spira_attach=debug";

/// Install the global subscriber. `RUST_LOG` wins unless `verbose` is set.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
