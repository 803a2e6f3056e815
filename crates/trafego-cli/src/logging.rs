//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

/// Env var holding the log filter (e.g. `trafego_core=debug`).
const LOG_ENV: &str = "TRAFEGO_LOG";

/// Installs the global subscriber.
///
/// `TRAFEGO_LOG` wins when set; otherwise `warn`, or `debug` with `--verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
