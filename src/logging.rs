use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_LOG_FILTER, ShellConfig};

/// Install the global subscriber. Diagnostics go to stderr so that command
/// output on stdout is never interleaved with log lines.
pub fn init(config: &ShellConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
