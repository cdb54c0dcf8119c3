//! Log setup for the `srvgen` binary

use tracing_subscriber::EnvFilter;

/// Pick the filter directive: `RUST_LOG` wins, then `-v`, then the configured level.
pub fn filter_directive(env: Option<&str>, configured: &str, verbose: bool) -> String {
    match env {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ if verbose => "debug".to_string(),
        _ => configured.to_string(),
    }
}

/// Install a stderr subscriber for the process
pub fn init_logging(configured: &str, verbose: bool) {
    use tracing_subscriber::prelude::*;

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(env.as_deref(), configured, verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false),
    );

    // Try to set as global default (ignore error if already set)
    let _ = tracing::subscriber::set_global_default(subscriber);
}
