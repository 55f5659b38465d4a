//! Logging initialization

/// Initialize logging based on debug flag
///
/// Logs go to stderr so the report tables on stdout stay pipeable.
/// Without --debug, only RUST_LOG-selected output is emitted.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(debug)
        .with_line_number(debug)
        .init();

    if debug {
        tracing::debug!("Debug logging enabled");
    }
}
