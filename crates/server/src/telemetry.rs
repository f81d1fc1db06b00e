//! Tracing subscriber setup for the server binary.

/// Initialize the global tracing subscriber from `RUST_LOG`, defaulting to
/// `info` when the variable is unset or invalid.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
