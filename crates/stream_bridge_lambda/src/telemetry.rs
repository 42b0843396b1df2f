use tracing_subscriber::EnvFilter;

/// JSON log lines for CloudWatch. `RUST_LOG` overrides the default `info`.
/// Timestamps are left to CloudWatch ingestion.
pub fn init_tracing() -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|error| format!("failed to initialize tracing: {error}"))
}
