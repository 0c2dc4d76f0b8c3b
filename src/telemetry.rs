use tracing::error;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs `err` and its cause chain at the top-level error boundary.
pub fn report_failure(message: &str, err: &anyhow::Error) {
    error!(error = %err, "{message}");
    for cause in err.chain().skip(1) {
        error!(cause = %cause, "caused by");
    }
}
