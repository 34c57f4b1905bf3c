use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// JSON logs for CloudWatch, filtered by `RUST_LOG` and defaulting to `info`.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Human readable logs for the admin CLI.
pub fn init_cli() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
