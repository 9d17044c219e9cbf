use tracing_subscriber::EnvFilter;

/// Initializes the process-wide tracing subscriber. Mirrors the teacher's
/// `tracing-subscriber` setup (env-filter driven by `RUST_LOG`, defaulting to
/// `info`), swapped from the teacher's file-appender sink to stdout since
/// this process runs under a container/process supervisor, not a desktop app.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}
