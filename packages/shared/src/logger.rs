//! Logging setup utilities for applications embedding the sync core.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for both the core crates and the embedding
/// application. The log level can be overridden using the `RUST_LOG`
/// environment variable.
///
/// # Arguments
///
/// * `app_name` - The name of the embedding application (e.g., "manabi-web")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use manabi_shared::logger::setup_logger;
///
/// setup_logger("manabi-web", "info");
/// ```
pub fn setup_logger(app_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "manabi_sync={},manabi_shared={},{}={}",
                    default_log_level,
                    default_log_level,
                    app_name.replace("-", "_"),
                    default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
