//! Structured logging setup with tracing

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Console output goes to stderr so the report stays clean on stdout. With
/// `file_log`, a daily-rolling JSON log is also written to the data dir.
pub fn init_logging(file_log: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if file_log {
        let log_dir = super::log_dir();
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "textconv.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive for the lifetime of the process.
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(fmt::layer().json().with_writer(non_blocking))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }

    tracing::debug!("logging initialized");
    Ok(())
}
