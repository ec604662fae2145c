use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::config::{AppPaths, LoggingConfig};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(paths: &AppPaths, config: &LoggingConfig) {
    let default_filter = config.level.as_deref().unwrap_or(DEFAULT_FILTER);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = if config.file {
        let log_dir = &paths.log_dir;
        let _ = std::fs::create_dir_all(log_dir);

        let file_appender = tracing_appender::rolling::daily(log_dir, "chatrag.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();
}
