use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::error::{LauncherError, LauncherResult};

const DEFAULT_FILTER: &str = "info,mistxi_launcher_lib=debug";
const LOG_FILE: &str = "launcher.log";

/// Console plus `<log_dir>/launcher.log`. `RUST_LOG` overrides the filter.
///
/// Keep the returned guard alive for the whole process or buffered lines are lost.
pub fn init(log_dir: &Path) -> LauncherResult<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|source| LauncherError::Io {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()
        .map_err(|e| LauncherError::Other(format!("Logging already initialized: {e}")))?;

    tracing::info!("Logging to {:?}", log_dir.join(LOG_FILE));
    Ok(guard)
}
