pub mod commands;
pub mod core;
pub mod logging;

pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::state::{AppState, LauncherPaths};

/// Resolve paths, start logging and build the shared services.
///
/// The returned guard flushes the log file when dropped.
pub fn bootstrap() -> LauncherResult<(AppState, tracing_appender::non_blocking::WorkerGuard)> {
    let paths = LauncherPaths::from_env();
    paths.ensure_base_dirs()?;
    let guard = logging::init(&paths.logs_dir())?;

    tracing::info!(
        "MistXI launcher {} starting (base dir {:?})",
        env!("CARGO_PKG_VERSION"),
        paths.base_dir()
    );

    let app = AppState::new(paths)?;
    Ok((app, guard))
}
