pub mod app;
pub mod paths;
pub mod store;

pub use app::AppState;
pub use paths::LauncherPaths;
pub use store::{LauncherState, StateStore};
