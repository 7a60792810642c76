use std::sync::Arc;

use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::http::{HttpRemote, RemoteSource};
use crate::core::provision::ProvisioningFacade;

use super::paths::LauncherPaths;
use super::store::StateStore;

/// Points the boot config at another login server, e.g. a test realm.
pub const SERVER_ENV: &str = "MISTXI_SERVER";

/// Long-lived services shared by every command.
pub struct AppState {
    pub paths: LauncherPaths,
    pub store: StateStore,
    pub remote: Arc<dyn RemoteSource>,
    pub facade: ProvisioningFacade,
}

impl AppState {
    pub fn new(paths: LauncherPaths) -> LauncherResult<Self> {
        let remote: Arc<dyn RemoteSource> = Arc::new(HttpRemote::new()?);
        Ok(Self::with_remote(paths, remote))
    }

    pub fn with_remote(paths: LauncherPaths, remote: Arc<dyn RemoteSource>) -> Self {
        let mut facade = ProvisioningFacade::new(remote.clone(), paths.clone());
        if let Some(host) = server_override() {
            info!("Using login server {} from {}", host, SERVER_ENV);
            facade = facade.with_server_host(host);
        }
        Self {
            store: StateStore::new(paths.state_file()),
            facade,
            remote,
            paths,
        }
    }
}

fn server_override() -> Option<String> {
    std::env::var(SERVER_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
