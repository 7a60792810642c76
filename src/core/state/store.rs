use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::LauncherResult;
use crate::core::fsutil::write_atomic;
use crate::core::profile::ProfileSet;

/// Everything the launcher remembers between runs, stored as `state.json`.
///
/// Installer and credential fields belong to other parts of the launcher; they
/// are carried through untouched so saving never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LauncherState {
    pub ffxi_dir: Option<PathBuf>,
    pub play_online_viewer_dir: Option<PathBuf>,
    pub setup_complete: bool,
    pub pending_reboot_at_utc: Option<DateTime<FixedOffset>>,
    pub saved_user: Option<String>,
    pub saved_pass_dpapi_b64: Option<String>,
    pub dsp_patch_installed: bool,
    pub play_online_updated: bool,
    pub data_folder_copied: bool,
    pub account_created: bool,

    #[serde(flatten)]
    pub profiles: ProfileSet,

    /// Pinned XiLoader tag; `None` follows the latest release.
    pub xi_loader_version: Option<String>,
}

impl LauncherState {
    /// Credentials are persisted when the user chose "remember me".
    pub fn has_saved_credentials(&self) -> bool {
        self.saved_user
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
            && self.saved_pass_dpapi_b64.is_some()
    }

    pub fn loader_override(&self) -> Option<&str> {
        self.xi_loader_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Loads and saves [`LauncherState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file yields defaults.
    pub async fn load(&self) -> LauncherState {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not read {:?}: {}", self.path, e);
                }
                return LauncherState::default();
            }
        };
        let mut state = match serde_json::from_str::<LauncherState>(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring corrupt state file {:?}: {}", self.path, e);
                LauncherState::default()
            }
        };
        state.profiles.normalize();
        state
    }

    /// Write through a temp file so a crash never leaves half a state file.
    pub async fn save(&self, state: &LauncherState) -> LauncherResult<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, json.as_bytes()).await?;
        debug!("Saved launcher state to {:?}", self.path);
        Ok(())
    }
}
